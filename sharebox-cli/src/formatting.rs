use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc, Local, SecondsFormat};
use clap::{Args, ValueEnum};
use sharebox_api::files::FileRecord;

use crate::transfer::ProgressObserver;

pub const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// human readable size with base 1024 units up to GB, at most two decimals
/// and no trailing zeros. `0 Bytes`, `1.5 KB`, `488.28 KB`
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return String::from("0 Bytes");
    }

    let mut index = 0;
    let mut divisor = 1u64;

    while index < SIZE_UNITS.len() - 1 && bytes >= divisor * 1024 {
        divisor *= 1024;
        index += 1;
    }

    // halves round up, the display float then drops trailing zeros
    let value = (bytes as f64 / divisor as f64 * 100.0).round() / 100.0;

    format!("{} {}", value, SIZE_UNITS[index])
}

/// picks an icon from the content type, falling back to the file name
pub fn file_icon(mime_type: Option<&str>, name: &str) -> &'static str {
    let mime_type = mime_type.unwrap_or("");

    if mime_type.starts_with("image/") {
        "🖼️"
    } else if mime_type.starts_with("video/") {
        "🎥"
    } else if mime_type.starts_with("audio/") {
        "🎵"
    } else if mime_type.contains("pdf") {
        "📄"
    } else if mime_type.contains("zip") || mime_type.contains("rar") {
        "📦"
    } else if name.ends_with(".txt") {
        "📝"
    } else {
        "📁"
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum SizeFormat {
    Human,
    Raw,
}

impl Default for SizeFormat {
    fn default() -> Self {
        SizeFormat::Human
    }
}

impl Display for SizeFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SizeFormat::Human => write!(f, "human"),
            SizeFormat::Raw => write!(f, "raw"),
        }
    }
}

pub fn size_to_string(bytes: u64, format: &SizeFormat) -> String {
    match format {
        SizeFormat::Human => format_file_size(bytes),
        SizeFormat::Raw => bytes.to_string(),
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum DateFormat {
    Local,
    Utc,
    Unix
}

impl Default for DateFormat {
    fn default() -> Self {
        DateFormat::Local
    }
}

impl Display for DateFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DateFormat::Local => write!(f, "local"),
            DateFormat::Utc => write!(f, "utc"),
            DateFormat::Unix => write!(f, "unix"),
        }
    }
}

pub fn datetime_to_string(dt: &DateTime<Utc>, format: &DateFormat) -> String {
    match format {
        DateFormat::Local => {
            DateTime::<Local>::from(*dt).format("%Y-%m-%d %H:%M:%S").to_string()
        },
        DateFormat::Utc => {
            dt.to_rfc3339_opts(SecondsFormat::Secs, true)
        },
        DateFormat::Unix => {
            dt.timestamp().to_string()
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct OutputOptions {
    /// specifies the format for the file size output
    #[arg(long, default_value_t)]
    pub size_format: SizeFormat,

    /// specifies the format for the timestamp output
    #[arg(long, default_value_t)]
    pub ts_format: DateFormat,
}

pub enum Float {
    Left,
    Right,
}

pub struct Column {
    name: &'static str,
    width: usize,
    float: Float,
}

impl Column {
    pub fn new(name: &'static str, float: Float) -> Self {
        Column {
            name,
            width: name.chars().count(),
            float,
        }
    }

    fn write_value<O>(&self, value: &str, output: &mut O) -> std::io::Result<()>
    where
        O: Write
    {
        // pad by chars since icons and names are not ascii
        let pad = self.width.saturating_sub(value.chars().count());

        match self.float {
            Float::Left => write!(output, "{}{:pad$}", value, ""),
            Float::Right => write!(output, "{:pad$}{}", "", value),
        }
    }
}

pub struct TextTable<const N: usize> {
    columns: [Column; N],
    rows: Vec<[String; N]>,
}

impl<const N: usize> TextTable<N> {
    pub fn with_columns(columns: [Column; N]) -> Self {
        TextTable {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: [String; N]) {
        for (col, value) in self.columns.iter_mut().zip(&row) {
            col.width = col.width.max(value.chars().count());
        }

        self.rows.push(row);
    }

    /// rows are numbered from 1 so the index can be used as a selector
    pub fn write<O>(&self, output: &mut O) -> std::io::Result<()>
    where
        O: Write
    {
        let index_width = self.rows.len().to_string().len();

        write!(output, "{:index_width$}", "")?;

        for col in &self.columns {
            write!(output, " | ")?;
            col.write_value(col.name, output)?;
        }

        write!(output, "\n{}", "-".repeat(index_width))?;

        for col in &self.columns {
            write!(output, "-+-{}", "-".repeat(col.width))?;
        }

        writeln!(output)?;

        for (index, row) in self.rows.iter().enumerate() {
            write!(output, "{:>index_width$}", index + 1)?;

            for (col, value) in self.columns.iter().zip(row) {
                write!(output, " | ")?;
                col.write_value(value, output)?;
            }

            writeln!(output)?;
        }

        Ok(())
    }
}

pub fn write_catalog<O>(output: &mut O, records: &[FileRecord], options: &OutputOptions) -> std::io::Result<()>
where
    O: Write
{
    if records.is_empty() {
        return writeln!(output, "no files uploaded yet");
    }

    let mut table = TextTable::with_columns([
        Column::new("", Float::Left),
        Column::new("name", Float::Left),
        Column::new("size", Float::Right),
        Column::new("type", Float::Left),
        Column::new("uploaded", Float::Left),
        Column::new("key", Float::Left),
    ]);

    for record in records {
        table.push([
            file_icon(record.mime_type.as_deref(), &record.original_name).to_owned(),
            record.original_name.clone(),
            size_to_string(record.size, &options.size_format),
            record.mime_type.clone().unwrap_or_default(),
            datetime_to_string(&record.uploaded_at, &options.ts_format),
            record.storage_key.clone(),
        ]);
    }

    table.write(output)
}

pub fn write_record<O>(output: &mut O, record: &FileRecord, options: &OutputOptions) -> std::io::Result<()>
where
    O: Write
{
    writeln!(
        output,
        "{} {} {}",
        file_icon(record.mime_type.as_deref(), &record.original_name),
        record.original_name,
        size_to_string(record.size, &options.size_format)
    )?;
    writeln!(output, "id: {}", record.id)?;
    writeln!(output, "key: {}", record.storage_key)?;

    if let Some(mime_type) = &record.mime_type {
        writeln!(output, "mime: {}", mime_type)?;
    }

    writeln!(output, "uploaded: {}", datetime_to_string(&record.uploaded_at, &options.ts_format))?;
    writeln!(output, "download: {}", record.download_url)?;

    Ok(())
}

/// redraws a single progress line on stderr
pub fn progress_line(name: String) -> ProgressObserver {
    Arc::new(move |percent| {
        let mut stderr = std::io::stderr();
        let filled = percent as usize / 5;

        let _ = write!(
            stderr,
            "\r{} [{}{}] {:>3}%",
            name,
            "#".repeat(filled),
            " ".repeat(20 - filled),
            percent
        );

        if percent == 100 {
            let _ = writeln!(stderr);
        }

        let _ = stderr.flush();
    })
}
