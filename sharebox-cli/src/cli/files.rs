use std::io::Read;
use std::path::{Path, PathBuf};

#[cfg(target_family = "unix")]
use std::os::unix::fs::FileTypeExt;

use clap::Args;
use reqwest::header::HeaderMap;
use sharebox_api::client::files::DownloadFile;

use crate::config::Config;
use crate::deletion::Deletion;
use crate::error::{self, Context};
use crate::formatting::{self, OutputOptions};
use crate::input::Prompt;
use crate::path::{metadata, normalize_from};
use crate::transfer::TransferStatus;

use super::State;

pub fn list(state: &mut State, options: OutputOptions) -> error::Result {
    let Some(records) = state.catalog.visible() else {
        println!("loading...");
        return Ok(());
    };

    let mut stdout = std::io::stdout();

    formatting::write_catalog(&mut stdout, records, &options)?;

    Ok(())
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// position in the list, id, key or name of the file
    selector: String,

    #[command(flatten)]
    format_options: OutputOptions,
}

pub fn show(state: &mut State, args: ShowArgs) -> error::Result {
    let record = state.find(&args.selector)?;
    let mut stdout = std::io::stdout();

    formatting::write_record(&mut stdout, &record, &args.format_options)?;

    Ok(())
}

#[derive(Debug, Args)]
pub struct SelectArgs {
    /// the local file to upload
    path: PathBuf,
}

fn resolve_local(path: PathBuf) -> error::Result<PathBuf> {
    let cwd = std::env::current_dir()
        .context("failed to retrieve current working directory")?;

    Ok(normalize_from(&cwd, path))
}

pub fn select(state: &mut State, args: SelectArgs) -> error::Result {
    let path = resolve_local(args.path)?;
    let selected = state.select(path)?;

    println!(
        "selected {} {} ({})",
        selected.name,
        formatting::format_file_size(selected.size),
        selected.mime
    );

    Ok(())
}

pub fn clear(state: &mut State) -> error::Result {
    state.transfer.clear()?;

    Ok(())
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// selects this file before uploading
    path: Option<PathBuf>,
}

pub fn upload(state: &mut State, args: UploadArgs) -> error::Result {
    if let Some(path) = args.path {
        select(state, SelectArgs { path })?;
    }

    if let Some(selected) = state.transfer.selected() {
        let observer = formatting::progress_line(selected.name.clone());

        state.transfer.on_progress(observer);
    }

    let uploaded = state.upload()?;

    if let Some(msg) = state.transfer.message() {
        println!(
            "{}: {} {}",
            msg,
            uploaded.file.name,
            formatting::format_file_size(uploaded.file.size)
        );
    }

    if let Err(err) = uploaded.refreshed {
        println!("failed to refresh files: {}", err);
    }

    Ok(())
}

pub fn status(state: &mut State) -> error::Result {
    let status = state.transfer.status();

    println!("status: {}", status);

    if let Some(selected) = state.transfer.selected() {
        println!(
            "selected: {} {} {}",
            formatting::file_icon(Some(selected.mime.essence_str()), &selected.name),
            selected.path.display(),
            formatting::format_file_size(selected.size),
        );
        println!("progress: {}%", state.transfer.progress());
    }

    if let Some(msg) = state.transfer.message() {
        if !matches!(status, TransferStatus::Failed(_)) {
            println!("{}", msg);
        }
    }

    println!("files: {}", state.catalog.size());

    Ok(())
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// position in the list, id, key or name of the file
    selector: String,

    /// skip the confirmation
    #[arg(short, long)]
    yes: bool,
}

pub fn delete(state: &mut State, config: &Config, args: DeleteArgs) -> error::Result {
    let mut prompt = Prompt {
        assume_yes: args.yes || config.assume_yes,
    };

    match state.delete(&args.selector, &mut prompt)? {
        Deletion::Declined => {
            println!("nothing deleted");
        },
        Deletion::Deleted { refreshed } => {
            println!("file deleted successfully");

            if let Err(err) = refreshed {
                println!("failed to refresh files: {}", err);
            }
        }
    }

    Ok(())
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// position in the list, id, key or name of the file
    selector: String,

    /// the output path for the file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// `attachment; filename="name"`
fn get_filename(headers: &HeaderMap) -> Option<String> {
    let content_disposition = headers.get("content-disposition")?
        .to_str()
        .ok()?;

    let (context, attribute) = content_disposition.split_once(';')?;

    if context.trim() != "attachment" {
        return None;
    }

    let (attr, quoted) = attribute.trim().split_once('=')?;

    if attr != "filename" {
        return None;
    }

    let name = quoted.strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(quoted);

    safe_file_name(name)
}

/// reduces a name handed out by the service to its last path component so
/// it can only ever land inside the output directory
fn safe_file_name(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next()?;
    let last = Path::new(last).file_name()?.to_str()?;

    if last.is_empty() || last == "." || last == ".." {
        None
    } else {
        Some(last.to_owned())
    }
}

fn resolve_file_path(given: Option<PathBuf>, filename: &str) -> error::Result<PathBuf> {
    let filename = safe_file_name(filename)
        .context(format!("\"{}\" is not a usable file name", filename))?;
    let curr_dir = std::env::current_dir()
        .context("failed to retrieve current working directory")?;

    let Some(given) = given else {
        return Ok(curr_dir.join(filename));
    };

    let mut resolved = normalize_from(&curr_dir, given);

    if let Some(metadata) = metadata(&resolved)
        .context("failed to resolve the output path")?
    {
        let file_type = metadata.file_type();

        if file_type.is_dir() {
            resolved.push(&filename);

            Ok(resolved)
        } else if file_type.is_file() {
            Ok(resolved)
        } else {
            #[cfg(target_family = "unix")]
            if file_type.is_fifo() || file_type.is_char_device() {
                return Ok(resolved);
            }

            Err("output path is not a file or directory".into())
        }
    } else {
        let parent = resolved.parent()
            .context("output path does not exist")?;

        let metadata = metadata(parent)
            .context("failed to resolve output path")?
            .context("output path does not exist")?;

        if !metadata.is_dir() {
            return Err("output path is not a directory".into());
        }

        Ok(resolved)
    }
}

/// regular files are written to a sibling temporary file that only replaces
/// the output once the whole body arrived. fifos and devices are written
/// directly
fn write_output<R>(reader: &mut R, output_path: &Path) -> error::Result<u64>
where
    R: Read
{
    let is_regular = metadata(output_path)
        .context("failed to resolve the output path")?
        .map(|m| m.is_file())
        .unwrap_or(true);

    if !is_regular {
        let mut output = std::fs::OpenOptions::new()
            .write(true)
            .open(output_path)
            .context("failed to open output file")?;

        return std::io::copy(reader, &mut output)
            .context("error when reading response");
    }

    let parent = output_path.parent()
        .context("output path has no parent directory")?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".sharebox-")
        .suffix(".part")
        .tempfile_in(parent)
        .context("failed to create temporary output file")?;

    let written = std::io::copy(reader, tmp.as_file_mut())
        .context("error when reading response")?;

    tmp.persist(output_path)
        .context("failed to move the download into place")?;

    Ok(written)
}

pub fn download(state: &mut State, args: DownloadArgs) -> error::Result {
    let record = state.find(&args.selector)?;

    let mut response = DownloadFile::url(record.download_url.clone())
        .send(&state.service)
        .context("failed to download file")?;

    let filename = get_filename(response.headers())
        .or_else(|| safe_file_name(&record.original_name))
        .or_else(|| safe_file_name(&record.storage_key))
        .context("no usable file name for the download")?;
    let output_path = resolve_file_path(args.output, &filename)?;

    let start = std::time::Instant::now();

    let bytes_read = write_output(&mut response, &output_path)?;

    let duration = start.elapsed();

    println!(
        "{} -> {} {} {:#?}",
        record.original_name,
        output_path.display(),
        formatting::format_file_size(bytes_read),
        duration
    );

    if bytes_read != record.size {
        tracing::warn!("expected {} bytes, received {}", record.size, bytes_read);
    }

    Ok(())
}
