use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::catalog::Catalog;
use crate::error::ActionError;
use crate::path::metadata;
use crate::service::StorageService;

/// receives every new progress value. may be called from the thread that
/// feeds the transport
pub type ProgressObserver = Arc<dyn Fn(u8) + Send + Sync>;

/// upload progress in percent for a single session.
///
/// clones share the same value. the value only ever moves up, so a reader
/// on any thread sees a non-decreasing sequence no matter how the transport
/// reports.
#[derive(Clone)]
pub struct Progress {
    value: Arc<AtomicU8>,
    observer: Option<ProgressObserver>,
}

impl Progress {
    pub fn new() -> Self {
        Progress {
            value: Arc::new(AtomicU8::new(0)),
            observer: None,
        }
    }

    pub fn with_observer(observer: ProgressObserver) -> Self {
        Progress {
            value: Arc::new(AtomicU8::new(0)),
            observer: Some(observer),
        }
    }

    pub fn get(&self) -> u8 {
        self.value.load(Ordering::Acquire)
    }

    /// records `sent` out of `total` bytes and returns the current value.
    /// an unknown or zero total leaves the value where it is
    pub fn report(&self, sent: u64, total: Option<u64>) -> u8 {
        match total {
            Some(total) if total > 0 => self.raise(percent_of(sent, total)),
            _ => self.get()
        }
    }

    pub(crate) fn complete(&self) {
        self.raise(100);
    }

    fn raise(&self, percent: u8) -> u8 {
        let prev = self.value.fetch_max(percent, Ordering::AcqRel);

        if percent > prev {
            if let Some(observer) = &self.observer {
                observer(percent);
            }

            percent
        } else {
            prev
        }
    }
}

impl std::default::Default for Progress {
    fn default() -> Self {
        Progress::new()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("value", &self.get())
            .finish()
    }
}

/// rounded to the nearest whole percent
fn percent_of(sent: u64, total: u64) -> u8 {
    let sent = sent.min(total) as u128;
    let total = total as u128;

    ((sent * 100 + total / 2) / total) as u8
}

/// a local file chosen for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub mime: mime::Mime,
}

impl SelectedFile {
    /// checks that `path` is a regular file no larger than `max_size` and
    /// guesses its content type from the extension
    pub fn from_path<P>(path: P, max_size: u64) -> Result<Self, ActionError>
    where
        P: AsRef<Path>
    {
        let path = path.as_ref();
        let meta = metadata(path)
            .map_err(|e| ActionError::validation(format!(
                "failed to read \"{}\": {}", path.display(), e
            )))?
            .ok_or_else(|| ActionError::validation(format!(
                "file not found: \"{}\"", path.display()
            )))?;

        if !meta.is_file() {
            return Err(ActionError::validation(format!(
                "\"{}\" is not a file", path.display()
            )));
        }

        if meta.len() > max_size {
            return Err(ActionError::validation(format!(
                "file size exceeds maximum allowed size ({} > {} bytes)", meta.len(), max_size
            )));
        }

        let name = path.file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ActionError::validation(
                "the file name is missing or contains invalid utf-8 characters"
            ))?
            .to_owned();

        Ok(SelectedFile {
            path: path.to_owned(),
            name,
            size: meta.len(),
            mime: mime_guess::from_path(path).first_or_octet_stream(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
    Idle,
    FileSelected,
    Uploading(u8),
    Succeeded,
    Failed(String),
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferStatus::Idle => write!(f, "idle"),
            TransferStatus::FileSelected => write!(f, "file selected"),
            TransferStatus::Uploading(p) => write!(f, "uploading {}%", p),
            TransferStatus::Succeeded => write!(f, "succeeded"),
            TransferStatus::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    FileSelected,
    Uploading,
    Succeeded,
    Failed(String),
}

pub type StatusListener = Box<dyn FnMut(&TransferStatus)>;

/// result of a successful upload
#[derive(Debug)]
pub struct Uploaded {
    pub file: SelectedFile,
    /// outcome of the catalog refresh the upload triggered. a failed refresh
    /// does not undo the upload
    pub refreshed: Result<usize, ActionError>,
}

/// at most one selection-to-upload attempt.
///
/// ```text
/// Idle         --select--> FileSelected
/// FileSelected --select--> FileSelected
/// FileSelected --start---> Uploading(0) --> Succeeded --> Idle
///                                       \-> Failed(message)
/// Failed       --select--> FileSelected
/// ```
pub struct TransferSession {
    selected: Option<SelectedFile>,
    phase: Phase,
    progress: Progress,
    observer: Option<ProgressObserver>,
    listener: Option<StatusListener>,
    message: Option<String>,
}

impl TransferSession {
    pub fn new() -> Self {
        TransferSession {
            selected: None,
            phase: Phase::Idle,
            progress: Progress::new(),
            observer: None,
            listener: None,
            message: None,
        }
    }

    /// observer handed to the progress tracker of every session
    pub fn on_progress(&mut self, observer: ProgressObserver) -> &mut Self {
        self.observer = Some(observer);
        self
    }

    #[cfg(test)]
    /// called on every state transition
    pub fn on_status(&mut self, listener: StatusListener) -> &mut Self {
        self.listener = Some(listener);
        self
    }

    pub fn status(&self) -> TransferStatus {
        match &self.phase {
            Phase::Idle => TransferStatus::Idle,
            Phase::FileSelected => TransferStatus::FileSelected,
            Phase::Uploading => TransferStatus::Uploading(self.progress.get()),
            Phase::Succeeded => TransferStatus::Succeeded,
            Phase::Failed(msg) => TransferStatus::Failed(msg.clone()),
        }
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn progress(&self) -> u8 {
        self.progress.get()
    }

    /// last user facing message, success or failure
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    fn fresh_progress(&self) -> Progress {
        match &self.observer {
            Some(observer) => Progress::with_observer(observer.clone()),
            None => Progress::new(),
        }
    }

    fn transition(&mut self, phase: Phase) {
        self.phase = phase;

        let status = self.status();

        tracing::debug!("transfer session: {}", status);

        if let Some(listener) = &mut self.listener {
            listener(&status);
        }
    }

    /// replaces any previous selection and starts a new session
    pub fn select(&mut self, file: SelectedFile) -> Result<(), ActionError> {
        if self.phase == Phase::Uploading {
            return Err(ActionError::Busy("upload"));
        }

        self.selected = Some(file);
        self.progress = self.fresh_progress();
        self.message = None;
        self.transition(Phase::FileSelected);

        Ok(())
    }

    /// drops the current selection
    pub fn clear(&mut self) -> Result<(), ActionError> {
        if self.phase == Phase::Uploading {
            return Err(ActionError::Busy("upload"));
        }

        self.selected = None;
        self.progress = self.fresh_progress();
        self.message = None;
        self.transition(Phase::Idle);

        Ok(())
    }

    /// uploads the selected file. on success the selection is cleared
    /// before the catalog is refreshed exactly once
    pub fn start<S>(&mut self, service: &S, catalog: &mut Catalog) -> Result<Uploaded, ActionError>
    where
        S: StorageService + ?Sized
    {
        match &self.phase {
            Phase::FileSelected => {},
            Phase::Uploading => return Err(ActionError::Busy("upload")),
            Phase::Failed(_) => return Err(ActionError::validation(
                "the last upload failed, select the file again to retry"
            )),
            Phase::Idle | Phase::Succeeded => return Err(ActionError::validation(
                "no file selected"
            )),
        }

        let Some(file) = self.selected.clone() else {
            return Err(ActionError::validation("no file selected"));
        };

        self.progress = self.fresh_progress();
        self.message = None;
        self.transition(Phase::Uploading);

        match service.upload_file(&file, self.progress.clone()) {
            Ok(()) => {
                self.progress.complete();
                self.transition(Phase::Succeeded);

                tracing::info!("uploaded \"{}\" ({} bytes)", file.name, file.size);

                self.selected = None;
                self.message = Some(String::from("file uploaded successfully"));
                self.transition(Phase::Idle);

                let refreshed = catalog.refresh(service);

                Ok(Uploaded { file, refreshed })
            },
            Err(err) => {
                tracing::warn!("upload of \"{}\" failed: {}", file.name, err);

                let msg = format!("upload failed: {}", err);

                self.message = Some(msg.clone());
                self.transition(Phase::Failed(msg));

                Err(err)
            }
        }
    }
}

impl std::default::Default for TransferSession {
    fn default() -> Self {
        TransferSession::new()
    }
}
