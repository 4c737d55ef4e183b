use std::path::Path;

use sharebox_api::files::FileRecord;

use crate::catalog::Catalog;
use crate::deletion::{Confirm, Deletion, DeletionFlow};
use crate::error::ActionError;
use crate::service::StorageService;
use crate::transfer::{SelectedFile, TransferSession, Uploaded};

/// everything the front end works with. owns the storage service handle
/// together with the catalog, the transfer session and the deletion flow
pub struct AppState<S> {
    pub service: S,
    pub catalog: Catalog,
    pub transfer: TransferSession,
    pub deletion: DeletionFlow,
    pub max_upload_size: u64,
}

impl<S> AppState<S>
where
    S: StorageService
{
    pub fn new(service: S, max_upload_size: u64) -> Self {
        AppState {
            service,
            catalog: Catalog::new(),
            transfer: TransferSession::new(),
            deletion: DeletionFlow::new(),
            max_upload_size,
        }
    }

    /// initial fetch of the catalog
    pub fn load(&mut self) -> Result<usize, ActionError> {
        self.catalog.refresh(&self.service)
    }

    pub fn select<P>(&mut self, path: P) -> Result<&SelectedFile, ActionError>
    where
        P: AsRef<Path>
    {
        let file = SelectedFile::from_path(path, self.max_upload_size)?;

        self.transfer.select(file)?;

        self.transfer.selected()
            .ok_or_else(|| ActionError::validation("no file selected"))
    }

    pub fn upload(&mut self) -> Result<Uploaded, ActionError> {
        self.transfer.start(&self.service, &mut self.catalog)
    }

    pub fn find(&self, selector: &str) -> Result<FileRecord, ActionError> {
        self.catalog.find(selector)
            .cloned()
            .ok_or_else(|| ActionError::validation(format!(
                "no file matching \"{}\"", selector
            )))
    }

    pub fn delete<C>(&mut self, selector: &str, confirm: &mut C) -> Result<Deletion, ActionError>
    where
        C: Confirm + ?Sized
    {
        let record = self.find(selector)?;

        self.deletion.request_deletion(&record, confirm, &self.service, &mut self.catalog)
    }
}
