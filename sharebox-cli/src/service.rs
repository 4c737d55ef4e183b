use sharebox_api::client::ApiClient;
use sharebox_api::client::files::{ListFiles, UploadFile, DeleteFile};
use sharebox_api::files::FileRecord;

use crate::error::ActionError;
use crate::transfer::{Progress, SelectedFile};

/// the operations the catalog, transfer session and deletion flow need from
/// the remote store
pub trait StorageService {
    /// full listing in the order the service returns it
    fn list_files(&self) -> Result<Vec<FileRecord>, ActionError>;

    /// sends the content of one local file, reporting into `progress`.
    /// `Ok` only when the service confirmed creation
    fn upload_file(&self, file: &SelectedFile, progress: Progress) -> Result<(), ActionError>;

    fn delete_file(&self, storage_key: &str) -> Result<(), ActionError>;
}

impl StorageService for ApiClient {
    fn list_files(&self) -> Result<Vec<FileRecord>, ActionError> {
        Ok(ListFiles::new().send(self)?)
    }

    fn upload_file(&self, file: &SelectedFile, progress: Progress) -> Result<(), ActionError> {
        let reader = std::fs::OpenOptions::new()
            .read(true)
            .open(&file.path)
            .map_err(|e| ActionError::validation(format!(
                "failed to open \"{}\": {}", file.path.display(), e
            )))?;

        // the file may have changed since it was selected
        let length = reader.metadata()
            .map(|m| m.len())
            .unwrap_or(file.size);

        let mut builder = UploadFile::new(file.name.clone(), reader);
        builder.content_type(file.mime.clone())
            .content_length(length)
            .on_progress(move |sent, total| {
                progress.report(sent, total);
            });

        if let Some(record) = builder.send(self)? {
            tracing::debug!("service created record {} for {}", record.id, record.original_name);
        }

        Ok(())
    }

    fn delete_file(&self, storage_key: &str) -> Result<(), ActionError> {
        Ok(DeleteFile::storage_key(storage_key).send(self)?)
    }
}

#[cfg(test)]
pub mod fake {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use chrono::{TimeZone, Utc};
    use sharebox_api::files::FileRecord;

    use super::StorageService;
    use crate::error::ActionError;
    use crate::transfer::{Progress, SelectedFile};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        List,
        Upload(String),
        Delete(String),
    }

    /// scripted in memory store. every call is recorded, results are handed
    /// out in the order they were queued
    #[derive(Default)]
    pub struct FakeService {
        listings: RefCell<VecDeque<Result<Vec<FileRecord>, ActionError>>>,
        uploads: RefCell<VecDeque<(Vec<(u64, Option<u64>)>, Result<(), ActionError>)>>,
        deletes: RefCell<VecDeque<Result<(), ActionError>>>,
        calls: RefCell<Vec<Call>>,
        progress_seen: RefCell<Vec<u8>>,
    }

    impl FakeService {
        pub fn new() -> Self {
            FakeService::default()
        }

        pub fn push_listing(&self, result: Result<Vec<FileRecord>, ActionError>) -> &Self {
            self.listings.borrow_mut().push_back(result);
            self
        }

        /// `events` are (bytes sent, total) pairs fed into the progress
        /// tracker before `result` is returned
        pub fn push_upload(&self, events: Vec<(u64, Option<u64>)>, result: Result<(), ActionError>) -> &Self {
            self.uploads.borrow_mut().push_back((events, result));
            self
        }

        pub fn push_delete(&self, result: Result<(), ActionError>) -> &Self {
            self.deletes.borrow_mut().push_back(result);
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        pub fn count(&self, call: &Call) -> usize {
            self.calls.borrow().iter().filter(|c| *c == call).count()
        }

        pub fn list_count(&self) -> usize {
            self.count(&Call::List)
        }

        /// progress values observed after each scripted event
        pub fn progress_seen(&self) -> Vec<u8> {
            self.progress_seen.borrow().clone()
        }
    }

    impl StorageService for FakeService {
        fn list_files(&self) -> Result<Vec<FileRecord>, ActionError> {
            self.calls.borrow_mut().push(Call::List);

            self.listings.borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(ActionError::Network(String::from("no listing scripted"))))
        }

        fn upload_file(&self, file: &SelectedFile, progress: Progress) -> Result<(), ActionError> {
            self.calls.borrow_mut().push(Call::Upload(file.name.clone()));

            self.progress_seen.borrow_mut().push(progress.get());

            let (events, result) = self.uploads.borrow_mut()
                .pop_front()
                .unwrap_or_else(|| (Vec::new(), Err(ActionError::Network(String::from("no upload scripted")))));

            for (sent, total) in events {
                let value = progress.report(sent, total);

                self.progress_seen.borrow_mut().push(value);
            }

            result
        }

        fn delete_file(&self, storage_key: &str) -> Result<(), ActionError> {
            self.calls.borrow_mut().push(Call::Delete(storage_key.to_owned()));

            self.deletes.borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(ActionError::Network(String::from("no delete scripted"))))
        }
    }

    pub fn record(name: &str, size: u64) -> FileRecord {
        let key = format!("{}-key", name);

        FileRecord {
            id: format!("{}-id", name),
            download_url: format!("/api/files/{}/download", key),
            storage_key: key,
            original_name: name.to_owned(),
            size,
            mime_type: None,
            uploaded_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }
}
