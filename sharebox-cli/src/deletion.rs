use sharebox_api::files::FileRecord;

use crate::catalog::Catalog;
use crate::error::ActionError;
use crate::service::StorageService;

/// asks the user to approve a destructive action. blocks until answered
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> std::io::Result<bool>;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> std::io::Result<bool>
{
    fn confirm(&mut self, prompt: &str) -> std::io::Result<bool> {
        self(prompt)
    }
}

pub const CONFIRM_PROMPT: &str = "Are you sure you want to delete this file?";

#[derive(Debug)]
pub enum Deletion {
    /// the user said no, nothing was sent
    Declined,
    /// the service removed the file. carries the outcome of the follow up
    /// catalog refresh
    Deleted {
        refreshed: Result<usize, ActionError>,
    },
}

/// confirm, delete, refresh. one deletion at a time
#[derive(Debug, Default)]
pub struct DeletionFlow {
    pending: Option<String>,
}

struct PendingGuard<'a> {
    slot: &'a mut Option<String>,
}

impl<'a> Drop for PendingGuard<'a> {
    fn drop(&mut self) {
        self.slot.take();
    }
}

impl DeletionFlow {
    pub fn new() -> Self {
        DeletionFlow::default()
    }

    #[cfg(test)]
    /// storage key of the deletion currently being sent
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn request_deletion<C, S>(
        &mut self,
        record: &FileRecord,
        confirm: &mut C,
        service: &S,
        catalog: &mut Catalog,
    ) -> Result<Deletion, ActionError>
    where
        C: Confirm + ?Sized,
        S: StorageService + ?Sized,
    {
        if let Some(key) = &self.pending {
            tracing::debug!("deletion of {} still pending", key);

            return Err(ActionError::Busy("deletion"));
        }

        let prompt = format!("{} \"{}\"", CONFIRM_PROMPT, record.original_name);

        let approved = confirm.confirm(&prompt)
            .map_err(|e| ActionError::validation(format!(
                "failed to read confirmation: {}", e
            )))?;

        if !approved {
            tracing::debug!("deletion of {} declined", record.storage_key);

            return Ok(Deletion::Declined);
        }

        let result = {
            self.pending = Some(record.storage_key.clone());
            let _guard = PendingGuard { slot: &mut self.pending };

            service.delete_file(&record.storage_key)
        };

        match result {
            Ok(()) => {
                tracing::info!("deleted \"{}\" ({})", record.original_name, record.storage_key);

                Ok(Deletion::Deleted {
                    refreshed: catalog.refresh(service),
                })
            },
            Err(err) => {
                tracing::warn!("failed to delete {}: {}", record.storage_key, err);

                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::service::fake::{FakeService, Call, record};

    fn catalog_with(service: &FakeService, given: Vec<FileRecord>) -> Catalog {
        let mut catalog = Catalog::new();

        service.push_listing(Ok(given));
        catalog.refresh(service).unwrap();

        catalog
    }

    fn answer(value: bool) -> impl FnMut(&str) -> std::io::Result<bool> {
        move |_prompt| Ok(value)
    }

    #[test]
    fn declined_makes_no_calls() {
        let service = FakeService::new();
        let mut catalog = catalog_with(&service, vec![record("A", 1), record("B", 2)]);
        let mut flow = DeletionFlow::new();
        let b = catalog.records()[1].clone();

        let mut prompts = Vec::new();
        let mut confirm = |prompt: &str| -> std::io::Result<bool> {
            prompts.push(prompt.to_owned());
            Ok(false)
        };

        let result = flow.request_deletion(&b, &mut confirm, &service, &mut catalog).unwrap();

        assert!(matches!(result, Deletion::Declined));
        assert_eq!(service.calls(), vec![Call::List]);
        assert_eq!(catalog.size(), 2);
        assert_eq!(prompts, vec![String::from("Are you sure you want to delete this file? \"B\"")]);
    }

    #[test]
    fn rejected_deletion_keeps_record() {
        let service = FakeService::new();
        let mut catalog = catalog_with(&service, vec![record("A", 1), record("B", 2)]);
        let mut flow = DeletionFlow::new();
        let b = catalog.records()[1].clone();

        service.push_delete(Err(ActionError::ServerRejected(String::from("Unsuccessful (500): Failed to delete file"))));

        let err = flow.request_deletion(&b, &mut answer(true), &service, &mut catalog).unwrap_err();

        assert!(matches!(err, ActionError::ServerRejected(_)));
        assert_eq!(service.calls(), vec![Call::List, Call::Delete(String::from("B-key"))]);
        assert!(catalog.find("B").is_some());
        assert!(flow.pending().is_none());
    }

    #[test]
    fn confirmed_deletion_refreshes_once() {
        let service = FakeService::new();
        let mut catalog = catalog_with(&service, vec![record("A", 1), record("B", 2)]);
        let mut flow = DeletionFlow::new();
        let b = catalog.records()[1].clone();

        service.push_delete(Ok(()));
        service.push_listing(Ok(vec![record("A", 1)]));

        let result = flow.request_deletion(&b, &mut answer(true), &service, &mut catalog).unwrap();

        match result {
            Deletion::Deleted { refreshed } => assert_eq!(refreshed, Ok(1)),
            Deletion::Declined => panic!("deletion was declined"),
        }

        assert_eq!(service.list_count(), 2);
        assert!(catalog.find("B").is_none());
        assert!(flow.pending().is_none());
    }

    #[test]
    fn repeat_deletion_fails_gracefully() {
        let service = FakeService::new();
        let mut catalog = catalog_with(&service, vec![record("A", 1), record("B", 2)]);
        let mut flow = DeletionFlow::new();
        let b = catalog.records()[1].clone();

        service.push_delete(Ok(()));
        service.push_listing(Ok(vec![record("A", 1)]));
        service.push_delete(Err(ActionError::ServerRejected(String::from("Unsuccessful (404): File not found"))));

        flow.request_deletion(&b, &mut answer(true), &service, &mut catalog).unwrap();

        let err = flow.request_deletion(&b, &mut answer(true), &service, &mut catalog).unwrap_err();

        assert!(matches!(err, ActionError::ServerRejected(_)));
        assert_eq!(catalog.size(), 1);
        assert_eq!(service.count(&Call::Delete(String::from("B-key"))), 2);
    }

    #[test]
    fn confirmation_error_is_validation() {
        let service = FakeService::new();
        let mut catalog = Catalog::new();
        let mut flow = DeletionFlow::new();
        let mut confirm = |_: &str| -> std::io::Result<bool> {
            Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "stdin closed"))
        };

        let err = flow.request_deletion(&record("A", 1), &mut confirm, &service, &mut catalog).unwrap_err();

        assert!(matches!(err, ActionError::Validation(_)));
        assert!(service.calls().is_empty());
    }

    #[test]
    fn pending_deletion_is_busy() {
        let service = FakeService::new();
        let mut catalog = Catalog::new();
        let mut flow = DeletionFlow { pending: Some(String::from("A-key")) };

        let err = flow.request_deletion(&record("B", 1), &mut answer(true), &service, &mut catalog).unwrap_err();

        assert_eq!(err, ActionError::Busy("deletion"));
        assert!(service.calls().is_empty());
    }
}
