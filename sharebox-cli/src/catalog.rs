use sharebox_api::files::FileRecord;

use crate::error::ActionError;
use crate::service::StorageService;

/// the client side copy of the remote listing.
///
/// records are kept in the order the service returned them and are only
/// ever replaced as a whole after a successful fetch.
#[derive(Debug, Default)]
pub struct Catalog {
    records: Vec<FileRecord>,
    loading: bool,
}

/// clears the loading flag however the refresh ends
struct LoadingGuard<'a> {
    flag: &'a mut bool,
}

impl<'a> LoadingGuard<'a> {
    fn set(flag: &'a mut bool) -> Self {
        *flag = true;

        LoadingGuard { flag }
    }
}

impl<'a> Drop for LoadingGuard<'a> {
    fn drop(&mut self) {
        *self.flag = false;
    }
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    #[cfg(test)]
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// what should be rendered. nothing while a fetch is running even
    /// though the previous records are still held
    pub fn visible(&self) -> Option<&[FileRecord]> {
        if self.loading {
            None
        } else {
            Some(&self.records)
        }
    }

    pub fn size(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// looks up a record by its 1-based position, id, storage key or
    /// original name, in that order
    pub fn find(&self, selector: &str) -> Option<&FileRecord> {
        if let Ok(index) = selector.parse::<usize>() {
            if index > 0 {
                if let Some(found) = self.records.get(index - 1) {
                    return Some(found);
                }
            }
        }

        self.records.iter().find(|r| r.id == selector)
            .or_else(|| self.records.iter().find(|r| r.storage_key == selector))
            .or_else(|| self.records.iter().find(|r| r.original_name == selector))
    }

    /// fetches the full listing and replaces the current records with it.
    /// on failure the current records stay as they are
    pub fn refresh<S>(&mut self, service: &S) -> Result<usize, ActionError>
    where
        S: StorageService + ?Sized
    {
        if self.loading {
            return Err(ActionError::Busy("catalog refresh"));
        }

        let result = {
            let _guard = LoadingGuard::set(&mut self.loading);

            service.list_files()
        };

        match result {
            Ok(records) => {
                tracing::debug!("catalog refreshed with {} records", records.len());

                self.records = records;

                Ok(self.records.len())
            },
            Err(err) => {
                tracing::warn!("catalog refresh failed: {}", err);

                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::service::fake::{FakeService, Call, record};

    fn names(catalog: &Catalog) -> Vec<&str> {
        catalog.records()
            .iter()
            .map(|r| r.original_name.as_str())
            .collect()
    }

    fn loaded(service: &FakeService, given: Vec<FileRecord>) -> Catalog {
        let mut catalog = Catalog::new();

        service.push_listing(Ok(given));
        catalog.refresh(service).unwrap();

        catalog
    }

    #[test]
    fn refresh_replaces_records() {
        let service = FakeService::new();
        let mut catalog = loaded(&service, vec![record("A", 1), record("B", 2)]);

        service.push_listing(Ok(vec![record("A", 1), record("B", 2), record("C", 3)]));

        assert_eq!(catalog.refresh(&service), Ok(3));
        assert_eq!(names(&catalog), vec!["A", "B", "C"]);
        assert_eq!(catalog.size(), 3);
        assert!(!catalog.is_loading());
    }

    #[test]
    fn network_failure_keeps_records() {
        let service = FakeService::new();
        let mut catalog = loaded(&service, vec![record("A", 1), record("B", 2)]);

        service.push_listing(Err(ActionError::Network(String::from("connection refused"))));

        let err = catalog.refresh(&service).unwrap_err();

        assert!(matches!(err, ActionError::Network(_)));
        assert_eq!(names(&catalog), vec!["A", "B"]);
        assert!(!catalog.is_loading());
        assert_eq!(catalog.visible().map(|v| v.len()), Some(2));
    }

    #[test]
    fn rejected_listing_keeps_records() {
        let service = FakeService::new();
        let mut catalog = loaded(&service, vec![record("A", 1), record("B", 2)]);

        service.push_listing(Err(ActionError::ServerRejected(String::from("Unsuccessful (200): "))));

        assert!(catalog.refresh(&service).is_err());
        assert_eq!(names(&catalog), vec!["A", "B"]);
        assert_eq!(service.calls(), vec![Call::List, Call::List]);
    }

    #[test]
    fn server_order_is_kept() {
        let service = FakeService::new();
        let catalog = loaded(&service, vec![record("zeta", 1), record("alpha", 2), record("mid", 3)]);

        assert_eq!(names(&catalog), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn empty_listing_clears() {
        let service = FakeService::new();
        let mut catalog = loaded(&service, vec![record("A", 1)]);

        service.push_listing(Ok(Vec::new()));

        assert_eq!(catalog.refresh(&service), Ok(0));
        assert_eq!(catalog.size(), 0);
    }

    #[test]
    fn loading_hides_records() {
        let mut catalog = Catalog::new();
        catalog.records = vec![record("A", 1)];
        catalog.loading = true;

        assert!(catalog.visible().is_none());
        assert_eq!(catalog.size(), 1);

        let service = FakeService::new();

        assert_eq!(catalog.refresh(&service), Err(ActionError::Busy("catalog refresh")));
        assert!(service.calls().is_empty());
    }

    #[test]
    fn find_by_selector() {
        let service = FakeService::new();
        let catalog = loaded(&service, vec![record("A", 1), record("B", 2), record("3", 3)]);

        assert_eq!(catalog.find("2").map(|r| r.original_name.as_str()), Some("B"));
        assert_eq!(catalog.find("A-id").map(|r| r.original_name.as_str()), Some("A"));
        assert_eq!(catalog.find("B-key").map(|r| r.original_name.as_str()), Some("B"));
        assert_eq!(catalog.find("B").map(|r| r.original_name.as_str()), Some("B"));
        assert_eq!(catalog.find("3").map(|r| r.original_name.as_str()), Some("3"));
        assert!(catalog.find("0").is_none());
        assert!(catalog.find("missing").is_none());
    }
}
