use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::serde::non_empty_str;

/// metadata of a single file held by the storage service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    /// key used to address the stored content. the service calls it
    /// `filename`
    #[serde(rename = "filename")]
    pub storage_key: String,
    pub original_name: String,
    pub size: u64,
    #[serde(default, with = "non_empty_str")]
    pub mime_type: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub download_url: String,
}

/// body of `GET /api/files/`
#[derive(Debug, Serialize, Deserialize)]
pub struct ListFiles {
    pub success: bool,
    #[serde(default)]
    pub files: Option<Vec<FileRecord>>,
    #[serde(default)]
    pub message: Option<String>,
}

/// body of `POST /api/files/upload`
#[derive(Debug, Serialize, Deserialize)]
pub struct Uploaded {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub file: Option<FileRecord>,
}

/// generic `{ success, message }` body returned by deletes and by every
/// error response
#[derive(Debug, Serialize, Deserialize)]
pub struct Status {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// body of `GET /api/health`
#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn record_from_service_json() {
        let json = r#"{
            "id": "0b7c8d1e-6f0a-4b8e-9f51-5d2b7e0c9a11",
            "originalName": "report.pdf",
            "filename": "9a3e2f40-1c55-4d8e-a0f2-7c1b9d6e4f30.pdf",
            "size": 500000,
            "mimeType": "application/pdf",
            "uploadedAt": "2024-03-01T12:30:45.123456789+01:00",
            "downloadUrl": "/api/files/9a3e2f40-1c55-4d8e-a0f2-7c1b9d6e4f30.pdf/download"
        }"#;

        let record: FileRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.original_name, "report.pdf");
        assert_eq!(record.storage_key, "9a3e2f40-1c55-4d8e-a0f2-7c1b9d6e4f30.pdf");
        assert_eq!(record.size, 500000);
        assert_eq!(record.mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(record.uploaded_at.timestamp(), 1709292645);
    }

    #[test]
    fn empty_mime_type_is_absent() {
        let json = r#"{
            "id": "a",
            "originalName": "notes",
            "filename": "b",
            "size": 0,
            "mimeType": "",
            "uploadedAt": "2024-03-01T12:30:45Z",
            "downloadUrl": "/api/files/b/download"
        }"#;

        let record: FileRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.mime_type, None);
    }

    #[test]
    fn list_with_null_files() {
        let list: ListFiles = serde_json::from_str(r#"{"success":true,"files":null}"#).unwrap();

        assert!(list.success);
        assert!(list.files.is_none());
    }
}
