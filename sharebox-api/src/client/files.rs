use reqwest::StatusCode;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Response;

use crate::client::error::RequestError;
use crate::client::progress::{ProgressRead, OnProgress};
use crate::client::ApiClient;
use crate::{ApiError, ApiErrorKind};
use crate::files::{
    FileRecord,
    Health,
    ListFiles as ListFilesBody,
    Status,
    Uploaded,
};

/// builds the error for a response that did not carry the expected status,
/// picking up the `message` of an error body when there is one
fn unexpected_status(status: StatusCode, body: &str) -> ApiError {
    let err = ApiError::from(ApiErrorKind::UnexpectedStatus)
        .with_status(status.as_u16());

    match serde_json::from_str::<Status>(body) {
        Ok(Status { message: Some(msg), .. }) => err.with_message(msg),
        _ => err
    }
}

fn malformed(status: StatusCode, err: serde_json::Error) -> ApiError {
    ApiError::from((ApiErrorKind::MalformedResponse, err.to_string()))
        .with_status(status.as_u16())
}

fn unsuccessful(status: StatusCode, message: Option<String>) -> ApiError {
    let err = ApiError::from(ApiErrorKind::Unsuccessful)
        .with_status(status.as_u16());

    if let Some(msg) = message {
        err.with_message(msg)
    } else {
        err
    }
}

/// `GET /api/files/`
pub struct ListFiles {}

impl ListFiles {
    pub fn new() -> Self {
        ListFiles {}
    }

    pub fn send(self, client: &ApiClient) -> Result<Vec<FileRecord>, RequestError> {
        let url = client.endpoint(&["api", "files", ""])?;
        let res = client.get(url).send()?;
        let status = res.status();
        let body = res.text()?;

        if !status.is_success() {
            return Err(unexpected_status(status, &body).into());
        }

        let parsed: ListFilesBody = serde_json::from_str(&body)
            .map_err(|e| malformed(status, e))?;

        if !parsed.success {
            return Err(unsuccessful(status, parsed.message).into());
        }

        let files = parsed.files.unwrap_or_default();

        tracing::debug!("listed {} files", files.len());

        Ok(files)
    }
}

/// `POST /api/files/upload` with the content in a multipart field named
/// `file`. only `201 Created` counts as success
pub struct UploadFile<R> {
    reader: R,
    file_name: String,
    content_type: Option<mime::Mime>,
    content_length: Option<u64>,
    on_progress: Option<OnProgress>,
}

impl<R> UploadFile<R> {
    pub fn new<N>(file_name: N, reader: R) -> Self
    where
        N: Into<String>
    {
        UploadFile {
            reader,
            file_name: file_name.into(),
            content_type: None,
            content_length: None,
            on_progress: None,
        }
    }

    pub fn content_type(&mut self, mime: mime::Mime) -> &mut Self {
        self.content_type = Some(mime);
        self
    }

    /// without a length the transport cannot report byte level progress
    pub fn content_length(&mut self, length: u64) -> &mut Self {
        self.content_length = Some(length);
        self
    }

    pub fn on_progress<F>(&mut self, cb: F) -> &mut Self
    where
        F: FnMut(u64, Option<u64>) + Send + 'static
    {
        self.on_progress = Some(Box::new(cb));
        self
    }
}

impl<R> UploadFile<R>
where
    R: std::io::Read + Send + 'static
{
    pub fn send(self, client: &ApiClient) -> Result<Option<FileRecord>, RequestError> {
        let content_type = self.content_type.unwrap_or(mime::APPLICATION_OCTET_STREAM);

        let part = match (self.on_progress, self.content_length) {
            (Some(cb), Some(length)) => Part::reader_with_length(
                ProgressRead::new(self.reader, Some(length), cb),
                length
            ),
            (Some(cb), None) => Part::reader(ProgressRead::new(self.reader, None, cb)),
            (None, Some(length)) => Part::reader_with_length(self.reader, length),
            (None, None) => Part::reader(self.reader),
        };

        let part = part.file_name(self.file_name)
            .mime_str(content_type.as_ref())?;
        let form = Form::new().part("file", part);

        let url = client.endpoint(&["api", "files", "upload"])?;
        let res = client.post(url)
            .multipart(form)
            .send()?;
        let status = res.status();
        let body = res.text()?;

        if status != StatusCode::CREATED {
            return Err(unexpected_status(status, &body).into());
        }

        // the record is informational, the catalog is refreshed from the
        // listing anyway
        match serde_json::from_str::<Uploaded>(&body) {
            Ok(uploaded) => Ok(uploaded.file),
            Err(err) => {
                tracing::debug!("upload response body was not understood: {}", err);

                Ok(None)
            }
        }
    }
}

/// `DELETE /api/files/{storage_key}`
pub struct DeleteFile {
    storage_key: String,
}

impl DeleteFile {
    pub fn storage_key<K>(storage_key: K) -> Self
    where
        K: Into<String>
    {
        DeleteFile {
            storage_key: storage_key.into()
        }
    }

    pub fn send(self, client: &ApiClient) -> Result<(), RequestError> {
        let url = client.endpoint(&["api", "files", self.storage_key.as_str()])?;
        let res = client.delete(url).send()?;
        let status = res.status();
        let body = res.text()?;

        if !status.is_success() {
            return Err(unexpected_status(status, &body).into());
        }

        let parsed: Status = serde_json::from_str(&body)
            .map_err(|e| malformed(status, e))?;

        if !parsed.success {
            return Err(unsuccessful(status, parsed.message).into());
        }

        Ok(())
    }
}

/// fetches the content behind a record's download url
pub struct DownloadFile {
    locator: String,
}

impl DownloadFile {
    pub fn url<L>(locator: L) -> Self
    where
        L: Into<String>
    {
        DownloadFile {
            locator: locator.into()
        }
    }

    pub fn send(self, client: &ApiClient) -> Result<Response, RequestError> {
        let url = client.resolve(&self.locator)?;
        let res = client.get(url).send()?;
        let status = res.status();

        if status != StatusCode::OK {
            let body = res.text()?;

            return Err(unexpected_status(status, &body).into());
        }

        Ok(res)
    }
}

/// `GET /api/health`
pub struct Ping {}

impl Ping {
    pub fn new() -> Self {
        Ping {}
    }

    pub fn send(self, client: &ApiClient) -> Result<Health, RequestError> {
        let url = client.endpoint(&["api", "health"])?;
        let res = client.get(url).send()?;
        let status = res.status();
        let body = res.text()?;

        if !status.is_success() {
            return Err(unexpected_status(status, &body).into());
        }

        let health: Health = serde_json::from_str(&body)
            .map_err(|e| malformed(status, e))?;

        Ok(health)
    }
}
