use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::RequestBuilder;

pub mod error;
pub mod files;
pub mod progress;

use error::{ApiClientError, RequestError};

pub struct Info {
    pub url: Url
}

pub struct ApiClient {
    pub(crate) client: reqwest::blocking::Client,
    pub(crate) info: Info
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder {
            secure: false,
            host: String::from("localhost"),
            port: None,
            base_path: String::from("/"),
            timeout: None,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.info.url
    }

    /// builds an absolute url from path segments appended to the base url.
    /// an empty trailing segment keeps the trailing slash
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, RequestError> {
        let mut url = self.info.url.clone();

        url.path_segments_mut()
            .map_err(|_| RequestError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// resolves a locator handed out by the service, which may be absolute
    /// or relative to the base url
    pub fn resolve<U>(&self, locator: U) -> Result<Url, RequestError>
    where
        U: AsRef<str>
    {
        let locator = locator.as_ref();

        match Url::parse(locator) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Ok(self.info.url.join(locator.trim_start_matches('/'))?)
            }
            Err(err) => Err(RequestError::Url(err))
        }
    }

    pub(crate) fn get(&self, url: Url) -> RequestBuilder {
        tracing::debug!("GET {}", url);

        self.client.get(url)
    }

    pub(crate) fn post(&self, url: Url) -> RequestBuilder {
        tracing::debug!("POST {}", url);

        self.client.post(url)
    }

    pub(crate) fn delete(&self, url: Url) -> RequestBuilder {
        tracing::debug!("DELETE {}", url);

        self.client.delete(url)
    }
}

pub struct ApiClientBuilder {
    secure: bool,
    host: String,
    port: Option<u16>,
    base_path: String,
    timeout: Option<Duration>,
}

impl ApiClientBuilder {
    pub fn secure(&mut self, is_secure: bool) {
        self.secure = is_secure;
    }

    pub fn host<H>(&mut self, host: H)
    where
        H: Into<String>
    {
        self.host = host.into();
    }

    pub fn port(&mut self, port: Option<u16>) {
        self.port = port;
    }

    /// prefix the service is mounted under. defaults to `/`
    pub fn base_path<B>(&mut self, base_path: B)
    where
        B: Into<String>
    {
        self.base_path = base_path.into();
    }

    pub fn timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    pub fn url(&self) -> Result<Url, ApiClientError> {
        let scheme = if self.secure { "https" } else { "http" };
        let mut url = Url::parse(&format!("{}://localhost/", scheme))
            .map_err(ApiClientError::Url)?;

        url.set_host(Some(&self.host))
            .map_err(ApiClientError::Url)?;
        url.set_port(self.port)
            .map_err(|_| ApiClientError::InvalidPort)?;

        let trimmed = self.base_path.trim_matches('/');

        if trimmed.is_empty() {
            url.set_path("/");
        } else {
            url.set_path(&format!("/{}/", trimmed));
        }

        Ok(url)
    }

    pub fn build(self) -> Result<ApiClient, ApiClientError> {
        let url = self.url()?;
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(concat!("sharebox-api-client/", env!("CARGO_PKG_VERSION")));

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        } else {
            // the blocking client otherwise gives up after 30 seconds
            builder = builder.timeout(None);
        }

        let client = builder.build()
            .map_err(ApiClientError::Reqwest)?;

        Ok(ApiClient {
            client,
            info: Info { url }
        })
    }
}
