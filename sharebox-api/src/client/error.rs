use std::error::Error;
use std::fmt;

use crate::ApiError;

#[derive(Debug)]
pub enum ApiClientError {
    InvalidPort,
    Url(url::ParseError),
    Reqwest(reqwest::Error),
}

impl fmt::Display for ApiClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiClientError::InvalidPort => write!(f, "ApiClientError::InvalidPort"),
            ApiClientError::Url(_) => write!(f, "ApiClientError::Url"),
            ApiClientError::Reqwest(_) => write!(f, "ApiClientError::Reqwest"),
        }
    }
}

impl Error for ApiClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ApiClientError::Url(v) => Some(v),
            ApiClientError::Reqwest(v) => Some(v),
            _ => None
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),
}
