//! Error taxonomy for a single fetch.
//!
//! Every failure a fetch can produce is one of four kinds. Failures are
//! values: they travel through [`Result`] and are never raised across the
//! asynchronous boundary.

use thiserror::Error;

/// Boxed cause carried by [`FetchError::RequestFailed`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, FetchError>;

/// Fieldless discriminant of [`FetchError`], for matching without causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidUrl,
    RequestFailed,
    InvalidResponse,
    DecodingFailed,
}

#[derive(Error, Debug)]
pub enum FetchError {
    /// The URL string could not be turned into an absolute http(s) URL.
    /// No request was issued.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The request could not be built or the transport failed
    /// (DNS, connect, TLS, body read).
    #[error("request failed: {0}")]
    RequestFailed(#[source] BoxError),

    /// The transport succeeded but the response carried no body.
    #[error("response has no body")]
    InvalidResponse,

    /// The body is not JSON of the expected shape.
    #[error("failed to decode response body: {0}")]
    DecodingFailed(#[source] serde_json::Error),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            FetchError::RequestFailed(_) => ErrorKind::RequestFailed,
            FetchError::InvalidResponse => ErrorKind::InvalidResponse,
            FetchError::DecodingFailed(_) => ErrorKind::DecodingFailed,
        }
    }

    pub(crate) fn invalid_url(url: &str, reason: impl ToString) -> Self {
        FetchError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn request_failed<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        FetchError::RequestFailed(Box::new(err))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::request_failed(err)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::DecodingFailed(err)
    }
}
