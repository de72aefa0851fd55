use reqwest::{StatusCode, Url};
use thiserror::Error;

use crate::call::CancelCause;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The body could not be buffered for replay. No attempt was made.
    #[error("Body capture error: {0}")]
    BodyCapture(#[from] BodyCaptureError),
    /// The call could not be turned into a request. No attempt was made.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    /// A header or other request part was malformed. No attempt was made.
    #[error("Invalid request: {0}")]
    Http(#[from] http::Error),
    /// Error from the underlying reqwest client
    #[error("Request error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Error from a custom [`HttpExecutor`](crate::HttpExecutor)
    #[error("Executor error: {0}")]
    Executor(#[from] anyhow::Error),
    /// The call's cancellation signal tripped before a retry could be made.
    #[error("Call canceled: {0}")]
    Canceled(CancelCause),
}

/// Reading a body into memory for replay failed.
#[derive(Error, Debug)]
pub enum BodyCaptureError {
    /// The body of a pre-built request passed to [`Client::execute`](crate::Client::execute).
    #[error("failed to read request body: {0}")]
    Request(#[source] reqwest::Error),
    /// The body passed to [`Client::post`](crate::Client::post).
    #[error("failed to read body: {0}")]
    Body(#[source] reqwest::Error),
    /// The payload passed to [`Client::post_form`](crate::Client::post_form).
    #[error("failed to encode form: {0}")]
    Form(#[from] serde_urlencoded::ser::Error),
}

impl Error {
    pub fn executor<E>(err: E) -> Self
    where
        E: 'static + Send + Sync + std::error::Error,
    {
        Error::Executor(err.into())
    }

    /// Returns a possible URL related to this error.
    pub fn url(&self) -> Option<&Url> {
        match self {
            Error::Reqwest(e) => e.url(),
            _ => None,
        }
    }

    /// Returns true if the executor failed to produce a response.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Reqwest(_) | Error::Executor(_))
    }

    /// Returns true if no attempt was made because a body could not be buffered.
    pub fn is_body_capture(&self) -> bool {
        matches!(self, Error::BodyCapture(_))
    }

    /// Returns true if the call stopped because its cancellation signal tripped.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Canceled(_))
    }

    /// Returns true if the error is related to a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Reqwest(e) => e.is_timeout(),
            Error::Canceled(cause) => *cause == CancelCause::DeadlineExceeded,
            _ => false,
        }
    }

    /// Returns true if the error is related to connect
    pub fn is_connect(&self) -> bool {
        match self {
            Error::Reqwest(e) => e.is_connect(),
            _ => false,
        }
    }

    /// Returns the status code, if the error was generated from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Reqwest(e) => e.status(),
            _ => None,
        }
    }
}
