//! Call descriptors: what a single call through the [`Client`](crate::Client) carries.
use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use http_body_util::BodyExt;
use reqwest::{Body, Method, Request, Url, Version};
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{BodyCaptureError, Result};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// The shape of a call. Each variant carries only what its entry point needs.
pub enum CallKind {
    /// A pre-built request, sent as is.
    Execute(Request),
    Get(Url),
    Head(Url),
    /// A `POST` with an arbitrary, possibly streaming, body.
    Post {
        url: Url,
        content_type: HeaderValue,
        body: Body,
    },
    /// A `POST` with an already url-encoded form payload.
    PostForm { url: Url, form: String },
}

impl CallKind {
    /// Name of the entry point, as it appears in attempt logs.
    pub fn name(&self) -> &'static str {
        match self {
            CallKind::Execute(_) => "execute",
            CallKind::Get(_) => "get",
            CallKind::Head(_) => "head",
            CallKind::Post { .. } => "post",
            CallKind::PostForm { .. } => "post_form",
        }
    }
}

impl fmt::Debug for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallKind::Execute(req) => f.debug_tuple("Execute").field(req).finish(),
            CallKind::Get(url) => f.debug_tuple("Get").field(&url.as_str()).finish(),
            CallKind::Head(url) => f.debug_tuple("Head").field(&url.as_str()).finish(),
            CallKind::Post {
                url, content_type, ..
            } => f
                .debug_struct("Post")
                .field("url", &url.as_str())
                .field("content_type", content_type)
                .finish_non_exhaustive(),
            CallKind::PostForm { url, .. } => f
                .debug_struct("PostForm")
                .field("url", &url.as_str())
                .finish_non_exhaustive(),
        }
    }
}

/// Why a call stopped before its next attempt.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    #[error("canceled")]
    Canceled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// An optional cancellation token and an optional deadline.
///
/// The signal is only consulted between attempts, right before the backoff wait.
/// An attempt already in flight is not interrupted; set a timeout on the
/// executor for that.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl CancelSignal {
    pub fn token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns the cause if the signal has tripped.
    pub fn check(&self) -> Option<CancelCause> {
        if self.token.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Some(CancelCause::Canceled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(CancelCause::DeadlineExceeded),
            _ => None,
        }
    }
}

/// A call handed to the retry loop: its [`CallKind`], extra headers and
/// cancellation signal.
///
/// ```
/// use resilient_http::{CallDescriptor, CallKind};
/// use tokio_util::sync::CancellationToken;
///
/// let token = CancellationToken::new();
/// let url = "http://localhost:8080/jobs".parse().unwrap();
/// let call = CallDescriptor::new(CallKind::Get(url))
///     .header(http::header::ACCEPT, http::HeaderValue::from_static("application/json"))
///     .cancel_on(token.clone());
/// ```
#[derive(Debug)]
#[must_use = "a CallDescriptor does nothing until passed to Client::call"]
pub struct CallDescriptor {
    pub(crate) kind: CallKind,
    pub(crate) headers: HeaderMap,
    pub(crate) cancel: CancelSignal,
}

impl CallDescriptor {
    pub fn new(kind: CallKind) -> Self {
        Self {
            kind,
            headers: HeaderMap::new(),
            cancel: CancelSignal::default(),
        }
    }

    pub fn kind(&self) -> &CallKind {
        &self.kind
    }

    /// Adds a header sent on every attempt, replacing any value the call already has.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Stops retrying once `token` is cancelled.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = self.cancel.token(token);
        self
    }

    /// Stops retrying once `deadline` has passed.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.cancel = self.cancel.deadline(deadline);
        self
    }

    /// Stops retrying once `timeout` has elapsed from now.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.deadline(Instant::now() + timeout)
    }

    pub fn cancel_signal(&self) -> &CancelSignal {
        &self.cancel
    }
}

impl From<CallKind> for CallDescriptor {
    fn from(kind: CallKind) -> Self {
        CallDescriptor::new(kind)
    }
}

impl From<Request> for CallDescriptor {
    fn from(req: Request) -> Self {
        CallDescriptor::new(CallKind::Execute(req))
    }
}

/// Everything needed to rebuild the request of a call, with its body held in memory.
#[derive(Debug)]
pub(crate) struct Snapshot {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
    timeout: Option<Duration>,
    version: Version,
}

impl Snapshot {
    /// Reads the body of `kind` exactly once.
    pub(crate) async fn capture(kind: CallKind, extra: HeaderMap) -> Result<Self> {
        let mut snapshot = match kind {
            CallKind::Execute(mut req) => {
                let body = match req.body_mut().take() {
                    Some(body) => Some(buffer(body).await.map_err(BodyCaptureError::Request)?),
                    None => None,
                };
                Snapshot {
                    method: req.method().clone(),
                    url: req.url().clone(),
                    headers: std::mem::take(req.headers_mut()),
                    body,
                    timeout: req.timeout().copied(),
                    version: req.version(),
                }
            }
            CallKind::Get(url) => Snapshot::bare(Method::GET, url),
            CallKind::Head(url) => Snapshot::bare(Method::HEAD, url),
            CallKind::Post {
                url,
                content_type,
                body,
            } => {
                let mut snapshot = Snapshot::bare(Method::POST, url);
                snapshot.headers.insert(CONTENT_TYPE, content_type);
                snapshot.body = Some(buffer(body).await.map_err(BodyCaptureError::Body)?);
                snapshot
            }
            CallKind::PostForm { url, form } => {
                let mut snapshot = Snapshot::bare(Method::POST, url);
                snapshot
                    .headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
                snapshot.body = Some(Bytes::from(form));
                snapshot
            }
        };
        snapshot.headers.extend(extra);
        Ok(snapshot)
    }

    fn bare(method: Method, url: Url) -> Self {
        Snapshot {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
            version: Version::default(),
        }
    }

    pub(crate) fn method(&self) -> &Method {
        &self.method
    }

    pub(crate) fn url(&self) -> &Url {
        &self.url
    }

    /// A fresh request replaying the captured body.
    pub(crate) fn request(&self) -> Request {
        let mut req = Request::new(self.method.clone(), self.url.clone());
        *req.headers_mut() = self.headers.clone();
        *req.timeout_mut() = self.timeout;
        *req.version_mut() = self.version;
        // Bytes clones share the buffer, so replay does not copy the payload.
        *req.body_mut() = self.body.clone().map(Body::from);
        req
    }
}

async fn buffer(body: Body) -> reqwest::Result<Bytes> {
    if let Some(bytes) = body.as_bytes() {
        return Ok(Bytes::copy_from_slice(bytes));
    }
    Ok(body.collect().await?.to_bytes())
}
