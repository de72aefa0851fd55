use http::header::HeaderName;
use http::HeaderValue;
use reqwest::{Body, Request, Response, Url};
use resilient_retry::{AttemptRecord, Backoff};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::call::{CallDescriptor, CallKind};
use crate::config::ClientConfig;
use crate::error::{BodyCaptureError, Error, Result};
use crate::executor::HttpExecutor;
use crate::retry::RetryLoop;

/// Conversion into a [`Url`], failing with [`Error::Url`](crate::Error::Url).
pub trait IntoUrl {
    fn into_url(self) -> Result<Url>;
}

impl IntoUrl for Url {
    fn into_url(self) -> Result<Url> {
        Ok(self)
    }
}

impl IntoUrl for &str {
    fn into_url(self) -> Result<Url> {
        Ok(Url::parse(self)?)
    }
}

impl IntoUrl for &String {
    fn into_url(self) -> Result<Url> {
        self.as_str().into_url()
    }
}

impl IntoUrl for String {
    fn into_url(self) -> Result<Url> {
        self.as_str().into_url()
    }
}

/// A `ClientBuilder` is used to build a [`Client`].
///
/// ```
/// use resilient_http::ClientBuilder;
/// use resilient_retry::Exponential;
/// use std::time::Duration;
///
/// let client = ClientBuilder::new(reqwest::Client::new())
///     .max_attempts(5)
///     .backoff(Exponential::new(Duration::from_millis(50)).jittered())
///     .retry_on_429(true)
///     .keep_log(true)
///     .build();
/// ```
pub struct ClientBuilder {
    executor: Arc<dyn HttpExecutor>,
    config: ClientConfig,
}

impl ClientBuilder {
    /// Wraps a pre-configured executor, typically a [`reqwest::Client`].
    pub fn new<E>(executor: E) -> Self
    where
        E: HttpExecutor,
    {
        Self::from_arc(Arc::new(executor))
    }

    /// Like [`new`](Self::new), for an executor that is shared elsewhere.
    pub fn from_arc(executor: Arc<dyn HttpExecutor>) -> Self {
        ClientBuilder {
            executor,
            config: ClientConfig::default(),
        }
    }

    /// Replaces every retry setting at once.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Total attempts per call, including the first. `0` is treated as `1`.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.max_attempts = max_attempts;
        self
    }

    pub fn backoff<B>(mut self, backoff: B) -> Self
    where
        B: Backoff + 'static,
    {
        self.config.backoff = Arc::new(backoff);
        self
    }

    pub fn retry_on_429(mut self, retry: bool) -> Self {
        self.config.retry_on_429 = retry;
        self
    }

    /// Sends `name: <previous attempts>` on every attempt after the first.
    pub fn retry_header(mut self, name: HeaderName) -> Self {
        self.config.retry_header = Some(name);
        self
    }

    /// Keeps failed attempts in memory, see [`Client::log_string`].
    pub fn keep_log(mut self, keep: bool) -> Self {
        self.config.keep_log = keep;
        self
    }

    /// Forwards failed attempts to `hook` instead of keeping them.
    ///
    /// Ignored when [`keep_log`](Self::keep_log) is set.
    pub fn log_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&AttemptRecord) + Send + Sync + 'static,
    {
        self.config.log_hook = Some(Arc::new(hook));
        self
    }

    /// Returns a `Client` using this builder configuration.
    pub fn build(self) -> Client {
        Client {
            inner: Arc::new(RetryLoop::new(self.executor, self.config)),
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        ClientBuilder::new(reqwest::Client::new())
    }
}

/// An HTTP client that retries failed attempts.
///
/// A 5xx response (and 429, when enabled) or a transport error counts as a failed
/// attempt. Bodies are buffered before the first attempt and replayed on every
/// retry. Cloning is cheap and clones share the retained attempt log.
#[derive(Clone)]
pub struct Client {
    inner: Arc<RetryLoop>,
}

impl Client {
    /// A client over a fresh [`reqwest::Client`] with the default [`ClientConfig`].
    pub fn new() -> Self {
        ClientBuilder::default().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Runs a call described by a [`CallDescriptor`], which is the way to attach a
    /// cancellation token or deadline.
    pub async fn call(&self, call: impl Into<CallDescriptor>) -> Result<Response> {
        self.inner.run(call.into()).await
    }

    /// Executes a pre-built `Request`, retrying it with its body replayed.
    ///
    /// # Errors
    ///
    /// Fails without sending anything if the request body cannot be read. Otherwise
    /// the error of the last attempt is returned.
    pub async fn execute(&self, req: Request) -> Result<Response> {
        self.call(CallKind::Execute(req)).await
    }

    /// Convenience method to make a `GET` request to a URL.
    pub async fn get<U: IntoUrl>(&self, url: U) -> Result<Response> {
        self.call(CallKind::Get(url.into_url()?)).await
    }

    /// Convenience method to make a `HEAD` request to a URL.
    pub async fn head<U: IntoUrl>(&self, url: U) -> Result<Response> {
        self.call(CallKind::Head(url.into_url()?)).await
    }

    /// Convenience method to `POST` a body with the given content type.
    ///
    /// Streaming bodies are read to the end before the first attempt.
    pub async fn post<U, V, B>(&self, url: U, content_type: V, body: B) -> Result<Response>
    where
        U: IntoUrl,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
        B: Into<Body>,
    {
        let url = url.into_url()?;
        let content_type =
            HeaderValue::try_from(content_type).map_err(|e| Error::Http(e.into()))?;
        self.call(CallKind::Post {
            url,
            content_type,
            body: body.into(),
        })
        .await
    }

    /// Convenience method to `POST` a url encoded form.
    ///
    /// ```rust
    /// # async fn run() -> resilient_http::Result<()> {
    /// let client = resilient_http::Client::new();
    /// let res = client
    ///     .post_form("http://httpbin.org/post", &[("lang", "rust")])
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn post_form<U, T>(&self, url: U, form: &T) -> Result<Response>
    where
        U: IntoUrl,
        T: Serialize + ?Sized,
    {
        let url = url.into_url()?;
        let form = serde_urlencoded::to_string(form).map_err(BodyCaptureError::Form)?;
        self.call(CallKind::PostForm { url, form }).await
    }

    /// Failed attempts kept so far, oldest first. Empty unless `keep_log` is set.
    pub fn attempt_records(&self) -> Vec<AttemptRecord> {
        self.inner.log().records()
    }

    /// Number of failed attempts kept so far.
    pub fn log_error_count(&self) -> usize {
        self.inner.log().len()
    }

    /// The kept attempts, one per line:
    /// `<unix-ts> <verb> [<method>] <url> attempt-<n> error: <message>`.
    pub fn log_string(&self) -> String {
        self.inner.log().export()
    }
}

impl Default for Client {
    fn default() -> Self {
        Client::new()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // skipping the executor and backoff, neither is Debug
        f.debug_struct("Client")
            .field("log", self.inner.log())
            .finish_non_exhaustive()
    }
}

/// One-shot [`Client::execute`] with a default client.
pub async fn execute(req: Request) -> Result<Response> {
    Client::new().execute(req).await
}

/// One-shot [`Client::get`] with a default client.
pub async fn get<U: IntoUrl>(url: U) -> Result<Response> {
    Client::new().get(url).await
}

/// One-shot [`Client::head`] with a default client.
pub async fn head<U: IntoUrl>(url: U) -> Result<Response> {
    Client::new().head(url).await
}

/// One-shot [`Client::post`] with a default client.
pub async fn post<U, V, B>(url: U, content_type: V, body: B) -> Result<Response>
where
    U: IntoUrl,
    HeaderValue: TryFrom<V>,
    <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    B: Into<Body>,
{
    Client::new().post(url, content_type, body).await
}

/// One-shot [`Client::post_form`] with a default client.
pub async fn post_form<U, T>(url: U, form: &T) -> Result<Response>
where
    U: IntoUrl,
    T: Serialize + ?Sized,
{
    Client::new().post_form(url, form).await
}

mod service {
    use std::{
        future::Future,
        pin::Pin,
        task::{Context, Poll},
    };

    use crate::Result;
    use reqwest::{Request, Response};

    use crate::Client;

    type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

    // this is meant to be semi-private, same as reqwest's pending
    pub struct Pending {
        inner: BoxFuture<'static, Result<Response>>,
    }

    impl Unpin for Pending {}

    impl Future for Pending {
        type Output = Result<Response>;

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
            self.inner.as_mut().poll(cx)
        }
    }

    impl tower_service::Service<Request> for Client {
        type Response = Response;
        type Error = crate::Error;
        type Future = Pending;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request) -> Self::Future {
            let client = self.clone();
            Pending {
                inner: Box::pin(async move { client.execute(req).await }),
            }
        }
    }
}
