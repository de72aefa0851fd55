use reqwest::{Request, Response};

use crate::error::{Error, Result};

/// The transport a [`Client`](crate::Client) sends each attempt through.
///
/// Connection pooling, TLS, proxies and DNS are all the executor's concern; the
/// client only needs a way to turn a request into a response or an error.
/// [`reqwest::Client`] is the default executor.
///
/// # Example
///
/// ```
/// use reqwest::{Request, Response};
/// use resilient_http::{ClientBuilder, HttpExecutor, Result};
///
/// struct AlwaysOk;
///
/// #[async_trait::async_trait]
/// impl HttpExecutor for AlwaysOk {
///     async fn execute(&self, _req: Request) -> Result<Response> {
///         Ok(Response::from(http::Response::new("")))
///     }
/// }
///
/// let client = ClientBuilder::new(AlwaysOk).max_attempts(1).build();
/// ```
#[async_trait::async_trait]
pub trait HttpExecutor: 'static + Send + Sync {
    /// Performs a single attempt. Errors returned here are transport failures and
    /// are retried.
    async fn execute(&self, req: Request) -> Result<Response>;
}

#[async_trait::async_trait]
impl HttpExecutor for reqwest::Client {
    async fn execute(&self, req: Request) -> Result<Response> {
        reqwest::Client::execute(self, req)
            .await
            .map_err(Error::from)
    }
}
