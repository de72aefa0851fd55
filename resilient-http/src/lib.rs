//! This crate provides [`Client`], a wrapper around an HTTP executor (by default
//! [`reqwest::Client`]) that retries failed attempts.
//!
//! Each call is buffered once, then attempted up to `max_attempts` times. Between
//! attempts the client waits for the configured [`Backoff`](resilient_retry::Backoff),
//! records the failure in its attempt log and checks the call's cancellation signal.
//!
//! ```
//! use resilient_http::ClientBuilder;
//! use resilient_retry::Linear;
//! use std::time::Duration;
//!
//! async fn run() -> resilient_http::Result<()> {
//!     let client = ClientBuilder::new(reqwest::Client::new())
//!         .max_attempts(4)
//!         .backoff(Linear::new(Duration::from_millis(200)))
//!         .keep_log(true)
//!         .build();
//!
//!     let resp = client.get("https://example.com").await?;
//!     println!("status {} after {} failed attempts", resp.status(), client.log_error_count());
//!     println!("{}", client.log_string());
//!     Ok(())
//! }
//! ```
//!
//! A response with a retryable status that survives every attempt is returned as
//! `Ok`; callers inspect the status themselves.
mod call;
mod client;
mod config;
mod error;
mod executor;
mod retry;

pub use call::{CallDescriptor, CallKind, CancelCause, CancelSignal};
pub use client::{execute, get, head, post, post_form, Client, ClientBuilder, IntoUrl};
pub use config::ClientConfig;
pub use error::{BodyCaptureError, Error, Result};
pub use executor::HttpExecutor;

pub use resilient_retry as policies;
