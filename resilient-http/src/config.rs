use std::fmt;
use std::sync::Arc;

use http::HeaderName;
use resilient_retry::{Backoff, Fixed, LogHook};

/// Retry settings owned by one [`Client`](crate::Client).
///
/// Usually filled in through [`ClientBuilder`](crate::ClientBuilder); constructing it
/// directly is handy when the settings come from somewhere else.
#[derive(Clone)]
pub struct ClientConfig {
    /// Total number of attempts per call, including the first. `0` is treated as `1`.
    pub max_attempts: u32,
    /// Wait between attempts.
    pub backoff: Arc<dyn Backoff>,
    /// Retry `429 Too Many Requests` like a server error.
    pub retry_on_429: bool,
    /// When set, attempts after the first carry this header with the number of
    /// previous attempts as its value.
    pub retry_header: Option<HeaderName>,
    /// Keep every failed attempt in memory. Takes priority over `log_hook`.
    pub keep_log: bool,
    /// Called for every failed attempt when `keep_log` is off.
    pub log_hook: Option<LogHook>,
}

impl ClientConfig {
    pub(crate) fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Arc::new(Fixed::default()),
            retry_on_429: false,
            retry_header: None,
            keep_log: false,
            log_hook: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // skipping backoff and log_hook, neither is Debug
        f.debug_struct("ClientConfig")
            .field("max_attempts", &self.max_attempts)
            .field("retry_on_429", &self.retry_on_429)
            .field("retry_header", &self.retry_header)
            .field("keep_log", &self.keep_log)
            .field("log_hook", &self.log_hook.is_some())
            .finish_non_exhaustive()
    }
}
