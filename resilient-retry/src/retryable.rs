use http::StatusCode;

/// Classification of the outcome of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retryable {
    /// The failure might resolve on a later attempt.
    Transient,
    /// The outcome is handed back to the caller as is.
    Terminal,
}

impl Retryable {
    /// Transport failures (no response at all) are always worth another attempt.
    pub fn from_transport_failure() -> Self {
        Retryable::Transient
    }
}

/// Decides which response statuses are retried.
///
/// Every status below 500 is terminal except `429 Too Many Requests`, which is
/// retried only when [`StatusPolicy::retry_on_429`] is set. Everything from 500 up
/// is transient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusPolicy {
    pub retry_on_429: bool,
}

impl StatusPolicy {
    pub fn new(retry_on_429: bool) -> Self {
        Self { retry_on_429 }
    }

    pub fn classify(&self, status: StatusCode) -> Retryable {
        if status.as_u16() < 500
            && (status != StatusCode::TOO_MANY_REQUESTS || !self.retry_on_429)
        {
            Retryable::Terminal
        } else {
            Retryable::Transient
        }
    }

    pub fn is_retryable(&self, status: StatusCode) -> bool {
        self.classify(status) == Retryable::Transient
    }
}
