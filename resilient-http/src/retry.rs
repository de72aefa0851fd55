//! The attempt loop shared by every entry point of [`Client`](crate::Client).
use std::sync::Arc;

use http::header::{HeaderName, HeaderValue};
use reqwest::{Request, Response};
use resilient_retry::{
    effective_wait, AttemptFailure, AttemptLog, AttemptRecord, Backoff, Retryable, StatusPolicy,
};

use crate::call::{CallDescriptor, Snapshot};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::executor::HttpExecutor;

pub(crate) struct RetryLoop {
    executor: Arc<dyn HttpExecutor>,
    max_attempts: u32,
    backoff: Arc<dyn Backoff>,
    statuses: StatusPolicy,
    retry_header: Option<HeaderName>,
    log: AttemptLog,
}

impl RetryLoop {
    pub(crate) fn new(executor: Arc<dyn HttpExecutor>, config: ClientConfig) -> Self {
        Self {
            executor,
            max_attempts: config.attempts(),
            backoff: config.backoff,
            statuses: StatusPolicy::new(config.retry_on_429),
            retry_header: config.retry_header,
            log: AttemptLog::new(config.keep_log, config.log_hook),
        }
    }

    pub(crate) fn log(&self) -> &AttemptLog {
        &self.log
    }

    /// Runs `call` until it yields a terminal outcome, attempts run out, or its
    /// cancellation signal trips between attempts.
    ///
    /// The last response or error is returned verbatim: an exhausted call hands back
    /// the final `5xx` response rather than a synthesised error.
    pub(crate) async fn run(&self, call: CallDescriptor) -> Result<Response> {
        let CallDescriptor {
            kind,
            headers,
            cancel,
        } = call;
        let verb = kind.name();
        let snapshot = Snapshot::capture(kind, headers).await?;

        let mut attempt = 1;
        loop {
            let outcome = self.executor.execute(self.prepare(&snapshot, attempt)).await;

            let failure = match &outcome {
                Ok(response) => match self.statuses.classify(response.status()) {
                    Retryable::Terminal => return outcome,
                    Retryable::Transient => AttemptFailure::Status(response.status()),
                },
                Err(error) => AttemptFailure::Transport(error.to_string()),
            };
            self.log.record(AttemptRecord::new(
                verb,
                snapshot.method().clone(),
                snapshot.url().as_str(),
                attempt,
                failure,
            ));

            if attempt >= self.max_attempts {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    url = %snapshot.url(),
                    attempts = attempt,
                    "Giving up, attempts exhausted"
                );
                return outcome;
            }

            // Dropping the response releases its connection before we sleep.
            drop(outcome);

            if let Some(cause) = cancel.check() {
                #[cfg(feature = "tracing")]
                tracing::debug!(url = %snapshot.url(), attempt, %cause, "Call canceled before retry");
                return Err(Error::Canceled(cause));
            }

            let wait = effective_wait(self.backoff.as_ref(), attempt);
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "Retry attempt #{}. Sleeping {:?} before the next attempt",
                attempt,
                wait
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }

    fn prepare(&self, snapshot: &Snapshot, attempt: u32) -> Request {
        let mut req = snapshot.request();
        if let Some(name) = &self.retry_header {
            if attempt > 1 {
                req.headers_mut()
                    .insert(name.clone(), HeaderValue::from(attempt - 1));
            }
        }
        req
    }
}
