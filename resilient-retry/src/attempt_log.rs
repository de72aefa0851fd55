use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use http::{Method, StatusCode};

/// Callback invoked synchronously for every failed attempt.
///
/// The hook runs on the task making the call, so a slow hook delays that call. Hooks
/// may run concurrently when the client is shared; any state they touch must be
/// synchronised by the caller.
pub type LogHook = Arc<dyn Fn(&AttemptRecord) + Send + Sync>;

/// Why a single attempt did not produce a usable response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// The executor returned no response at all.
    Transport(String),
    /// A response arrived with a status that is retried.
    Status(StatusCode),
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Transport(message) => f.write_str(message),
            AttemptFailure::Status(status) => write!(f, "unsuccessful status {}", status),
        }
    }
}

/// One failed attempt. Immutable once created.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    time: SystemTime,
    verb: &'static str,
    method: Method,
    url: String,
    attempt: u32,
    failure: AttemptFailure,
}

impl AttemptRecord {
    pub fn new(
        verb: &'static str,
        method: Method,
        url: impl Into<String>,
        attempt: u32,
        failure: AttemptFailure,
    ) -> Self {
        Self {
            time: SystemTime::now(),
            verb,
            method,
            url: url.into(),
            attempt,
            failure,
        }
    }

    pub fn time(&self) -> SystemTime {
        self.time
    }

    /// Seconds since the unix epoch at which the attempt failed.
    pub fn unix_timestamp(&self) -> u64 {
        self.time
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0)
    }

    /// Name of the client entry point that made the call, e.g. `post_form`.
    pub fn verb(&self) -> &'static str {
        self.verb
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 1-based index of the attempt.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn failure(&self) -> &AttemptFailure {
        &self.failure
    }
}

/// `<unix-ts> <verb> [<method>] <url> attempt-<n> error: <message>`
impl fmt::Display for AttemptRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}] {} attempt-{} error: {}",
            self.unix_timestamp(),
            self.verb,
            self.method,
            self.url,
            self.attempt,
            self.failure
        )
    }
}

/// Destination for [`AttemptRecord`]s.
///
/// Retention wins over the hook when both are requested in [`AttemptLog::new`].
/// Without either, records are dropped.
#[derive(Default)]
pub enum AttemptLog {
    #[default]
    Discard,
    Retained(Mutex<Vec<AttemptRecord>>),
    Hook(LogHook),
}

impl AttemptLog {
    pub fn new(keep: bool, hook: Option<LogHook>) -> Self {
        match (keep, hook) {
            (true, _) => AttemptLog::Retained(Mutex::new(Vec::new())),
            (false, Some(hook)) => AttemptLog::Hook(hook),
            (false, None) => AttemptLog::Discard,
        }
    }

    pub fn record(&self, entry: AttemptRecord) {
        match self {
            AttemptLog::Discard => {}
            AttemptLog::Retained(entries) => lock(entries).push(entry),
            AttemptLog::Hook(hook) => hook(&entry),
        }
    }

    pub fn is_retained(&self) -> bool {
        matches!(self, AttemptLog::Retained(_))
    }

    /// Snapshot of the retained records in insertion order.
    pub fn records(&self) -> Vec<AttemptRecord> {
        match self {
            AttemptLog::Retained(entries) => lock(entries).clone(),
            _ => Vec::new(),
        }
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        match self {
            AttemptLog::Retained(entries) => lock(entries).len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the retained records one per line, oldest first.
    pub fn export(&self) -> String {
        match self {
            AttemptLog::Retained(entries) => lock(entries)
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
            _ => String::new(),
        }
    }
}

impl fmt::Debug for AttemptLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptLog::Discard => f.write_str("Discard"),
            AttemptLog::Retained(_) => f.debug_tuple("Retained").field(&self.len()).finish(),
            AttemptLog::Hook(_) => f.write_str("Hook"),
        }
    }
}

// A panicking hook elsewhere must not take the retained log down with it.
fn lock(entries: &Mutex<Vec<AttemptRecord>>) -> MutexGuard<'_, Vec<AttemptRecord>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}
