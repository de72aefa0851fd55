//! Backoff strategies: how long to wait after attempt `n` failed.
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Smallest wait the attempt loop will ever sleep for, before [`WAIT_EPSILON`] is added.
pub const MIN_WAIT: Duration = Duration::from_millis(1);

/// Added to every wait so that a timer is never armed with a zero duration.
pub const WAIT_EPSILON: Duration = Duration::from_micros(1);

const DEFAULT_UNIT: Duration = Duration::from_secs(1);

/// A strategy computing the wait before the next attempt.
///
/// `attempt` is the 1-based index of the attempt that just failed. Implementations
/// must not perform I/O; they are called on the request path between attempts.
///
/// Any `Fn(u32) -> Duration` closure is a `Backoff`, which is the way to plug in a
/// custom strategy:
///
/// ```
/// use resilient_retry::Backoff;
/// use std::time::Duration;
///
/// let quadratic = |attempt: u32| Duration::from_millis(10 * u64::from(attempt * attempt));
/// assert_eq!(quadratic.delay(3), Duration::from_millis(90));
/// ```
pub trait Backoff: Send + Sync {
    fn delay(&self, attempt: u32) -> Duration;
}

impl<F> Backoff for F
where
    F: Fn(u32) -> Duration + Send + Sync,
{
    fn delay(&self, attempt: u32) -> Duration {
        (self)(attempt)
    }
}

/// The wait the attempt loop actually sleeps for after `attempt` failed.
///
/// A zero delay returned by a custom strategy is raised to [`MIN_WAIT`] so that a
/// misbehaving strategy cannot turn the loop into a busy loop. A delay of
/// [`Duration::MAX`] stays at `Duration::MAX`.
pub fn effective_wait<B: Backoff + ?Sized>(backoff: &B, attempt: u32) -> Duration {
    backoff
        .delay(attempt)
        .max(MIN_WAIT)
        .saturating_add(WAIT_EPSILON)
}

/// Waits the same amount of time after every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixed {
    wait: Duration,
}

impl Fixed {
    pub fn new(wait: Duration) -> Self {
        Self { wait }
    }
}

impl Default for Fixed {
    fn default() -> Self {
        Self::new(DEFAULT_UNIT)
    }
}

impl Backoff for Fixed {
    fn delay(&self, _attempt: u32) -> Duration {
        self.wait
    }
}

/// Waits `attempt * unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Linear {
    unit: Duration,
}

impl Linear {
    pub fn new(unit: Duration) -> Self {
        Self { unit }
    }

    /// Wraps this strategy in [`Jittered`] with an entropy-seeded generator.
    pub fn jittered(self) -> Jittered<Self> {
        Jittered::new(self)
    }
}

impl Default for Linear {
    fn default() -> Self {
        Self::new(DEFAULT_UNIT)
    }
}

impl Backoff for Linear {
    fn delay(&self, attempt: u32) -> Duration {
        self.unit.saturating_mul(attempt)
    }
}

/// Waits `2^attempt * unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exponential {
    unit: Duration,
}

impl Exponential {
    pub fn new(unit: Duration) -> Self {
        Self { unit }
    }

    /// Wraps this strategy in [`Jittered`] with an entropy-seeded generator.
    pub fn jittered(self) -> Jittered<Self> {
        Jittered::new(self)
    }
}

impl Default for Exponential {
    fn default() -> Self {
        Self::new(DEFAULT_UNIT)
    }
}

impl Backoff for Exponential {
    fn delay(&self, attempt: u32) -> Duration {
        self.unit.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Perturbs the delay of an inner strategy by a uniformly random amount of up to
/// a third of its value in either direction.
///
/// Jitter is computed at millisecond granularity and the result is floored at one
/// millisecond. The random generator is owned by the strategy, so two clients never
/// share hidden random state and tests can supply a seeded generator through
/// [`Jittered::with_rng`].
#[derive(Debug)]
pub struct Jittered<B, R = StdRng> {
    inner: B,
    rng: Mutex<R>,
}

impl<B: Backoff> Jittered<B> {
    pub fn new(inner: B) -> Self {
        Self::with_rng(inner, StdRng::from_entropy())
    }
}

impl<B: Backoff, R: Rng + Send> Jittered<B, R> {
    pub fn with_rng(inner: B, rng: R) -> Self {
        Self {
            inner,
            rng: Mutex::new(rng),
        }
    }
}

impl<B: Backoff, R: Rng + Send> Backoff for Jittered<B, R> {
    fn delay(&self, attempt: u32) -> Duration {
        let base = u64::try_from(self.inner.delay(attempt).as_millis()).unwrap_or(u64::MAX);
        let max_jitter = base / 3;

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let millis = rng.gen_range(base - max_jitter..=base.saturating_add(max_jitter));

        Duration::from_millis(millis.max(1))
    }
}
