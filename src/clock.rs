//! Timestamps used for expiry deadlines and LRU touch times.
//!
//! All timestamps are absolute nanoseconds on a process-wide monotonic clock.
//! Callers compute deadlines from the same clock the table reads, either
//! [`now`] or the value returned by their [`Ops::now`] override.
//!
//! [`Ops::now`]: crate::ops::Ops::now

use std::sync::OnceLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::Relaxed;
use std::time::Duration;
use std::time::Instant;

/// Absolute nanoseconds on the table clock.
pub type Timestamp = u64;

static ANCHOR: OnceLock<Instant> = OnceLock::new();

/// Returns the current process-wide monotonic time.
#[inline]
pub fn now() -> Timestamp {
  let anchor: Instant = *ANCHOR.get_or_init(Instant::now);

  // Saturates after ~584 years of uptime.
  u64::try_from(anchor.elapsed().as_nanos()).unwrap_or(u64::MAX)
}

/// Returns the deadline `ttl` from now.
#[inline]
pub fn deadline(ttl: Duration) -> Timestamp {
  let ttl: u64 = u64::try_from(ttl.as_nanos()).unwrap_or(u64::MAX);
  now().saturating_add(ttl)
}

/// A clock that only moves when told to.
///
/// Useful for deterministic expiry in tests and simulations; share it between
/// an [`Ops`] implementation and the code computing deadlines.
///
/// [`Ops`]: crate::ops::Ops
#[derive(Debug, Default)]
pub struct ManualClock {
  ticks: AtomicU64,
}

impl ManualClock {
  #[inline]
  pub const fn new(start: Timestamp) -> Self {
    Self {
      ticks: AtomicU64::new(start),
    }
  }

  #[inline]
  pub fn now(&self) -> Timestamp {
    self.ticks.load(Relaxed)
  }

  #[inline]
  pub fn set(&self, value: Timestamp) {
    self.ticks.store(value, Relaxed);
  }

  /// Moves the clock forward and returns the new time.
  #[inline]
  pub fn advance(&self, delta: u64) -> Timestamp {
    self.ticks.fetch_add(delta, Relaxed).saturating_add(delta)
  }
}
