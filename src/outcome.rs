//! Values returned by table operations.

use core::fmt::Display;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;

use crate::clock::Timestamp;
use crate::strategy::Strategy;

// -----------------------------------------------------------------------------
// Insert
// -----------------------------------------------------------------------------

/// The result of [`Table::insert`].
///
/// Only [`New`](Self::New) hands ownership of the record to the table. On
/// [`Occupy`](Self::Occupy) the record's contents were copied into an existing
/// slot, and on [`Failed`](Self::Failed) nothing was stored; either way the
/// caller gets the record back and is responsible for reclaiming it.
///
/// [`Table::insert`]: crate::table::Table::insert
#[must_use = "a record returned by `insert` must be reclaimed by the caller"]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Insert<R> {
  /// The record was adopted by a previously empty slot.
  New,
  /// An existing slot (same key, expired, or evicted) was overwritten.
  Occupy(R),
  /// The probe window was full of live entries for other keys.
  Failed(R),
}

impl<R> Insert<R> {
  #[inline]
  pub const fn is_new(&self) -> bool {
    matches!(self, Self::New)
  }

  #[inline]
  pub const fn is_occupy(&self) -> bool {
    matches!(self, Self::Occupy(_))
  }

  #[inline]
  pub const fn is_failed(&self) -> bool {
    matches!(self, Self::Failed(_))
  }

  /// Returns the record that the table did not adopt, if any.
  #[inline]
  pub fn into_record(self) -> Option<R> {
    match self {
      Self::New => None,
      Self::Occupy(record) | Self::Failed(record) => Some(record),
    }
  }

  #[inline]
  pub const fn name(&self) -> &'static str {
    match self {
      Self::New => "new",
      Self::Occupy(_) => "occupy",
      Self::Failed(_) => "failed",
    }
  }
}

// -----------------------------------------------------------------------------
// Found
// -----------------------------------------------------------------------------

/// A value copied out of the table.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Found<V> {
  pub value: V,
  /// The expiry deadline, or for LRU tables the refreshed touch time.
  pub stamp: Timestamp,
}

// -----------------------------------------------------------------------------
// Counters
// -----------------------------------------------------------------------------

/// A snapshot of the cumulative insert counters.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Counters {
  /// Inserts that returned [`Insert::Failed`].
  pub failed: u64,
  /// Occupied buckets skipped while probing on insert.
  pub collision: u64,
}

// -----------------------------------------------------------------------------
// Assessment
// -----------------------------------------------------------------------------

/// A point-in-time health report produced by [`Table::assess`].
///
/// Slot counts are gathered without a global lock and may be slightly
/// inconsistent under concurrent writes.
///
/// [`Table::assess`]: crate::table::Table::assess
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assessment {
  pub strategy: Strategy,
  pub capacity: usize,
  pub buckets: usize,
  pub probe_length: usize,
  /// Slots holding an entry, expired or not.
  pub in_use: usize,
  pub available: usize,
  /// In-use slots whose deadline has passed. Always zero for LRU tables.
  pub expired: usize,
  pub failed: u64,
  pub collision: u64,
  /// Bytes owned by the table itself, excluding out-of-line record storage.
  pub memory: usize,
}

impl Assessment {
  /// Fraction of buckets holding an entry.
  #[inline]
  pub fn usage(&self) -> f64 {
    ratio(self.in_use, self.buckets)
  }

  /// Fraction of buckets holding an unexpired entry.
  #[inline]
  pub fn live_usage(&self) -> f64 {
    ratio(self.in_use - self.expired, self.buckets)
  }

  /// Fraction of in-use slots that have expired.
  #[inline]
  pub fn expired_ratio(&self) -> f64 {
    ratio(self.expired, self.in_use)
  }
}

impl Display for Assessment {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(
      f,
      "{} table: capacity={} buckets={} probe={} in_use={} ({:.2}%) available={} expired={} ({:.2}%) failed={} collision={} memory={}B",
      self.strategy,
      self.capacity,
      self.buckets,
      self.probe_length,
      self.in_use,
      self.usage() * 100.0,
      self.available,
      self.expired,
      self.expired_ratio() * 100.0,
      self.failed,
      self.collision,
      self.memory,
    )
  }
}

#[expect(clippy::cast_precision_loss, reason = "ratios are informational")]
#[inline]
fn ratio(numerator: usize, denominator: usize) -> f64 {
  if denominator == 0 {
    0.0
  } else {
    numerator as f64 / denominator as f64
  }
}
