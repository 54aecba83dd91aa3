//! Bucket slots.

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;

use crate::clock::Timestamp;
use crate::sync::RwLock;
use crate::sync::RwLockReadGuard;
use crate::sync::RwLockWriteGuard;
use crate::sync::atomic::AtomicU8;
use crate::sync::atomic::AtomicU64;
use crate::sync::atomic::Ordering::Acquire;
use crate::sync::atomic::Ordering::Relaxed;
use crate::sync::atomic::Ordering::Release;

// -----------------------------------------------------------------------------
// Slot Status
// -----------------------------------------------------------------------------

/// Lifecycle of a slot.
///
/// `Available -> Initializing -> InUse`, never backwards. The transition
/// happens entirely under the slot's write lock, so lock holders only ever
/// observe `Available` or `InUse`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Status {
  Available = 0,
  Initializing = 1,
  InUse = 2,
}

impl Status {
  #[inline]
  const fn from_u8(value: u8) -> Self {
    match value {
      0 => Self::Available,
      1 => Self::Initializing,
      _ => Self::InUse,
    }
  }
}

// -----------------------------------------------------------------------------
// Slot
// -----------------------------------------------------------------------------

/// One bucket of the table.
///
/// `record` is `None` exactly while `status` is `Available`.
pub(crate) struct Slot<R> {
  status: AtomicU8,
  /// Expiry deadline or last touch time, depending on the strategy.
  stamp: AtomicU64,
  record: RwLock<Option<R>>,
}

impl<R> Slot<R> {
  #[inline]
  pub(crate) fn new() -> Self {
    Self {
      status: AtomicU8::new(Status::Available as u8),
      stamp: AtomicU64::new(0),
      record: RwLock::new(None),
    }
  }

  /// Lock-free status snapshot.
  ///
  /// Only `Available` is authoritative: a slot never leaves `InUse`, so an
  /// `Available` snapshot can be skipped without locking.
  #[inline]
  pub(crate) fn status(&self) -> Status {
    Status::from_u8(self.status.load(Acquire))
  }

  #[inline]
  pub(crate) fn is_available(&self) -> bool {
    self.status() == Status::Available
  }

  /// Reads the timestamp. Callers hold either lock of this slot, except for
  /// LRU scans which tolerate a stale read.
  #[inline]
  pub(crate) fn stamp(&self) -> Timestamp {
    self.stamp.load(Relaxed)
  }

  #[inline]
  pub(crate) fn set_stamp(&self, stamp: Timestamp) {
    self.stamp.store(stamp, Relaxed);
  }

  /// Refreshes the touch time of an LRU slot. Monotonic so that racing
  /// readers never move it backwards.
  #[inline]
  pub(crate) fn touch(&self, now: Timestamp) {
    self.stamp.fetch_max(now, Relaxed);
  }

  #[inline]
  pub(crate) fn read(&self) -> RwLockReadGuard<'_, Option<R>> {
    self.record.read()
  }

  #[inline]
  pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Option<R>> {
    self.record.write()
  }

  /// Moves `record` into an available slot.
  ///
  /// `cell` must be the contents of this slot's write guard.
  #[inline]
  pub(crate) fn claim(&self, cell: &mut Option<R>, record: R, stamp: Timestamp) {
    debug_assert!(cell.is_none(), "Slot::claim on an occupied slot");

    self.status.store(Status::Initializing as u8, Relaxed);

    *cell = Some(record);

    self.stamp.store(stamp, Relaxed);
    self.status.store(Status::InUse as u8, Release);
  }
}

impl<R> Debug for Slot<R> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Slot")
      .field("status", &self.status())
      .field("stamp", &self.stamp())
      .finish_non_exhaustive()
  }
}
