//! Error types.
//!
//! Only construction can fail terminally. Everything on the hot path reports
//! expected conditions (full probe window, empty pool, unknown key) as values;
//! [`PoolError`] is returned from the pool but callers are expected to treat
//! it as "bypass the cache for this item".

use thiserror::Error;

/// A mandatory [`Ops`] function that was not supplied.
///
/// [`Ops`]: crate::ops::Ops
#[derive(Clone, Copy, Debug, Error, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum MissingOp {
  #[error("hash")]
  Hash,
  #[error("compare")]
  Compare,
  #[error("assign key")]
  AssignKey,
  #[error("assign value")]
  AssignValue,
}

/// An eviction strategy name or code that does not match any [`Strategy`].
///
/// [`Strategy`]: crate::strategy::Strategy
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown eviction strategy `{0}`")]
pub struct UnknownStrategy(pub String);

/// Failure to construct a [`Table`].
///
/// [`Table`]: crate::table::Table
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TableError {
  /// The ops do not provide a mandatory function.
  #[error("mandatory table operation missing: {0}")]
  MissingOp(#[from] MissingOp),
  /// The requested strategy is not recognized.
  #[error(transparent)]
  UnknownStrategy(#[from] UnknownStrategy),
  /// The capacity is zero or the bucket array is not representable.
  #[error("invalid table capacity: {capacity}")]
  InvalidCapacity { capacity: usize },
  /// The bucket array could not be allocated.
  #[error("failed to allocate {bytes} bytes for the bucket array")]
  Allocation { bytes: usize },
}

/// Failure reported by a [`Pool`].
///
/// [`Pool`]: crate::pool::Pool
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PoolError {
  /// Growing would exceed the pool's element ceiling.
  #[error("pool exhausted: {requested} more elements would exceed the maximum of {maximum}")]
  Exhausted { requested: usize, maximum: usize },
  /// The backing allocator refused a block.
  #[error("backing allocator failed to provide {bytes} bytes")]
  Backing { bytes: usize },
  /// The pool configuration cannot describe a block.
  #[error("invalid pool configuration: {reason}")]
  InvalidConfig { reason: &'static str },
  /// A record does not belong to this pool or is not aligned to a record
  /// boundary. Its memory is left unreclaimed.
  #[error("record at {address:#x} does not belong to this pool")]
  InvalidRelease { address: usize },
  /// The pool still has outstanding records and was left intact.
  #[error("pool still has {outstanding} outstanding records")]
  InUse { outstanding: usize },
}

impl PoolError {
  /// Returns `true` for the conditions a caller should treat as "not cached".
  #[inline]
  pub const fn is_exhausted(&self) -> bool {
    matches!(self, Self::Exhausted { .. } | Self::Backing { .. })
  }
}
