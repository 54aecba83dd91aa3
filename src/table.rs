//! Core table implementation.
//!
//! Buckets live in a single cache-aligned array sized at construction and
//! never resized. Each bucket carries its own reader/writer lock; operations
//! lock one bucket at a time while walking the probe window, so unrelated keys
//! never contend.

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::marker::PhantomData;

use crossbeam_utils::CachePadded;
use tracing::debug;
use tracing::info;

use crate::array::Array;
use crate::clock::Timestamp;
use crate::config::TableConfig;
use crate::error::TableError;
use crate::index::Bucket;
use crate::index::Probe;
use crate::ops::Entry;
use crate::ops::Ops;
use crate::ops::Record;
use crate::outcome::Assessment;
use crate::outcome::Counters;
use crate::outcome::Found;
use crate::outcome::Insert;
use crate::params::DefaultParams;
use crate::params::Params;
use crate::params::ParamsExt;
use crate::slot::Slot;
use crate::strategy::Strategy;
use crate::sync::atomic::AtomicU64;
use crate::sync::atomic::Ordering::Relaxed;

// -----------------------------------------------------------------------------
// Table
// -----------------------------------------------------------------------------

/// A fixed-capacity concurrent map from fingerprints to values.
///
/// `O` supplies hashing and copying, `R` is the record type slots adopt
/// (inline [`Entry`] by default, or a pool [`Object`]) and `P` fixes the probe
/// window and bucket factor at compile time.
///
/// All operations take `&self`; share the table between threads with
/// [`Arc`] or a scoped borrow.
///
/// [`Object`]: crate::pool::Object
/// [`Arc`]: std::sync::Arc
#[repr(C)]
pub struct Table<O, R = Entry<<O as Ops>::Key, <O as Ops>::Value>, P = DefaultParams>
where
  O: Ops,
  P: Params + ?Sized,
{
  volatile: CachePadded<Volatile>,
  readonly: CachePadded<ReadOnly<O, R>>,
  phantom: PhantomData<fn(P)>,
}

impl<O, R> Table<O, R, DefaultParams>
where
  O: Ops,
  R: Record<Key = O::Key, Value = O::Value>,
{
  /// Creates a table for `capacity` entries with the default parameters.
  ///
  /// `strategy` is anything convertible into a [`Strategy`]: the enum itself,
  /// its configuration name (`"self-expiring"`, `"lru"`) or its numeric code.
  ///
  /// # Errors
  ///
  /// - [`TableError::MissingOp`] if `ops` lacks a mandatory function.
  /// - [`TableError::UnknownStrategy`] if `strategy` names no strategy.
  /// - [`TableError::InvalidCapacity`] if `capacity` is zero or too large.
  /// - [`TableError::Allocation`] if the bucket array cannot be allocated.
  #[inline]
  pub fn new<S>(capacity: usize, strategy: S, ops: O) -> Result<Self, TableError>
  where
    S: TryInto<Strategy>,
    S::Error: Into<TableError>,
  {
    Self::with_params(capacity, strategy, ops)
  }
}

impl<O, R, P> Table<O, R, P>
where
  O: Ops,
  R: Record<Key = O::Key, Value = O::Value>,
  P: Params + ?Sized,
{
  /// Creates a table for `capacity` entries with custom [`Params`].
  ///
  /// # Errors
  ///
  /// See [`Table::new`].
  pub fn with_params<S>(capacity: usize, strategy: S, ops: O) -> Result<Self, TableError>
  where
    S: TryInto<Strategy>,
    S::Error: Into<TableError>,
  {
    P::validate();

    ops.check()?;

    let strategy: Strategy = strategy.try_into().map_err(Into::<TableError>::into)?;

    if capacity == 0 {
      return Err(TableError::InvalidCapacity { capacity });
    }

    let Some(buckets) = P::buckets(capacity) else {
      return Err(TableError::InvalidCapacity { capacity });
    };

    let slots: Array<Slot<R>> = Array::new(buckets, |_| Slot::new()).map_err(|error| match error {
      TableError::InvalidCapacity { .. } => TableError::InvalidCapacity { capacity },
      other => other,
    })?;

    let this: Self = Self {
      volatile: CachePadded::new(Volatile::new()),
      readonly: CachePadded::new(ReadOnly {
        slots,
        capacity,
        strategy,
        ops,
      }),
      phantom: PhantomData,
    };

    debug!(
      capacity,
      buckets,
      probe = P::PROBE,
      %strategy,
      memory = this.memory(),
      "created table"
    );

    Ok(this)
  }

  /// Creates a table from a deserialized [`TableConfig`].
  ///
  /// # Errors
  ///
  /// See [`Table::new`].
  #[inline]
  pub fn from_config(config: &TableConfig, ops: O) -> Result<Self, TableError> {
    Self::with_params(config.capacity, config.strategy, ops)
  }

  // ---------------------------------------------------------------------------
  // Introspection
  // ---------------------------------------------------------------------------

  /// The declared capacity.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.readonly.capacity
  }

  /// The number of buckets (`capacity * P::FACTOR`).
  #[inline]
  pub fn buckets(&self) -> usize {
    self.readonly.slots.len()
  }

  /// The eviction strategy chosen at construction.
  #[inline]
  pub fn strategy(&self) -> Strategy {
    self.readonly.strategy
  }

  /// The maximum number of buckets a single operation inspects.
  #[inline]
  pub fn probe_length(&self) -> usize {
    P::PROBE.min(self.buckets())
  }

  /// Bytes owned by the table, including the bucket array.
  #[inline]
  pub fn memory(&self) -> usize {
    size_of::<Self>() + self.readonly.slots.size()
  }

  /// The ops used to hash, compare, and copy records and to read the clock.
  #[inline]
  pub fn ops(&self) -> &O {
    &self.readonly.ops
  }

  /// Cumulative insert counters.
  #[inline]
  pub fn counters(&self) -> Counters {
    Counters {
      failed: self.volatile.failed.load(Relaxed),
      collision: self.volatile.collision.load(Relaxed),
    }
  }

  // ---------------------------------------------------------------------------
  // Insert
  // ---------------------------------------------------------------------------

  /// Hashes `data` and stores `record` under the resulting key.
  ///
  /// The record's key is overwritten with the hashed key before probing.
  /// `expiry` is the absolute deadline for self-expiring tables and is ignored
  /// by LRU tables, which stamp the entry with the current time instead.
  ///
  /// Concurrent inserts of the same unseen key may both claim a slot in the
  /// probe window. Lookups return the first one in probe order and later
  /// inserts update that same one; the duplicate ages out or is evicted.
  #[inline]
  pub fn insert(&self, data: &[u8], mut record: R, expiry: Timestamp) -> Insert<R> {
    let (primary, key) = self.ops().hash(data);

    self.ops().assign_key(&key, record.key_mut());

    match self.strategy() {
      Strategy::SelfExpiring => self.insert_expiring(primary, record, expiry),
      Strategy::Lru => self.insert_lru(primary, record),
    }
  }

  // ---------------------------------------------------------------------------
  // Find
  // ---------------------------------------------------------------------------

  /// Copies the value stored for `data` into `out`.
  ///
  /// Returns the entry's expiry deadline (or refreshed touch time for LRU
  /// tables), or `None` when the key is absent or expired. `out` is only
  /// written on a hit.
  #[inline]
  pub fn find(&self, data: &[u8], out: &mut O::Value) -> Option<Timestamp> {
    let (primary, key) = self.ops().hash(data);

    self
      .locate(primary, &key, |record| {
        self.ops().assign_value(record.value(), out);
      })
      .map(|(_, stamp)| stamp)
  }

  /// Returns a clone of the value stored for `data`.
  #[inline]
  pub fn get(&self, data: &[u8]) -> Option<Found<O::Value>>
  where
    O::Value: Clone,
  {
    let (primary, key) = self.ops().hash(data);
    let mut value: Option<O::Value> = None;

    let (_, stamp) = self.locate(primary, &key, |record| {
      value = Some(record.value().clone());
    })?;

    value.map(|value| Found { value, stamp })
  }

  /// Returns `true` if a live entry exists for `data`.
  ///
  /// Counts as a touch for LRU tables.
  #[inline]
  pub fn contains(&self, data: &[u8]) -> bool {
    let (primary, key) = self.ops().hash(data);

    self.locate(primary, &key, |_| {}).is_some()
  }

  /// Runs `update` on the value stored for `data` under the bucket's write
  /// lock.
  ///
  /// Returns `false` without calling `update` when the key is absent,
  /// expired, or was replaced between lookup and locking.
  #[inline]
  pub fn update<F>(&self, data: &[u8], update: F) -> bool
  where
    F: FnOnce(&mut O::Value),
  {
    let (primary, key) = self.ops().hash(data);

    let Some((bucket, _)) = self.locate(primary, &key, |_| {}) else {
      return false;
    };

    self.modify(bucket, &key, update)
  }

  /// Copies the value stored for `data` into `out`, then runs `update` on
  /// the stored value under the bucket's write lock.
  ///
  /// `out` receives the value as it was before `update`.
  #[inline]
  pub fn find_and_update<F>(
    &self,
    data: &[u8],
    out: &mut O::Value,
    update: F,
  ) -> Option<Timestamp>
  where
    F: FnOnce(&mut O::Value),
  {
    let (primary, key) = self.ops().hash(data);

    let (bucket, stamp) = self.locate(primary, &key, |record| {
      self.ops().assign_value(record.value(), out);
    })?;

    // A lost race only skips the callback; the copy already happened.
    let _updated: bool = self.modify(bucket, &key, update);

    Some(stamp)
  }

  // ---------------------------------------------------------------------------
  // Assess
  // ---------------------------------------------------------------------------

  /// Scans every bucket and reports usage, passing each in-use value to
  /// [`Ops::assess`].
  pub fn assess(&self) -> Assessment {
    self.assess_with(|value| self.ops().assess(value))
  }

  /// Like [`assess`](Self::assess) with a caller-supplied visitor instead of
  /// [`Ops::assess`].
  pub fn assess_with<F>(&self, mut visit: F) -> Assessment
  where
    F: FnMut(&O::Value),
  {
    let now: Timestamp = self.ops().now();
    let expiring: bool = self.strategy() == Strategy::SelfExpiring;

    let mut in_use: usize = 0;
    let mut expired: usize = 0;

    for slot in self.readonly.slots.as_slice() {
      if slot.is_available() {
        continue;
      }

      let guard = slot.read();

      let Some(record) = guard.as_ref() else {
        continue;
      };

      in_use += 1;

      if expiring && now >= slot.stamp() {
        expired += 1;
      }

      visit(record.value());
    }

    let counters: Counters = self.counters();

    let assessment: Assessment = Assessment {
      strategy: self.strategy(),
      capacity: self.capacity(),
      buckets: self.buckets(),
      probe_length: self.probe_length(),
      in_use,
      available: self.buckets() - in_use,
      expired,
      failed: counters.failed,
      collision: counters.collision,
      memory: self.memory(),
    };

    info!(
      strategy = %assessment.strategy,
      in_use = assessment.in_use,
      available = assessment.available,
      expired = assessment.expired,
      failed = assessment.failed,
      collision = assessment.collision,
      memory = assessment.memory,
      "assessed table"
    );

    assessment
  }

  // ---------------------------------------------------------------------------
  // Internals
  // ---------------------------------------------------------------------------

  #[inline]
  pub(crate) fn probe(&self, primary: u32) -> Probe {
    Probe::new(primary, self.buckets(), P::PROBE)
  }

  #[inline]
  pub(crate) fn slot(&self, bucket: Bucket) -> &Slot<R> {
    self.readonly.slots.get(bucket)
  }

  /// Copies the key and value of `src` into an occupied record.
  #[inline]
  pub(crate) fn assign(&self, src: &R, dst: &mut R) {
    self.ops().assign_key(src.key(), dst.key_mut());
    self.ops().assign_value(src.value(), dst.value_mut());
  }

  #[inline]
  pub(crate) fn record_collision(&self) {
    self.volatile.collision.fetch_add(1, Relaxed);
  }

  #[inline]
  pub(crate) fn record_failure(&self) {
    self.volatile.failed.fetch_add(1, Relaxed);
  }

  /// Returns `true` if a slot stamped `stamp` is still live at `now`.
  #[inline]
  fn is_live(&self, stamp: Timestamp, now: Timestamp) -> bool {
    match self.strategy() {
      Strategy::SelfExpiring => now < stamp,
      Strategy::Lru => true,
    }
  }

  /// Walks the probe window for `key` and calls `visit` on the first live
  /// match while holding its read lock.
  fn locate<F>(&self, primary: u32, key: &O::Key, visit: F) -> Option<(Bucket, Timestamp)>
  where
    F: FnOnce(&R),
  {
    let now: Timestamp = self.ops().now();

    for bucket in self.probe(primary) {
      let slot: &Slot<R> = self.slot(bucket);

      if slot.is_available() {
        continue;
      }

      let guard = slot.read();

      let Some(record) = guard.as_ref() else {
        continue;
      };

      if !self.ops().compare(record.key(), key) {
        continue;
      }

      let stamp: Timestamp = slot.stamp();

      if !self.is_live(stamp, now) {
        continue;
      }

      visit(record);

      if self.strategy() == Strategy::Lru {
        slot.touch(now);
        return Some((bucket, now.max(stamp)));
      }

      return Some((bucket, stamp));
    }

    None
  }

  /// Re-locks `bucket` for writing and applies `update` if it still holds a
  /// live entry for `key`.
  fn modify<F>(&self, bucket: Bucket, key: &O::Key, update: F) -> bool
  where
    F: FnOnce(&mut O::Value),
  {
    let now: Timestamp = self.ops().now();
    let slot: &Slot<R> = self.slot(bucket);
    let mut guard = slot.write();

    let Some(record) = guard.as_mut() else {
      return false;
    };

    if !self.ops().compare(record.key(), key) || !self.is_live(slot.stamp(), now) {
      return false;
    }

    update(record.value_mut());

    true
  }
}

impl<O, R, P> Debug for Table<O, R, P>
where
  O: Ops + Debug,
  P: Params + ?Sized,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Table")
      .field("params", &P::debug())
      .field("strategy", &self.readonly.strategy)
      .field("capacity", &self.readonly.capacity)
      .field("buckets", &self.readonly.slots.len())
      .field("failed", &self.volatile.failed.load(Relaxed))
      .field("collision", &self.volatile.collision.load(Relaxed))
      .field("ops", &self.readonly.ops)
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Volatile State
// -----------------------------------------------------------------------------

/// Counters bumped on the insert path.
///
/// Isolated from [`ReadOnly`] via cache padding to avoid false sharing.
#[repr(C)]
struct Volatile {
  /// Inserts that found no usable slot.
  failed: AtomicU64,
  /// Occupied buckets skipped while probing.
  collision: AtomicU64,
}

impl Volatile {
  #[inline]
  fn new() -> Self {
    Self {
      failed: AtomicU64::new(0),
      collision: AtomicU64::new(0),
    }
  }
}

// -----------------------------------------------------------------------------
// Read-only State
// -----------------------------------------------------------------------------

/// State fixed at construction.
///
/// Individual slots are locked and mutated, but the array itself never
/// resizes.
#[repr(C)]
struct ReadOnly<O, R> {
  slots: Array<Slot<R>>,
  capacity: usize,
  strategy: Strategy,
  ops: O,
}
