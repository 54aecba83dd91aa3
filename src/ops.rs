//! The caller-supplied operations contract.
//!
//! A [`Table`] never looks inside keys or values. It reaches them through the
//! records it stores ([`Record`]) and manipulates them through an [`Ops`]
//! implementation: hashing a fingerprint into a fixed-size key, comparing
//! keys, copying keys and values into existing slots, and an optional
//! diagnostics hook.
//!
//! [`Table`]: crate::table::Table

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;

use crate::clock;
use crate::clock::Timestamp;
use crate::error::MissingOp;

// -----------------------------------------------------------------------------
// Ops
// -----------------------------------------------------------------------------

/// Pluggable functions used by a [`Table`].
///
/// [`Table`]: crate::table::Table
pub trait Ops {
  /// Fixed-size surrogate for a variable-length fingerprint.
  type Key;

  /// Opaque payload stored alongside each key.
  type Value;

  /// Hashes `data` into a key.
  ///
  /// The returned `u32` selects the home bucket; the key is what slots store
  /// and compare against.
  fn hash(&self, data: &[u8]) -> (u32, Self::Key);

  /// Returns `true` when two keys identify the same fingerprint.
  fn compare(&self, lhs: &Self::Key, rhs: &Self::Key) -> bool;

  /// Copies `src` into an existing key.
  fn assign_key(&self, src: &Self::Key, dst: &mut Self::Key);

  /// Copies `src` into an existing value.
  fn assign_value(&self, src: &Self::Value, dst: &mut Self::Value);

  /// Diagnostics hook invoked once per live slot by [`Table::assess`].
  ///
  /// [`Table::assess`]: crate::table::Table::assess
  #[inline]
  fn assess(&self, _value: &Self::Value) {}

  /// The clock used for expiry deadlines and touch times.
  #[inline]
  fn now(&self) -> Timestamp {
    clock::now()
  }

  /// Reports the first mandatory function this implementation lacks.
  ///
  /// Trait implementations cannot omit functions, so the default is `Ok`.
  /// Runtime-assembled ops such as [`FnOps`] override it.
  ///
  /// # Errors
  ///
  /// Returns the first [`MissingOp`] found, in the order hash, compare,
  /// assign key, assign value.
  #[inline]
  fn check(&self) -> Result<(), MissingOp> {
    Ok(())
  }
}

// -----------------------------------------------------------------------------
// Record
// -----------------------------------------------------------------------------

/// A fixed-size key/value pair that a table slot can adopt.
///
/// Implemented by [`Entry`] (inline storage) and by pool handles
/// ([`Object`]) wrapping a record type.
///
/// [`Object`]: crate::pool::Object
pub trait Record {
  type Key;
  type Value;

  fn key(&self) -> &Self::Key;

  fn key_mut(&mut self) -> &mut Self::Key;

  fn value(&self) -> &Self::Value;

  fn value_mut(&mut self) -> &mut Self::Value;
}

/// A plain key/value record.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entry<K, V> {
  pub key: K,
  pub value: V,
}

impl<K, V> Entry<K, V> {
  #[inline]
  pub const fn new(key: K, value: V) -> Self {
    Self { key, value }
  }

  /// Creates a record whose key will be filled in by [`Table::insert`].
  ///
  /// [`Table::insert`]: crate::table::Table::insert
  #[inline]
  pub fn vacant(value: V) -> Self
  where
    K: Default,
  {
    Self::new(K::default(), value)
  }
}

impl<K, V> Record for Entry<K, V> {
  type Key = K;
  type Value = V;

  #[inline]
  fn key(&self) -> &K {
    &self.key
  }

  #[inline]
  fn key_mut(&mut self) -> &mut K {
    &mut self.key
  }

  #[inline]
  fn value(&self) -> &V {
    &self.value
  }

  #[inline]
  fn value_mut(&mut self) -> &mut V {
    &mut self.value
  }
}

impl<R> Record for Box<R>
where
  R: Record + ?Sized,
{
  type Key = R::Key;
  type Value = R::Value;

  #[inline]
  fn key(&self) -> &Self::Key {
    (**self).key()
  }

  #[inline]
  fn key_mut(&mut self) -> &mut Self::Key {
    (**self).key_mut()
  }

  #[inline]
  fn value(&self) -> &Self::Value {
    (**self).value()
  }

  #[inline]
  fn value_mut(&mut self) -> &mut Self::Value {
    (**self).value_mut()
  }
}

// -----------------------------------------------------------------------------
// Function-pointer Ops
// -----------------------------------------------------------------------------

/// Maps fingerprint bytes to a primary hash and a key.
pub type HashFn<K> = fn(&[u8]) -> (u32, K);

/// Ops assembled at runtime from plain function pointers.
///
/// Every function starts out missing; [`Table::new`] rejects the ops with
/// [`TableError::MissingOp`] unless `hash`, `compare`, `assign_key` and
/// `assign_value` were all supplied.
///
/// ```
/// use cctab::FnOps;
/// use cctab::Strategy;
/// use cctab::Table;
/// use cctab::TableError;
/// use cctab::error::MissingOp;
///
/// fn hash(data: &[u8]) -> (u32, u64) {
///   (data.len() as u32, data.len() as u64)
/// }
///
/// let ops: FnOps<u64, u32> = FnOps::new().with_hash(hash);
/// let result = Table::<FnOps<u64, u32>>::new(16, Strategy::SelfExpiring, ops);
///
/// assert_eq!(result.err(), Some(TableError::MissingOp(MissingOp::Compare)));
/// ```
///
/// [`Table::new`]: crate::table::Table::new
/// [`TableError::MissingOp`]: crate::error::TableError::MissingOp
pub struct FnOps<K, V> {
  hash: Option<HashFn<K>>,
  compare: Option<fn(&K, &K) -> bool>,
  assign_key: Option<fn(&K, &mut K)>,
  assign_value: Option<fn(&V, &mut V)>,
  assess: Option<fn(&V)>,
}

impl<K, V> FnOps<K, V> {
  #[inline]
  pub const fn new() -> Self {
    Self {
      hash: None,
      compare: None,
      assign_key: None,
      assign_value: None,
      assess: None,
    }
  }

  #[must_use]
  #[inline]
  pub fn with_hash(mut self, hash: HashFn<K>) -> Self {
    self.hash = Some(hash);
    self
  }

  #[must_use]
  #[inline]
  pub fn with_compare(mut self, compare: fn(&K, &K) -> bool) -> Self {
    self.compare = Some(compare);
    self
  }

  #[must_use]
  #[inline]
  pub fn with_assign_key(mut self, assign_key: fn(&K, &mut K)) -> Self {
    self.assign_key = Some(assign_key);
    self
  }

  #[must_use]
  #[inline]
  pub fn with_assign_value(mut self, assign_value: fn(&V, &mut V)) -> Self {
    self.assign_value = Some(assign_value);
    self
  }

  #[must_use]
  #[inline]
  pub fn with_assess(mut self, assess: fn(&V)) -> Self {
    self.assess = Some(assess);
    self
  }
}

impl<K, V> Default for FnOps<K, V> {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

impl<K, V> Clone for FnOps<K, V> {
  #[inline]
  fn clone(&self) -> Self {
    Self {
      hash: self.hash,
      compare: self.compare,
      assign_key: self.assign_key,
      assign_value: self.assign_value,
      assess: self.assess,
    }
  }
}

impl<K, V> Debug for FnOps<K, V> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("FnOps")
      .field("hash", &self.hash.is_some())
      .field("compare", &self.compare.is_some())
      .field("assign_key", &self.assign_key.is_some())
      .field("assign_value", &self.assign_value.is_some())
      .field("assess", &self.assess.is_some())
      .finish()
  }
}

/// # Panics
///
/// Calling a mandatory function that was never supplied panics. A [`Table`]
/// never does so because [`Ops::check`] runs at construction.
///
/// [`Table`]: crate::table::Table
impl<K, V> Ops for FnOps<K, V> {
  type Key = K;
  type Value = V;

  #[inline]
  fn hash(&self, data: &[u8]) -> (u32, K) {
    let Some(hash) = self.hash else {
      missing(MissingOp::Hash)
    };

    hash(data)
  }

  #[inline]
  fn compare(&self, lhs: &K, rhs: &K) -> bool {
    let Some(compare) = self.compare else {
      missing(MissingOp::Compare)
    };

    compare(lhs, rhs)
  }

  #[inline]
  fn assign_key(&self, src: &K, dst: &mut K) {
    let Some(assign_key) = self.assign_key else {
      missing(MissingOp::AssignKey)
    };

    assign_key(src, dst);
  }

  #[inline]
  fn assign_value(&self, src: &V, dst: &mut V) {
    let Some(assign_value) = self.assign_value else {
      missing(MissingOp::AssignValue)
    };

    assign_value(src, dst);
  }

  #[inline]
  fn assess(&self, value: &V) {
    if let Some(assess) = self.assess {
      assess(value);
    }
  }

  fn check(&self) -> Result<(), MissingOp> {
    if self.hash.is_none() {
      return Err(MissingOp::Hash);
    }

    if self.compare.is_none() {
      return Err(MissingOp::Compare);
    }

    if self.assign_key.is_none() {
      return Err(MissingOp::AssignKey);
    }

    if self.assign_value.is_none() {
      return Err(MissingOp::AssignValue);
    }

    Ok(())
  }
}

#[cold]
#[inline(never)]
#[track_caller]
fn missing(op: MissingOp) -> ! {
  panic!("FnOps: `{op}` was never supplied");
}

#[cfg(test)]
mod tests {
  use crate::error::MissingOp;
  use crate::ops::Entry;
  use crate::ops::FnOps;
  use crate::ops::Ops;
  use crate::ops::Record;

  fn hash(data: &[u8]) -> (u32, u32) {
    (data.len() as u32, data.len() as u32)
  }

  fn compare(lhs: &u32, rhs: &u32) -> bool {
    lhs == rhs
  }

  fn assign(src: &u32, dst: &mut u32) {
    *dst = *src;
  }

  #[test]
  fn fn_ops_reports_first_missing() {
    let ops: FnOps<u32, u32> = FnOps::new();
    assert_eq!(ops.check(), Err(MissingOp::Hash));

    let ops: FnOps<u32, u32> = ops.with_hash(hash);
    assert_eq!(ops.check(), Err(MissingOp::Compare));

    let ops: FnOps<u32, u32> = ops.with_compare(compare);
    assert_eq!(ops.check(), Err(MissingOp::AssignKey));

    let ops: FnOps<u32, u32> = ops.with_assign_key(assign);
    assert_eq!(ops.check(), Err(MissingOp::AssignValue));

    let ops: FnOps<u32, u32> = ops.with_assign_value(assign);
    assert_eq!(ops.check(), Ok(()));
  }

  #[test]
  fn fn_ops_dispatch() {
    let ops: FnOps<u32, u32> = FnOps::new()
      .with_hash(hash)
      .with_compare(compare)
      .with_assign_key(assign)
      .with_assign_value(assign);

    let mut dst: u32 = 0;

    assert_eq!(ops.hash(b"abc"), (3, 3));
    assert!(ops.compare(&1, &1));
    assert!(!ops.compare(&1, &2));

    ops.assign_value(&9, &mut dst);
    assert_eq!(dst, 9);

    // Missing assess is a no-op.
    ops.assess(&dst);
  }

  #[test]
  #[should_panic(expected = "was never supplied")]
  fn fn_ops_missing_panics() {
    let ops: FnOps<u32, u32> = FnOps::new();
    let _hashed: (u32, u32) = ops.hash(b"abc");
  }

  #[test]
  fn entry_record() {
    let mut entry: Entry<u32, &str> = Entry::vacant("value");

    assert_eq!(*entry.key(), 0);
    *entry.key_mut() = 7;
    *entry.value_mut() = "other";

    assert_eq!(entry, Entry::new(7, "other"));
  }
}
