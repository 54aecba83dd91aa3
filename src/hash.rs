//! Fixed-size fingerprint keys and their default ops.
//!
//! A [`Key`] stores two independent 32-bit digests of a fingerprint instead of
//! the fingerprint itself. Two distinct fingerprints are conflated only when
//! both digests collide, which is an accepted accuracy tradeoff for constant
//! size keys.

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::hash::Hasher;
use core::marker::PhantomData;

use rustc_hash::FxHasher;

use crate::ops::Ops;

/// Multiplier of the BKDR string hash.
pub const BKDR_SEED: u32 = 131_313;

/// A fingerprint surrogate made of two independent digests.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Key {
  /// Selects the home bucket.
  pub primary: u32,
  /// Disambiguates fingerprints that share `primary`.
  pub verify: u32,
}

impl Key {
  #[inline]
  pub const fn new(primary: u32, verify: u32) -> Self {
    Self { primary, verify }
  }

  /// Digests `data` with the default hash pair.
  #[inline]
  pub fn digest(data: &[u8]) -> Self {
    Self::new(fx32(data), bkdr(data))
  }
}

/// The Fx hash of `data`, folded to 32 bits.
#[inline]
pub fn fx32(data: &[u8]) -> u32 {
  let mut hasher: FxHasher = FxHasher::default();

  hasher.write(data);

  let hash: u64 = hasher.finish();

  (hash ^ (hash >> 32)) as u32
}

/// The BKDR string hash of `data`.
///
/// Processing stops at the first NUL byte, so the digest of a byte string and
/// of its C-string form agree.
#[inline]
pub fn bkdr(data: &[u8]) -> u32 {
  data
    .iter()
    .take_while(|byte| **byte != 0)
    .fold(0_u32, |hash, byte| {
      hash.wrapping_mul(BKDR_SEED).wrapping_add(u32::from(*byte))
    })
}

/// [`Ops`] for [`Key`]-addressed tables with cloneable values.
///
/// Uses [`Key::digest`] for hashing; keys match when both digests match.
pub struct KeyOps<V> {
  marker: PhantomData<fn() -> V>,
}

impl<V> KeyOps<V> {
  #[inline]
  pub const fn new() -> Self {
    Self {
      marker: PhantomData,
    }
  }
}

impl<V> Clone for KeyOps<V> {
  #[inline]
  fn clone(&self) -> Self {
    *self
  }
}

impl<V> Copy for KeyOps<V> {}

impl<V> Default for KeyOps<V> {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

impl<V> Debug for KeyOps<V> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str("KeyOps")
  }
}

impl<V> Ops for KeyOps<V>
where
  V: Clone,
{
  type Key = Key;
  type Value = V;

  #[inline]
  fn hash(&self, data: &[u8]) -> (u32, Key) {
    let key: Key = Key::digest(data);
    (key.primary, key)
  }

  #[inline]
  fn compare(&self, lhs: &Key, rhs: &Key) -> bool {
    lhs == rhs
  }

  #[inline]
  fn assign_key(&self, src: &Key, dst: &mut Key) {
    *dst = *src;
  }

  #[inline]
  fn assign_value(&self, src: &V, dst: &mut V) {
    dst.clone_from(src);
  }
}
