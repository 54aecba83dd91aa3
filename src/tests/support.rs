//! Shared fixtures.

use std::sync::Arc;

use crate::clock::ManualClock;
use crate::clock::Timestamp;
use crate::ops::Ops;

/// Ops with identity-like hashing and a manual clock.
///
/// The first four bytes of the fingerprint (little endian, zero padded) are
/// both the primary hash and the key, so tests can place keys in chosen
/// buckets.
#[derive(Clone, Debug, Default)]
pub(crate) struct TestOps {
  pub(crate) clock: Arc<ManualClock>,
}

impl TestOps {
  pub(crate) fn new(start: Timestamp) -> Self {
    Self {
      clock: Arc::new(ManualClock::new(start)),
    }
  }
}

impl Ops for TestOps {
  type Key = u32;
  type Value = u64;

  fn hash(&self, data: &[u8]) -> (u32, u32) {
    let mut bytes: [u8; 4] = [0; 4];
    let length: usize = data.len().min(4);

    bytes[..length].copy_from_slice(&data[..length]);

    let key: u32 = u32::from_le_bytes(bytes);

    (key, key)
  }

  fn compare(&self, lhs: &u32, rhs: &u32) -> bool {
    lhs == rhs
  }

  fn assign_key(&self, src: &u32, dst: &mut u32) {
    *dst = *src;
  }

  fn assign_value(&self, src: &u64, dst: &mut u64) {
    *dst = *src;
  }

  fn now(&self) -> Timestamp {
    self.clock.now()
  }
}

/// Fingerprint bytes whose primary hash is `key`.
pub(crate) fn fp(key: u32) -> [u8; 4] {
  key.to_le_bytes()
}
