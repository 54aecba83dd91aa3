//! Bucket addressing and probe sequences.
//!
//! A key's home bucket is `primary % buckets`; operations then walk a window
//! of consecutive buckets, wrapping past the end of the array back to `0`.

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result;
use core::iter::FusedIterator;

// -----------------------------------------------------------------------------
// Bucket Index
// -----------------------------------------------------------------------------

/// A position in the bucket array.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub(crate) struct Bucket {
  source: usize,
}

impl Bucket {
  #[inline]
  pub(crate) const fn new(source: usize) -> Self {
    Self { source }
  }

  #[inline]
  pub(crate) const fn get(self) -> usize {
    self.source
  }
}

impl Debug for Bucket {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Debug::fmt(&self.source, f)
  }
}

// -----------------------------------------------------------------------------
// Probe Sequence
// -----------------------------------------------------------------------------

/// The linear probe window for a single operation.
///
/// Yields at most `min(length, buckets)` distinct buckets starting at the home
/// bucket of `primary`.
#[derive(Clone, Debug)]
pub(crate) struct Probe {
  cursor: usize,
  buckets: usize,
  remaining: usize,
}

impl Probe {
  /// Creates the probe window for `primary` in an array of `buckets` entries.
  ///
  /// `buckets` must be non-zero.
  #[inline]
  pub(crate) fn new(primary: u32, buckets: usize, length: usize) -> Self {
    debug_assert!(buckets != 0, "Probe::new requires a non-empty bucket array");

    Self {
      cursor: primary as usize % buckets,
      buckets,
      remaining: length.min(buckets),
    }
  }
}

impl Iterator for Probe {
  type Item = Bucket;

  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    if self.remaining == 0 {
      return None;
    }

    let bucket: Bucket = Bucket::new(self.cursor);

    self.cursor += 1;
    self.remaining -= 1;

    if self.cursor == self.buckets {
      self.cursor = 0;
    }

    Some(bucket)
  }

  #[inline]
  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.remaining, Some(self.remaining))
  }
}

impl ExactSizeIterator for Probe {}

impl FusedIterator for Probe {}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
