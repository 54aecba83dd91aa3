//! Runtime configuration.
//!
//! Compile-time shape lives in [`Params`]; these structs carry the values a
//! deployment picks at startup and deserialize from any `serde` format when
//! the `serde` feature is enabled.
//!
//! [`Params`]: crate::params::Params

use crate::error::PoolError;
use crate::pool::MAX_ELEMENTS;
use crate::strategy::Strategy;

/// Settings for a [`Table`](crate::table::Table).
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableConfig {
  /// Declared entry capacity; the table allocates `capacity * FACTOR`
  /// buckets.
  pub capacity: usize,
  #[cfg_attr(feature = "serde", serde(default))]
  pub strategy: Strategy,
}

impl TableConfig {
  #[inline]
  pub const fn new(capacity: usize, strategy: Strategy) -> Self {
    Self { capacity, strategy }
  }
}

/// Settings for a [`Pool`](crate::pool::Pool).
///
/// `max_elements` bounds the records allocated at any one time across all
/// blocks. The first block holds `initial_elements` and each later block
/// holds `expand_elements`; both default to `max_elements`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfig {
  pub max_elements: usize,
  #[cfg_attr(feature = "serde", serde(default))]
  pub initial_elements: Option<usize>,
  #[cfg_attr(feature = "serde", serde(default))]
  pub expand_elements: Option<usize>,
}

impl PoolConfig {
  #[inline]
  pub const fn new(max_elements: usize) -> Self {
    Self {
      max_elements,
      initial_elements: None,
      expand_elements: None,
    }
  }

  #[must_use]
  #[inline]
  pub const fn with_initial(mut self, elements: usize) -> Self {
    self.initial_elements = Some(elements);
    self
  }

  #[must_use]
  #[inline]
  pub const fn with_expand(mut self, elements: usize) -> Self {
    self.expand_elements = Some(elements);
    self
  }

  #[inline]
  pub const fn initial(&self) -> usize {
    match self.initial_elements {
      Some(elements) => elements,
      None => self.max_elements,
    }
  }

  #[inline]
  pub const fn expand(&self) -> usize {
    match self.expand_elements {
      Some(elements) => elements,
      None => self.max_elements,
    }
  }

  pub(crate) fn validate(&self) -> Result<(), PoolError> {
    if self.max_elements == 0 {
      return Err(PoolError::InvalidConfig {
        reason: "`max_elements` must be non-zero",
      });
    }

    if self.initial() == 0 || self.expand() == 0 {
      return Err(PoolError::InvalidConfig {
        reason: "block sizes must be non-zero",
      });
    }

    if self.initial() > self.max_elements || self.expand() > self.max_elements {
      return Err(PoolError::InvalidConfig {
        reason: "block sizes must not exceed `max_elements`",
      });
    }

    if self.initial().max(self.expand()) > MAX_ELEMENTS {
      return Err(PoolError::InvalidConfig {
        reason: "block sizes must fit in 32 bits",
      });
    }

    Ok(())
  }
}
