//! Eviction strategies.
//!
//! Both strategies share the probing skeleton in [`Table`]; they differ in
//! what makes an occupied slot reusable on insert and what the per-slot
//! timestamp means.
//!
//! | | [`SelfExpiring`] | [`Lru`] |
//! |---|---|---|
//! | timestamp | absolute expiry deadline | last touch time |
//! | reusable on insert | key match or expired | key match |
//! | full probe window | [`Insert::Failed`] | evict the oldest touch |
//! | find refreshes timestamp | no | yes |
//!
//! [`Table`]: crate::table::Table
//! [`SelfExpiring`]: Strategy::SelfExpiring
//! [`Lru`]: Strategy::Lru
//! [`Insert::Failed`]: crate::outcome::Insert::Failed

mod expiring;
mod lru;

use core::convert::Infallible;
use core::fmt::Display;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::str::FromStr;

use crate::error::TableError;
use crate::error::UnknownStrategy;

/// The eviction policy selected when a table is created.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[repr(u32)]
pub enum Strategy {
  /// Entries carry an absolute deadline and silently stop matching once it
  /// passes; inserts fail when the probe window is live and full.
  #[default]
  SelfExpiring = 0,
  /// Entries never expire; a full probe window evicts its least recently
  /// touched entry.
  Lru = 1,
}

impl Strategy {
  /// Every strategy, in code order.
  pub const ALL: [Self; 2] = [Self::SelfExpiring, Self::Lru];

  /// The stable name used in configuration.
  #[inline]
  pub const fn name(self) -> &'static str {
    match self {
      Self::SelfExpiring => "self-expiring",
      Self::Lru => "lru",
    }
  }

  /// The stable numeric code of the strategy.
  #[inline]
  pub const fn code(self) -> u32 {
    self as u32
  }
}

impl Display for Strategy {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str(self.name())
  }
}

impl FromStr for Strategy {
  type Err = UnknownStrategy;

  fn from_str(name: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|strategy| strategy.name().eq_ignore_ascii_case(name))
      .ok_or_else(|| UnknownStrategy(name.to_owned()))
  }
}

impl TryFrom<&str> for Strategy {
  type Error = UnknownStrategy;

  #[inline]
  fn try_from(name: &str) -> Result<Self, Self::Error> {
    name.parse()
  }
}

impl TryFrom<u32> for Strategy {
  type Error = UnknownStrategy;

  fn try_from(code: u32) -> Result<Self, Self::Error> {
    Self::ALL
      .into_iter()
      .find(|strategy| strategy.code() == code)
      .ok_or_else(|| UnknownStrategy(code.to_string()))
  }
}

impl From<Infallible> for TableError {
  #[inline]
  fn from(other: Infallible) -> Self {
    match other {}
  }
}
