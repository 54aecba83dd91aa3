//! A fixed-capacity concurrent state store for challenge-collapsar defense.
//!
//! `cctab` provides [`Table`], an open-addressing hash table with one
//! reader/writer lock per bucket, and [`Pool`], a single-owner slab allocator
//! whose records a table can adopt without copying. Together they keep one
//! small verdict per client fingerprint with bounded memory and no global
//! lock: the [`challenge`] module wires them into an admission gate.
//!
//! # Overview
//!
//! A table is created once with a declared capacity and an eviction
//! [`Strategy`]. It allocates `capacity * FACTOR` buckets up front and never
//! resizes. Every operation hashes the caller's fingerprint bytes through an
//! [`Ops`] implementation, then inspects at most `PROBE` consecutive buckets
//! starting at the key's home bucket.
//!
//! ```
//! use std::time::Duration;
//!
//! use cctab::Entry;
//! use cctab::Table;
//! use cctab::clock;
//! use cctab::hash::KeyOps;
//!
//! let table: Table<KeyOps<u32>> = Table::new(1000, "self-expiring", KeyOps::new()).unwrap();
//! let expiry: u64 = clock::deadline(Duration::from_secs(20));
//!
//! assert!(table.insert(b"client", Entry::vacant(1), expiry).is_new());
//! assert!(table.insert(b"client", Entry::vacant(2), expiry).is_occupy());
//!
//! let mut value: u32 = 0;
//! assert_eq!(table.find(b"client", &mut value), Some(expiry));
//! assert_eq!(value, 2);
//! ```
//!
//! # Strategies
//!
//! [`Strategy::SelfExpiring`] stamps entries with a caller-supplied deadline.
//! Expired entries stop matching immediately and are overwritten lazily by
//! later inserts; an insert whose whole probe window is live and foreign
//! returns [`Insert::Failed`] and the caller treats the item as not cached.
//!
//! [`Strategy::Lru`] stamps entries with their last touch time and, when the
//! probe window is full, overwrites the least recently touched entry in it.
//!
//! # Record ownership
//!
//! [`Table::insert`] takes a record by value. [`Insert::New`] means a
//! previously empty bucket adopted it; [`Insert::Occupy`] and
//! [`Insert::Failed`] hand it back after copying (or not) its contents, and
//! the caller reclaims it, typically with [`Pool::put_object`].
//!
//! # Concurrency
//!
//! All table operations take `&self` and lock a single bucket at a time.
//! Two racing first inserts of the same key may land in different buckets;
//! lookups always resolve to the first in probe order and the duplicate ages
//! out. Pools are `Send` but not `Sync`: keep one per worker thread.
//!
//! # Configuration
//!
//! Probe length and bucket factor are compile-time [`Params`]
//! ([`DefaultParams`] is 5 and 3); capacity and strategy are runtime
//! [`TableConfig`] values, and [`PoolConfig`] sizes pools. With the `serde`
//! feature all of them deserialize from configuration files.
//!
//! [`TableConfig`]: crate::config::TableConfig
//! [`PoolConfig`]: crate::config::PoolConfig
//! [`Pool::put_object`]: crate::pool::Pool::put_object

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod array;
mod index;
mod outcome;
mod slot;
mod table;
mod utils;

pub mod challenge;
pub mod clock;
pub mod config;
pub mod error;
pub mod hash;
pub mod ops;
pub mod params;
pub mod pool;
pub mod strategy;

#[cfg(all(test, not(any(loom, shuttle))))]
mod tests;

pub(crate) use crate::utils::alloc;
pub(crate) use crate::utils::sync;

#[doc(inline)]
pub use self::params::ConstParams;

#[doc(inline)]
pub use self::params::DefaultParams;

#[doc(inline)]
pub use self::params::Params;

pub use self::error::PoolError;
pub use self::error::TableError;
pub use self::ops::Entry;
pub use self::ops::FnOps;
pub use self::ops::Ops;
pub use self::ops::Record;
pub use self::outcome::Assessment;
pub use self::outcome::Counters;
pub use self::outcome::Found;
pub use self::outcome::Insert;
pub use self::pool::Pool;
pub use self::strategy::Strategy;
pub use self::table::Table;
