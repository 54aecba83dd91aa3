//! A growable slab pool of fixed-size records.
//!
//! Records are carved out of large blocks obtained from a [`Backing`]
//! allocator. Each block keeps its own LIFO free list; the block that served
//! the last allocation sits at the front so the common case pops in constant
//! time. Blocks are only returned to the backing allocator by
//! [`Pool::release_unused`], [`Pool::free`], or dropping the pool.
//!
//! A pool is owned by a single worker (`Send`, not `Sync`). Its records are
//! `Send` and may outlive their stay in the worker's hands by being adopted
//! into a shared table; the pool therefore never frees a block while any of
//! its records is outstanding.
//!
//! ```
//! use cctab::pool::Pool;
//! use cctab::config::PoolConfig;
//!
//! let mut pool: Pool<u64> = Pool::new(PoolConfig::new(4)).unwrap();
//!
//! let object = pool.get_object(7).unwrap();
//! assert_eq!(*object, 7);
//!
//! pool.put_object(object).unwrap();
//! assert_eq!(pool.stats().outstanding, 0);
//! ```

mod backing;
mod block;
mod object;

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::mem;
use core::ptr;
use core::ptr::NonNull;

use tracing::debug;
use tracing::warn;

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::pool::block::Block;

pub use self::backing::Backing;
pub use self::backing::Global;
pub use self::object::Object;

pub(crate) use self::block::MAX_ELEMENTS;

// -----------------------------------------------------------------------------
// Pool Stats
// -----------------------------------------------------------------------------

/// A snapshot of a pool's bookkeeping.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolStats {
  /// Blocks currently allocated.
  pub blocks: usize,
  /// Records the current blocks can hold.
  pub elements: usize,
  /// Records sitting on the free lists of all blocks.
  pub free: usize,
  /// Records handed out and not yet returned.
  pub outstanding: usize,
  /// Bytes currently held from the backing allocator.
  ///
  /// This is the live footprint, not a running total: it shrinks when
  /// [`Pool::release_unused`] or [`Pool::free`] hands blocks back.
  pub bytes: usize,
  /// Distance in bytes between neighbouring records.
  pub stride: usize,
}

// -----------------------------------------------------------------------------
// Pool
// -----------------------------------------------------------------------------

/// A single-owner slab allocator for `T`.
pub struct Pool<T, B = Global>
where
  B: Backing,
{
  /// Index 0 is the block allocations are served from.
  blocks: Vec<Block<T>>,
  backing: B,
  config: PoolConfig,
  stride: usize,
  elements: usize,
  bytes: usize,
  outstanding: usize,
}

impl<T> Pool<T, Global> {
  /// Creates a pool on the global allocator.
  ///
  /// # Errors
  ///
  /// See [`Pool::with_backing`].
  #[inline]
  pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
    Self::with_backing(config, Global)
  }
}

impl<T, B> Pool<T, B>
where
  B: Backing,
{
  /// Creates a pool and eagerly allocates its first block of
  /// `config.initial()` records.
  ///
  /// # Errors
  ///
  /// - [`PoolError::InvalidConfig`] if `config` is inconsistent.
  /// - [`PoolError::Backing`] if the first block cannot be allocated.
  pub fn with_backing(config: PoolConfig, backing: B) -> Result<Self, PoolError> {
    config.validate()?;

    let mut this: Self = Self {
      blocks: Vec::new(),
      backing,
      config,
      stride: Self::stride(),
      elements: 0,
      bytes: 0,
      outstanding: 0,
    };

    this.grow(config.initial())?;

    Ok(this)
  }

  /// Record spacing: `T`'s size rounded up to 8, then to a power of two, and
  /// never below `T`'s alignment. Address to index conversion is a shift.
  #[inline]
  const fn stride() -> usize {
    let size: usize = size_of::<T>().next_multiple_of(8);
    let size: usize = if size == 0 { 8 } else { size };
    let size: usize = size.next_power_of_two();

    if size < align_of::<T>() {
      align_of::<T>()
    } else {
      size
    }
  }

  /// The configuration the pool was created with.
  #[inline]
  pub const fn config(&self) -> &PoolConfig {
    &self.config
  }

  /// Takes a snapshot of the pool's bookkeeping.
  pub fn stats(&self) -> PoolStats {
    PoolStats {
      blocks: self.blocks.len(),
      elements: self.elements,
      free: self.blocks.iter().map(Block::free).sum(),
      outstanding: self.outstanding,
      bytes: self.bytes,
      stride: self.stride,
    }
  }

  // ---------------------------------------------------------------------------
  // Allocation
  // ---------------------------------------------------------------------------

  /// Moves `value` into a free record.
  ///
  /// # Errors
  ///
  /// Returns [`PoolError::Exhausted`] if another block would exceed
  /// `max_elements`, or [`PoolError::Backing`] if the backing allocator
  /// refused one. `value` is dropped in either case.
  pub fn get_object(&mut self, value: T) -> Result<Object<T>, PoolError> {
    let pointer: NonNull<T> = if let Some(pointer) = self.pop() {
      pointer
    } else {
      self.grow(self.config.expand())?;
      self.pop().ok_or(PoolError::Exhausted {
        requested: 1,
        maximum: self.config.max_elements,
      })?
    };

    // SAFETY: `pop` returns an unused, aligned, in-bounds element.
    unsafe { pointer.write(value) };

    self.outstanding += 1;

    // SAFETY: The element was just initialized and is handed out once.
    Ok(unsafe { Object::from_raw(pointer) })
  }

  /// Drops a record's value and returns its memory to the free list.
  ///
  /// # Errors
  ///
  /// Returns [`PoolError::InvalidRelease`] if the record does not belong to
  /// this pool, is not on a record boundary, or is already free. The record
  /// is then forgotten: neither dropped nor reused.
  pub fn put_object(&mut self, object: Object<T>) -> Result<(), PoolError> {
    let address: usize = Object::addr(&object);
    let pointer: NonNull<T> = Object::into_raw(object);

    let Some(block) = self.blocks.iter_mut().find(|block| block.contains(address)) else {
      return Err(Self::rejected(address, "address outside every block"));
    };

    let Some(index) = block.index_of(address) else {
      return Err(Self::rejected(address, "address not on a record boundary"));
    };

    if !block.is_taken(index) {
      return Err(Self::rejected(address, "record is already free"));
    }

    // SAFETY: The element is handed out and initialized; the handle was the
    // only owner.
    unsafe { ptr::drop_in_place(pointer.as_ptr()) };

    block.push(index);

    self.outstanding -= 1;

    Ok(())
  }

  /// Returns every block with no outstanding records to the backing
  /// allocator and returns how many were released.
  ///
  /// Released headroom counts towards `max_elements` again.
  pub fn release_unused(&mut self) -> usize {
    let unused: Vec<Block<T>> = self.blocks.extract_if(.., |block| block.is_unused()).collect();
    let count: usize = unused.len();

    for block in unused {
      self.release(block);
    }

    if count != 0 {
      debug!(
        released = count,
        blocks = self.blocks.len(),
        elements = self.elements,
        "released unused pool blocks"
      );
    }

    count
  }

  /// Returns all blocks to the backing allocator.
  ///
  /// # Errors
  ///
  /// Returns [`PoolError::InUse`] and leaves the pool untouched while any
  /// record is outstanding.
  pub fn free(&mut self) -> Result<(), PoolError> {
    if self.outstanding != 0 {
      warn!(outstanding = self.outstanding, "refusing to free pool with outstanding records");

      return Err(PoolError::InUse {
        outstanding: self.outstanding,
      });
    }

    for block in mem::take(&mut self.blocks) {
      self.release(block);
    }

    Ok(())
  }

  // ---------------------------------------------------------------------------
  // Internals
  // ---------------------------------------------------------------------------

  /// Pops from the front block, promoting the first later block with room
  /// when the front one is full.
  fn pop(&mut self) -> Option<NonNull<T>> {
    if let Some(pointer) = self.blocks.first_mut().and_then(Block::pop) {
      return Some(pointer);
    }

    let position: usize = self.blocks.iter().position(Block::has_free)?;

    self.blocks[..=position].rotate_right(1);
    self.blocks[0].pop()
  }

  /// Allocates a block of `elements` records at the front.
  fn grow(&mut self, elements: usize) -> Result<(), PoolError> {
    let maximum: usize = self.config.max_elements;

    if self.elements.saturating_add(elements) > maximum {
      warn!(
        requested = elements,
        allocated = self.elements,
        maximum,
        "pool exhausted"
      );

      return Err(PoolError::Exhausted {
        requested: elements,
        maximum,
      });
    }

    let block: Block<T> = Block::new(&mut self.backing, elements, self.stride).inspect_err(|error| {
      warn!(%error, "pool block allocation failed");
    })?;

    self.elements += block.len();
    self.bytes += block.size();

    debug!(
      elements = block.len(),
      bytes = block.size(),
      blocks = self.blocks.len() + 1,
      "allocated pool block"
    );

    self.blocks.insert(0, block);

    Ok(())
  }

  #[inline]
  fn release(&mut self, block: Block<T>) {
    self.elements -= block.len();
    self.bytes -= block.size();

    // SAFETY: Every block came from `self.backing` and is unused: either it
    // was selected as such or the pool has no outstanding records.
    unsafe { block.release(&mut self.backing) };
  }

  #[cold]
  fn rejected(address: usize, reason: &'static str) -> PoolError {
    warn!(address, reason, "rejected record release");

    PoolError::InvalidRelease { address }
  }
}

impl<T, B> Drop for Pool<T, B>
where
  B: Backing,
{
  fn drop(&mut self) {
    if self.outstanding == 0 {
      for block in mem::take(&mut self.blocks) {
        self.release(block);
      }

      return;
    }

    // Outstanding records may be held by a table; keep their memory alive.
    warn!(
      outstanding = self.outstanding,
      blocks = self.blocks.len(),
      bytes = self.bytes,
      "leaking pool blocks with outstanding records"
    );
  }
}

impl<T, B> Debug for Pool<T, B>
where
  B: Backing,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Pool")
      .field("config", &self.config)
      .field("stats", &self.stats())
      .finish_non_exhaustive()
  }
}

// SAFETY: The pool exclusively owns its blocks; values only move in and out
// through `&mut self`.
unsafe impl<T, B> Send for Pool<T, B>
where
  T: Send,
  B: Backing + Send,
{
}
