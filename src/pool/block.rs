use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::alloc::Layout;
use crate::error::PoolError;
use crate::pool::Backing;

/// Terminates a free list.
const END: u32 = u32::MAX;

/// Marks an element that is currently handed out.
const TAKEN: u32 = u32::MAX - 1;

/// Largest element count a block can hold with both sentinels reserved.
pub(crate) const MAX_ELEMENTS: usize = (TAKEN - 1) as usize;

/// A contiguous run of equally sized elements with an intrusive LIFO free
/// list.
///
/// Links live in `next` rather than inside the elements so that free memory
/// is never read and handed-out memory is never written by the pool.
pub(crate) struct Block<T> {
  base: NonNull<u8>,
  layout: Layout,
  shift: u32,
  next: Box<[u32]>,
  head: u32,
  free: u32,
  phantom: PhantomData<T>,
}

impl<T> Block<T> {
  /// Allocates room for `elements` records spaced `stride` bytes apart.
  ///
  /// `stride` must be a power of two no smaller than `T`'s size and
  /// alignment.
  pub(crate) fn new<B>(backing: &mut B, elements: usize, stride: usize) -> Result<Self, PoolError>
  where
    B: Backing + ?Sized,
  {
    debug_assert!(stride.is_power_of_two());
    debug_assert!(elements != 0 && elements <= MAX_ELEMENTS);

    let Some(layout) = elements
      .checked_mul(stride)
      .and_then(|size| Layout::from_size_align(size, align_of::<T>()).ok())
    else {
      return Err(PoolError::InvalidConfig {
        reason: "block size overflows the address space",
      });
    };

    let Some(base) = backing.allocate(layout) else {
      return Err(PoolError::Backing {
        bytes: layout.size(),
      });
    };

    let count: u32 = elements as u32;

    let next: Box<[u32]> = (1..=count)
      .map(|index| if index == count { END } else { index })
      .collect();

    Ok(Self {
      base,
      layout,
      shift: stride.trailing_zeros(),
      next,
      head: 0,
      free: count,
      phantom: PhantomData,
    })
  }

  /// Returns the number of elements.
  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.next.len()
  }

  #[inline]
  pub(crate) const fn size(&self) -> usize {
    self.layout.size()
  }

  #[inline]
  pub(crate) const fn free(&self) -> usize {
    self.free as usize
  }

  #[inline]
  pub(crate) const fn has_free(&self) -> bool {
    self.free != 0
  }

  /// Returns `true` when no element is handed out.
  #[inline]
  pub(crate) fn is_unused(&self) -> bool {
    self.free() == self.len()
  }

  #[inline]
  fn base(&self) -> usize {
    self.base.as_ptr().addr()
  }

  #[inline]
  pub(crate) fn contains(&self, address: usize) -> bool {
    address >= self.base() && address - self.base() < self.size()
  }

  /// Converts an address inside this block into an element index, or `None`
  /// if it does not sit on an element boundary.
  #[inline]
  pub(crate) fn index_of(&self, address: usize) -> Option<u32> {
    let offset: usize = address.wrapping_sub(self.base());

    if offset & ((1 << self.shift) - 1) != 0 {
      return None;
    }

    Some((offset >> self.shift) as u32)
  }

  #[inline]
  pub(crate) fn is_taken(&self, index: u32) -> bool {
    self.next.get(index as usize) == Some(&TAKEN)
  }

  /// Pops the most recently freed element.
  #[inline]
  pub(crate) fn pop(&mut self) -> Option<NonNull<T>> {
    if self.head == END {
      return None;
    }

    let index: u32 = self.head;

    self.head = self.next[index as usize];
    self.next[index as usize] = TAKEN;
    self.free -= 1;

    // SAFETY: `index` is in bounds, so the offset stays inside the block.
    Some(unsafe { self.base.add((index as usize) << self.shift).cast() })
  }

  /// Pushes a handed-out element back onto the free list.
  ///
  /// The element's value must already have been dropped.
  #[inline]
  pub(crate) fn push(&mut self, index: u32) {
    debug_assert!(self.is_taken(index), "Block::push on a free element");

    self.next[index as usize] = self.head;
    self.head = index;
    self.free += 1;
  }

  /// Returns the block's memory to `backing`.
  ///
  /// # Safety
  ///
  /// `backing` must be the allocator this block came from and no element may
  /// still be referenced.
  pub(crate) unsafe fn release<B>(self, backing: &mut B)
  where
    B: Backing + ?Sized,
  {
    // SAFETY: Caller contract.
    unsafe { backing.deallocate(self.base, self.layout) }
  }
}
