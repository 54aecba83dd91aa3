use core::ptr::NonNull;

use crate::alloc::Layout;
use crate::alloc::alloc;
use crate::alloc::dealloc;

/// The allocator a [`Pool`] carves its blocks from.
///
/// [`Pool`]: crate::pool::Pool
pub trait Backing {
  /// Allocates a block for `layout`, or returns `None` when memory is
  /// unavailable. `layout` always has a non-zero size.
  fn allocate(&mut self, layout: Layout) -> Option<NonNull<u8>>;

  /// Returns a block to the allocator.
  ///
  /// # Safety
  ///
  /// `pointer` must have been returned by [`allocate`](Self::allocate) on
  /// this backing with the same `layout`, and must not be used afterwards.
  unsafe fn deallocate(&mut self, pointer: NonNull<u8>, layout: Layout);
}

/// The global allocator.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct Global;

impl Backing for Global {
  #[inline]
  fn allocate(&mut self, layout: Layout) -> Option<NonNull<u8>> {
    if layout.size() == 0 {
      return None;
    }

    // SAFETY: `layout` has a non-zero size.
    NonNull::new(unsafe { alloc(layout) })
  }

  #[inline]
  unsafe fn deallocate(&mut self, pointer: NonNull<u8>, layout: Layout) {
    // SAFETY: Caller guarantees `pointer` came from `allocate(layout)`.
    unsafe { dealloc(pointer.as_ptr(), layout) }
  }
}
