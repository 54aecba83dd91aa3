//! Cache-aligned array allocation.
//!
//! Provides [`Array`], the backing storage for table buckets.

use core::marker::PhantomData;
use core::mem::MaybeUninit;
use core::ptr;
use core::ptr::NonNull;
use core::slice;

use crossbeam_utils::CachePadded;

use crate::alloc::Layout;
use crate::alloc::alloc;
use crate::alloc::dealloc;
use crate::error::TableError;
use crate::index::Bucket;

/// The size of a cache line in bytes.
///
/// Bucket arrays start on a cache-line boundary so that neighbouring tables
/// never share the first line of their storage.
pub const CACHE_LINE: usize = align_of::<CachePadded<u8>>();

const _: () = assert!(
  CACHE_LINE.is_power_of_two(),
  "invalid system: `CACHE_LINE` must be a power of two",
);

/// A fixed-size, heap-allocated array with cache-line-aligned storage.
///
/// Unlike `Box<[T]>`, allocation failure is reported instead of aborting.
pub(crate) struct Array<T> {
  nonnull: NonNull<T>,
  length: usize,
  layout: Layout,
  phantom: PhantomData<T>,
}

impl<T> Array<T> {
  /// Creates a new array of `length` elements, initializing each element with
  /// the given function.
  pub(crate) fn new<F>(length: usize, mut init: F) -> Result<Self, TableError>
  where
    F: FnMut(usize) -> T,
  {
    let layout: Layout = Self::layout(length)?;

    // SAFETY: `layout` has a non-zero size as checked by `Self::layout`.
    let raw: *mut u8 = unsafe { alloc(layout) };

    let Some(nonnull) = NonNull::new(raw.cast::<MaybeUninit<T>>()) else {
      return Err(TableError::Allocation {
        bytes: layout.size(),
      });
    };

    let mut index: usize = 0;

    while index < length {
      // SAFETY: `index < length` and the allocation holds `length` elements.
      let uninit: &mut MaybeUninit<T> = unsafe { &mut *nonnull.add(index).as_ptr() };

      uninit.write(init(index));

      index += 1;
    }

    Ok(Self {
      nonnull: nonnull.cast(),
      length,
      layout,
      phantom: PhantomData,
    })
  }

  fn layout(length: usize) -> Result<Layout, TableError> {
    let layout: Layout = Layout::array::<T>(length)
      .and_then(|layout| layout.align_to(CACHE_LINE))
      .map_err(|_| TableError::InvalidCapacity { capacity: length })?;

    if layout.size() == 0 {
      return Err(TableError::InvalidCapacity { capacity: length });
    }

    Ok(layout)
  }

  /// Returns the number of elements.
  #[inline]
  pub(crate) const fn len(&self) -> usize {
    self.length
  }

  /// Returns the number of bytes backing the array.
  #[inline]
  pub(crate) const fn size(&self) -> usize {
    self.layout.size()
  }

  /// Returns a raw pointer to the array.
  #[inline]
  pub(crate) const fn as_ptr(&self) -> *const T {
    self.nonnull.as_ptr()
  }

  #[inline]
  pub(crate) const fn as_slice(&self) -> &[T] {
    // SAFETY: Contiguous allocation of `length` initialized elements.
    unsafe { slice::from_raw_parts(self.as_ptr(), self.length) }
  }

  /// Returns a reference to the element at the given bucket.
  #[inline]
  pub(crate) fn get(&self, bucket: Bucket) -> &T {
    &self.as_slice()[bucket.get()]
  }
}

impl<T> Drop for Array<T> {
  fn drop(&mut self) {
    // SAFETY: All `length` elements were initialized in `new` and are dropped
    // exactly once here; the allocation used `self.layout`.
    unsafe {
      ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.nonnull.as_ptr(), self.length));
      dealloc(self.nonnull.cast().as_ptr(), self.layout);
    }
  }
}

// SAFETY: `Array<T>` owns its elements like `Box<[T]>` does.
unsafe impl<T> Send for Array<T> where T: Send {}

// SAFETY: Shared access only hands out `&T`.
unsafe impl<T> Sync for Array<T> where T: Sync {}
