use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use core::ops::Deref;
use core::ops::DerefMut;
use core::ptr::NonNull;

use crate::ops::Record;

/// A record allocated from a [`Pool`].
///
/// Behaves like a `Box<T>` whose memory belongs to the pool. Dropping an
/// `Object` leaks it; hand it back with [`Pool::put_object`] instead, or let a
/// table adopt it.
///
/// [`Pool`]: crate::pool::Pool
/// [`Pool::put_object`]: crate::pool::Pool::put_object
#[must_use = "dropping an `Object` leaks its pool slot"]
pub struct Object<T> {
  pointer: NonNull<T>,
  marker: PhantomData<T>,
}

impl<T> Object<T> {
  /// Wraps a pointer previously obtained from [`Object::into_raw`].
  ///
  /// # Safety
  ///
  /// `pointer` must come from `into_raw` and must not be wrapped twice.
  #[inline]
  pub const unsafe fn from_raw(pointer: NonNull<T>) -> Self {
    Self {
      pointer,
      marker: PhantomData,
    }
  }

  /// Consumes the handle without running `T`'s destructor.
  #[inline]
  pub fn into_raw(this: Self) -> NonNull<T> {
    let this: ManuallyDrop<Self> = ManuallyDrop::new(this);
    this.pointer
  }

  /// Returns the address of the record.
  #[inline]
  pub fn addr(this: &Self) -> usize {
    this.pointer.as_ptr().addr()
  }
}

impl<T> Deref for Object<T> {
  type Target = T;

  #[inline]
  fn deref(&self) -> &T {
    // SAFETY: The pool keeps the block alive while the record is outstanding
    // and the handle is unique.
    unsafe { self.pointer.as_ref() }
  }
}

impl<T> DerefMut for Object<T> {
  #[inline]
  fn deref_mut(&mut self) -> &mut T {
    // SAFETY: As for `deref`; `&mut self` proves exclusivity.
    unsafe { self.pointer.as_mut() }
  }
}

impl<T> Debug for Object<T>
where
  T: Debug,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Debug::fmt(&**self, f)
  }
}

impl<T> Record for Object<T>
where
  T: Record,
{
  type Key = T::Key;
  type Value = T::Value;

  #[inline]
  fn key(&self) -> &Self::Key {
    (**self).key()
  }

  #[inline]
  fn key_mut(&mut self) -> &mut Self::Key {
    (**self).key_mut()
  }

  #[inline]
  fn value(&self) -> &Self::Value {
    (**self).value()
  }

  #[inline]
  fn value_mut(&mut self) -> &mut Self::Value {
    (**self).value_mut()
  }
}

// SAFETY: `Object<T>` owns its `T` like `Box<T>` does.
unsafe impl<T> Send for Object<T> where T: Send {}

// SAFETY: Shared access only hands out `&T`.
unsafe impl<T> Sync for Object<T> where T: Sync {}
