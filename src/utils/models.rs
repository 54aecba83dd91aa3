#[cfg(all(loom, shuttle))]
compile_error!("cannot use loom and shuttle at once");

#[cfg(loom)]
pub(crate) mod alloc {
  pub(crate) use ::loom::alloc::Layout;
  pub(crate) use ::loom::alloc::alloc;
  pub(crate) use ::loom::alloc::dealloc;
}

#[cfg(not(loom))]
pub(crate) mod alloc {
  pub(crate) use ::std::alloc::Layout;
  pub(crate) use ::std::alloc::alloc;
  pub(crate) use ::std::alloc::dealloc;
}

#[cfg(not(any(loom, shuttle)))]
pub(crate) mod sync {
  pub(crate) use ::parking_lot::RwLock;
  pub(crate) use ::parking_lot::RwLockReadGuard;
  pub(crate) use ::parking_lot::RwLockWriteGuard;

  pub(crate) mod atomic {
    pub(crate) use ::core::sync::atomic::AtomicU8;
    pub(crate) use ::core::sync::atomic::AtomicU64;
    pub(crate) use ::core::sync::atomic::Ordering;
  }
}

#[cfg(loom)]
pub(crate) mod sync {
  pub(crate) use ::loom::sync::RwLockReadGuard;
  pub(crate) use ::loom::sync::RwLockWriteGuard;

  /// Adapts the poisoning model lock to the `parking_lot` calling convention.
  pub(crate) struct RwLock<T> {
    inner: ::loom::sync::RwLock<T>,
  }

  impl<T> RwLock<T> {
    #[inline]
    pub(crate) fn new(value: T) -> Self {
      Self {
        inner: ::loom::sync::RwLock::new(value),
      }
    }

    #[inline]
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, T> {
      self
        .inner
        .read()
        .unwrap_or_else(::std::sync::PoisonError::into_inner)
    }

    #[inline]
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, T> {
      self
        .inner
        .write()
        .unwrap_or_else(::std::sync::PoisonError::into_inner)
    }
  }

  pub(crate) mod atomic {
    pub(crate) use ::loom::sync::atomic::AtomicU8;
    pub(crate) use ::loom::sync::atomic::AtomicU64;
    pub(crate) use ::loom::sync::atomic::Ordering;
  }
}

#[cfg(shuttle)]
pub(crate) mod sync {
  pub(crate) use ::shuttle::sync::RwLockReadGuard;
  pub(crate) use ::shuttle::sync::RwLockWriteGuard;

  /// Adapts the poisoning model lock to the `parking_lot` calling convention.
  pub(crate) struct RwLock<T> {
    inner: ::shuttle::sync::RwLock<T>,
  }

  impl<T> RwLock<T> {
    #[inline]
    pub(crate) fn new(value: T) -> Self {
      Self {
        inner: ::shuttle::sync::RwLock::new(value),
      }
    }

    #[inline]
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, T> {
      self
        .inner
        .read()
        .unwrap_or_else(::std::sync::PoisonError::into_inner)
    }

    #[inline]
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, T> {
      self
        .inner
        .write()
        .unwrap_or_else(::std::sync::PoisonError::into_inner)
    }
  }

  pub(crate) mod atomic {
    pub(crate) use ::shuttle::sync::atomic::AtomicU8;
    pub(crate) use ::shuttle::sync::atomic::AtomicU64;
    pub(crate) use ::shuttle::sync::atomic::Ordering;
  }
}
