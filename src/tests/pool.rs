use core::ptr::NonNull;

use std::rc::Rc;

use crate::alloc::Layout;
use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::pool::Backing;
use crate::pool::Global;
use crate::pool::Object;
use crate::pool::Pool;
use crate::pool::PoolStats;

/// Refuses every allocation.
struct Refuse;

impl Backing for Refuse {
  fn allocate(&mut self, _layout: Layout) -> Option<NonNull<u8>> {
    None
  }

  unsafe fn deallocate(&mut self, _pointer: NonNull<u8>, _layout: Layout) {
    unreachable!("nothing was allocated");
  }
}

/// Serves a fixed number of blocks from the global allocator.
struct Budget {
  blocks: usize,
}

impl Backing for Budget {
  fn allocate(&mut self, layout: Layout) -> Option<NonNull<u8>> {
    if self.blocks == 0 {
      return None;
    }

    self.blocks -= 1;

    Global.allocate(layout)
  }

  unsafe fn deallocate(&mut self, pointer: NonNull<u8>, layout: Layout) {
    // SAFETY: Forwarded from the caller.
    unsafe { Global.deallocate(pointer, layout) }
  }
}

#[repr(align(64))]
struct Aligned([u8; 3]);

fn small() -> PoolConfig {
  PoolConfig::new(4).with_initial(2).with_expand(2)
}

// -----------------------------------------------------------------------------
// Layout
// -----------------------------------------------------------------------------

#[test]
fn test_stride() {
  assert_eq!(Pool::<u8>::new(PoolConfig::new(1)).unwrap().stats().stride, 8);
  assert_eq!(Pool::<u64>::new(PoolConfig::new(1)).unwrap().stats().stride, 8);
  assert_eq!(Pool::<[u8; 9]>::new(PoolConfig::new(1)).unwrap().stats().stride, 16);
  assert_eq!(Pool::<[u8; 24]>::new(PoolConfig::new(1)).unwrap().stats().stride, 32);
  assert_eq!(Pool::<()>::new(PoolConfig::new(1)).unwrap().stats().stride, 8);
  assert_eq!(Pool::<Aligned>::new(PoolConfig::new(1)).unwrap().stats().stride, 64);
}

#[test]
fn test_over_aligned_records() {
  let mut pool: Pool<Aligned> = Pool::new(PoolConfig::new(4)).unwrap();
  let a: Object<Aligned> = pool.get_object(Aligned([1, 2, 3])).unwrap();
  let b: Object<Aligned> = pool.get_object(Aligned([4, 5, 6])).unwrap();

  assert_eq!(Object::addr(&a) % 64, 0);
  assert_eq!(Object::addr(&b) % 64, 0);
  assert_eq!(a.0, [1, 2, 3]);
  assert_eq!(b.0, [4, 5, 6]);

  pool.put_object(a).unwrap();
  pool.put_object(b).unwrap();
}

#[test]
fn test_first_block_is_eager() {
  let pool: Pool<u64> = Pool::new(PoolConfig::new(16)).unwrap();

  assert_eq!(
    pool.stats(),
    PoolStats {
      blocks: 1,
      elements: 16,
      free: 16,
      outstanding: 0,
      bytes: 16 * 8,
      stride: 8,
    },
  );
}

#[test]
fn test_invalid_config() {
  for config in [
    PoolConfig::new(0),
    PoolConfig::new(4).with_initial(0),
    PoolConfig::new(4).with_initial(5),
    PoolConfig::new(4).with_expand(8),
  ] {
    assert!(matches!(
      Pool::<u64>::new(config),
      Err(PoolError::InvalidConfig { .. })
    ));
  }
}

#[test]
fn test_backing_failure() {
  let error: Option<PoolError> = Pool::<u64, Refuse>::with_backing(PoolConfig::new(4), Refuse).err();

  assert_eq!(error, Some(PoolError::Backing { bytes: 32 }));
  assert!(error.is_some_and(|error| error.is_exhausted()));
}

// -----------------------------------------------------------------------------
// Get & Put
// -----------------------------------------------------------------------------

#[test]
fn test_get_put_roundtrip() {
  let mut pool: Pool<u64> = Pool::new(PoolConfig::new(4)).unwrap();
  let mut object: Object<u64> = pool.get_object(5).unwrap();

  assert_eq!(*object, 5);
  *object += 1;
  assert_eq!(*object, 6);
  assert_eq!(pool.stats().outstanding, 1);
  assert_eq!(pool.stats().free, 3);

  pool.put_object(object).unwrap();

  assert_eq!(pool.stats().outstanding, 0);
  assert_eq!(pool.stats().free, 4);
}

#[test]
fn test_free_list_is_lifo() {
  let mut pool: Pool<u64> = Pool::new(PoolConfig::new(4)).unwrap();

  let a: Object<u64> = pool.get_object(1).unwrap();
  let b: Object<u64> = pool.get_object(2).unwrap();
  let address: usize = Object::addr(&b);

  assert_ne!(Object::addr(&a), address);

  pool.put_object(b).unwrap();

  let c: Object<u64> = pool.get_object(3).unwrap();

  assert_eq!(Object::addr(&c), address);

  pool.put_object(a).unwrap();
  pool.put_object(c).unwrap();
}

#[test]
fn test_put_drops_value() {
  let marker: Rc<()> = Rc::new(());
  let mut pool: Pool<Rc<()>> = Pool::new(PoolConfig::new(2)).unwrap();
  let object: Object<Rc<()>> = pool.get_object(Rc::clone(&marker)).unwrap();

  assert_eq!(Rc::strong_count(&marker), 2);

  pool.put_object(object).unwrap();

  assert_eq!(Rc::strong_count(&marker), 1);
}

// -----------------------------------------------------------------------------
// Growth
// -----------------------------------------------------------------------------

#[test]
fn test_growth_ceiling() {
  let mut pool: Pool<u64> = Pool::new(small()).unwrap();
  let mut objects: Vec<Object<u64>> = Vec::new();

  for value in 0..4 {
    objects.push(pool.get_object(value).unwrap());
  }

  assert_eq!(pool.stats().blocks, 2);
  assert_eq!(pool.stats().elements, 4);

  assert_eq!(
    pool.get_object(4).err(),
    Some(PoolError::Exhausted {
      requested: 2,
      maximum: 4,
    }),
  );

  for object in objects {
    pool.put_object(object).unwrap();
  }
}

#[test]
fn test_growth_backing_failure() {
  let backing: Budget = Budget { blocks: 1 };

  let mut pool: Pool<u64, Budget> = Pool::with_backing(small(), backing).unwrap();

  let a: Object<u64> = pool.get_object(1).unwrap();
  let b: Object<u64> = pool.get_object(2).unwrap();
  let error: PoolError = pool.get_object(3).unwrap_err();

  assert_eq!(error, PoolError::Backing { bytes: 16 });
  assert!(error.is_exhausted());

  pool.put_object(a).unwrap();
  pool.put_object(b).unwrap();
}

#[test]
fn test_block_promotion() {
  let mut pool: Pool<u64> = Pool::new(small()).unwrap();

  let a: Object<u64> = pool.get_object(1).unwrap();
  let b: Object<u64> = pool.get_object(2).unwrap();

  // The first block is full; the second is allocated at the front.
  let c: Object<u64> = pool.get_object(3).unwrap();
  let d: Object<u64> = pool.get_object(4).unwrap();

  let address: usize = Object::addr(&a);

  pool.put_object(a).unwrap();

  // Front block is full, so the first block is promoted and serves `e`.
  let e: Object<u64> = pool.get_object(5).unwrap();

  assert_eq!(Object::addr(&e), address);
  assert_eq!(pool.stats().blocks, 2);
  assert_eq!(pool.stats().free, 0);

  for object in [b, c, d, e] {
    pool.put_object(object).unwrap();
  }
}

#[test]
fn test_release_unused() {
  let backing: Budget = Budget { blocks: usize::MAX };

  let mut pool: Pool<u64, Budget> = Pool::with_backing(small(), backing).unwrap();

  let a: Object<u64> = pool.get_object(1).unwrap();
  let b: Object<u64> = pool.get_object(2).unwrap();
  let c: Object<u64> = pool.get_object(3).unwrap();

  assert_eq!(pool.stats().blocks, 2);

  // Partially used blocks stay.
  assert_eq!(pool.release_unused(), 0);

  pool.put_object(c).unwrap();

  assert_eq!(pool.release_unused(), 1);
  assert_eq!(pool.stats().blocks, 1);
  assert_eq!(pool.stats().elements, 2);
  assert_eq!(pool.stats().bytes, 16);

  // Released headroom can be allocated again.
  let c: Object<u64> = pool.get_object(3).unwrap();
  let d: Object<u64> = pool.get_object(4).unwrap();

  assert_eq!(pool.stats().elements, 4);

  for object in [a, b, c, d] {
    pool.put_object(object).unwrap();
  }

  assert_eq!(pool.release_unused(), 2);
  assert_eq!(pool.stats(), PoolStats { stride: 8, ..PoolStats::default() });
}

// -----------------------------------------------------------------------------
// Free & Drop
// -----------------------------------------------------------------------------

#[test]
fn test_free_refused_while_outstanding() {
  let mut pool: Pool<u64> = Pool::new(small()).unwrap();
  let object: Object<u64> = pool.get_object(1).unwrap();
  let before: PoolStats = pool.stats();

  assert_eq!(pool.free(), Err(PoolError::InUse { outstanding: 1 }));
  assert_eq!(pool.stats(), before);
  assert_eq!(*object, 1);

  pool.put_object(object).unwrap();

  assert_eq!(pool.free(), Ok(()));
  assert_eq!(pool.stats().blocks, 0);
  assert_eq!(pool.stats().bytes, 0);
}

#[test]
fn test_free_then_reuse() {
  let mut pool: Pool<u64> = Pool::new(small()).unwrap();

  pool.free().unwrap();

  assert_eq!(pool.stats().bytes, 0);

  let object: Object<u64> = pool.get_object(9).unwrap();

  // Bytes track the live block, not everything ever allocated.
  assert_eq!(pool.stats().blocks, 1);
  assert_eq!(pool.stats().elements, 2);
  assert_eq!(pool.stats().bytes, 16);

  pool.put_object(object).unwrap();
}

#[test]
fn test_drop_keeps_outstanding_records_alive() {
  let mut pool: Pool<u64> = Pool::new(PoolConfig::new(2)).unwrap();
  let object: Object<u64> = pool.get_object(42).unwrap();

  drop(pool);

  // The block was leaked rather than freed.
  assert_eq!(*object, 42);
}

// -----------------------------------------------------------------------------
// Invalid Release
// -----------------------------------------------------------------------------

#[test]
fn test_foreign_release_rejected() {
  let mut owner: Pool<u64> = Pool::new(PoolConfig::new(2)).unwrap();
  let mut other: Pool<u64> = Pool::new(PoolConfig::new(2)).unwrap();

  let object: Object<u64> = owner.get_object(1).unwrap();
  let address: usize = Object::addr(&object);

  assert_eq!(
    other.put_object(object),
    Err(PoolError::InvalidRelease { address }),
  );

  assert_eq!(other.stats().free, 2);
  assert_eq!(owner.stats().outstanding, 1);
}

#[test]
fn test_misaligned_release_rejected() {
  let mut pool: Pool<[u8; 8]> = Pool::new(PoolConfig::new(2)).unwrap();
  let object: Object<[u8; 8]> = pool.get_object([0; 8]).unwrap();
  let pointer: NonNull<[u8; 8]> = Object::into_raw(object);

  // SAFETY: One byte into an eight byte element stays in bounds, and
  // `[u8; 8]` has alignment 1.
  let shifted: NonNull<[u8; 8]> = unsafe { pointer.cast::<u8>().add(1).cast() };

  // SAFETY: Test-only aliasing; the shifted handle is never dereferenced.
  let shifted: Object<[u8; 8]> = unsafe { Object::from_raw(shifted) };
  let address: usize = Object::addr(&shifted);

  assert_eq!(
    pool.put_object(shifted),
    Err(PoolError::InvalidRelease { address }),
  );

  // SAFETY: `pointer` came from `into_raw` and is wrapped once more.
  let object: Object<[u8; 8]> = unsafe { Object::from_raw(pointer) };

  assert_eq!(pool.put_object(object), Ok(()));
}

#[test]
fn test_double_release_rejected() {
  let mut pool: Pool<[u8; 8]> = Pool::new(PoolConfig::new(2)).unwrap();
  let object: Object<[u8; 8]> = pool.get_object([1; 8]).unwrap();
  let pointer: NonNull<[u8; 8]> = Object::into_raw(object);

  // SAFETY: Wrapped once, released once.
  pool.put_object(unsafe { Object::from_raw(pointer) }).unwrap();

  // SAFETY: The stale handle is only used for its address.
  let stale: Object<[u8; 8]> = unsafe { Object::from_raw(pointer) };

  assert!(matches!(
    pool.put_object(stale),
    Err(PoolError::InvalidRelease { .. })
  ));
  assert_eq!(pool.stats().free, 2);
  assert_eq!(pool.stats().outstanding, 0);
}
