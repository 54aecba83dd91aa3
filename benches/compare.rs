use std::collections::HashMap;

use cctab::Entry;
use cctab::Strategy;
use cctab::config::PoolConfig;
use cctab::hash::KeyOps;
use cctab::pool::Object;
use cctab::pool::Pool;
use divan::Bencher;
use divan::bench;
use divan::bench_group;
use divan::black_box;
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;

const OPS: &[usize] = &[1 << 6, 1 << 8, 1 << 10, 1 << 12, 1 << 14, 1 << 16];

const THREADS: &[usize] = &[0, 1, 4, 8, 16];

const FAR: u64 = u64::MAX;

fn fingerprints(count: usize) -> Vec<Vec<u8>> {
  (0..count)
    .map(|index| format!("example.com|Mozilla/5.0|10.0.{}.{}", index >> 8, index & 0xFF).into_bytes())
    .collect()
}

// -----------------------------------------------------------------------------
// Unify APIs for Simplicity
// -----------------------------------------------------------------------------

trait Store: Sized + Send + Sync + 'static {
  fn new(capacity: usize) -> Self;

  fn set(&self, data: &[u8], value: u64) -> bool;

  fn get(&self, data: &[u8]) -> Option<u64>;
}

struct Expiring(cctab::Table<KeyOps<u64>>);

struct Lru(cctab::Table<KeyOps<u64>>);

struct Locked(RwLock<HashMap<Vec<u8>, u64, FxBuildHasher>>);

impl Store for Expiring {
  fn new(capacity: usize) -> Self {
    Self(cctab::Table::new(capacity, Strategy::SelfExpiring, KeyOps::new()).unwrap())
  }

  fn set(&self, data: &[u8], value: u64) -> bool {
    !self.0.insert(data, Entry::vacant(value), FAR).is_failed()
  }

  fn get(&self, data: &[u8]) -> Option<u64> {
    self.0.get(data).map(|found| found.value)
  }
}

impl Store for Lru {
  fn new(capacity: usize) -> Self {
    Self(cctab::Table::new(capacity, Strategy::Lru, KeyOps::new()).unwrap())
  }

  fn set(&self, data: &[u8], value: u64) -> bool {
    !self.0.insert(data, Entry::vacant(value), FAR).is_failed()
  }

  fn get(&self, data: &[u8]) -> Option<u64> {
    self.0.get(data).map(|found| found.value)
  }
}

impl Store for Locked {
  fn new(capacity: usize) -> Self {
    Self(RwLock::new(HashMap::with_capacity_and_hasher(capacity, FxBuildHasher)))
  }

  fn set(&self, data: &[u8], value: u64) -> bool {
    self.0.write().insert(data.to_vec(), value);
    true
  }

  fn get(&self, data: &[u8]) -> Option<u64> {
    self.0.read().get(data).copied()
  }
}

// -----------------------------------------------------------------------------
// Actual Benchmarks
// -----------------------------------------------------------------------------

#[bench_group(name = "ReadSeq", skip_ext_time, threads = THREADS)]
mod read_seq {
  use super::bench;
  use super::*;

  fn bench<T>(bencher: Bencher<'_, '_>, ops: usize)
  where
    T: Store,
  {
    let this: T = T::new(ops);
    let keys: Vec<Vec<u8>> = fingerprints(ops);

    for (index, key) in keys.iter().enumerate() {
      let _stored: bool = this.set(key, index as u64);
    }

    bencher.counter(ops).bench(move || {
      for key in &keys {
        let item: Option<u64> = black_box(this.get(black_box(key)));
        _ = black_box(item);
      }
    });
  }

  #[bench(args = OPS)]
  fn bench_expiring(bencher: Bencher<'_, '_>, ops: usize) {
    bench::<Expiring>(bencher, ops);
  }

  #[bench(args = OPS)]
  fn bench_lru(bencher: Bencher<'_, '_>, ops: usize) {
    bench::<Lru>(bencher, ops);
  }

  #[bench(args = OPS)]
  fn bench_locked(bencher: Bencher<'_, '_>, ops: usize) {
    bench::<Locked>(bencher, ops);
  }
}

#[bench_group(name = "ReadHot", skip_ext_time, threads = THREADS)]
mod read_hot {
  use super::bench;
  use super::*;

  fn bench<T>(bencher: Bencher<'_, '_>, ops: usize)
  where
    T: Store,
  {
    let this: T = T::new(ops);
    let key: Vec<u8> = fingerprints(1).remove(0);

    assert!(this.set(&key, 1));

    bencher.counter(ops).bench(move || {
      for _ in 0..ops {
        let item: Option<u64> = black_box(this.get(black_box(&key)));
        _ = black_box(item.unwrap());
      }
    });
  }

  #[bench(args = OPS)]
  fn bench_expiring(bencher: Bencher<'_, '_>, ops: usize) {
    bench::<Expiring>(bencher, ops);
  }

  #[bench(args = OPS)]
  fn bench_lru(bencher: Bencher<'_, '_>, ops: usize) {
    bench::<Lru>(bencher, ops);
  }

  #[bench(args = OPS)]
  fn bench_locked(bencher: Bencher<'_, '_>, ops: usize) {
    bench::<Locked>(bencher, ops);
  }
}

#[bench_group(name = "InsertSeq", skip_ext_time)]
mod insert_seq {
  use super::bench;
  use super::*;

  fn bench<T>(bencher: Bencher<'_, '_>, ops: usize)
  where
    T: Store,
  {
    let keys: Vec<Vec<u8>> = fingerprints(ops);

    bencher
      .counter(ops)
      .with_inputs(move || T::new(ops))
      .bench_local_refs(|this: &mut T| {
        for (index, key) in keys.iter().enumerate() {
          _ = black_box(this.set(black_box(key), index as u64));
        }
      });
  }

  #[bench(args = OPS)]
  fn bench_expiring(bencher: Bencher<'_, '_>, ops: usize) {
    bench::<Expiring>(bencher, ops);
  }

  #[bench(args = OPS)]
  fn bench_lru(bencher: Bencher<'_, '_>, ops: usize) {
    bench::<Lru>(bencher, ops);
  }

  #[bench(args = OPS)]
  fn bench_locked(bencher: Bencher<'_, '_>, ops: usize) {
    bench::<Locked>(bencher, ops);
  }
}

#[bench_group(name = "PoolChurn", skip_ext_time)]
mod pool_churn {
  use super::*;

  #[bench(args = OPS)]
  fn bench_pool(bencher: Bencher<'_, '_>, ops: usize) {
    bencher
      .counter(ops)
      .with_inputs(move || Pool::<[u64; 4]>::new(PoolConfig::new(ops)).unwrap())
      .bench_local_refs(|pool: &mut Pool<[u64; 4]>| {
        for index in 0..ops {
          let object: Object<[u64; 4]> = pool.get_object(black_box([index as u64; 4])).unwrap();
          pool.put_object(black_box(object)).unwrap();
        }
      });
  }

  #[bench(args = OPS)]
  fn bench_box(bencher: Bencher<'_, '_>, ops: usize) {
    bencher.counter(ops).bench_local(|| {
      for index in 0..ops {
        let object: Box<[u64; 4]> = Box::new(black_box([index as u64; 4]));
        drop(black_box(object));
      }
    });
  }
}

// -----------------------------------------------------------------------------
// Main
// -----------------------------------------------------------------------------

fn main() {
  divan::main();
}
