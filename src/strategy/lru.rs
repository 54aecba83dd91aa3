use tracing::trace;

use crate::clock::Timestamp;
use crate::index::Bucket;
use crate::ops::Ops;
use crate::ops::Record;
use crate::outcome::Insert;
use crate::params::Params;
use crate::slot::Slot;
use crate::table::Table;

impl<O, R, P> Table<O, R, P>
where
  O: Ops,
  R: Record<Key = O::Key, Value = O::Value>,
  P: Params + ?Sized,
{
  /// LRU insert.
  ///
  /// Takes the first empty bucket or same-key bucket in the window. When
  /// there is neither, the entry with the smallest touch time seen during the
  /// scan is overwritten. Entries are stamped with the current time.
  pub(crate) fn insert_lru(&self, primary: u32, record: R) -> Insert<R> {
    let now: Timestamp = self.ops().now();
    let mut oldest: Option<(Bucket, Timestamp)> = None;

    for bucket in self.probe(primary) {
      let slot: &Slot<R> = self.slot(bucket);
      let mut guard = slot.write();

      if guard.is_none() {
        slot.claim(&mut guard, record, now);
        return Insert::New;
      }

      if let Some(existing) = guard.as_mut()
        && self.ops().compare(existing.key(), record.key())
      {
        self.assign(&record, existing);
        slot.touch(now);
        return Insert::Occupy(record);
      }

      let touched: Timestamp = slot.stamp();

      if oldest.is_none_or(|(_, stamp)| touched < stamp) {
        oldest = Some((bucket, touched));
      }

      self.record_collision();
    }

    // Unreachable while `PROBE` and the bucket count are non-zero.
    let Some((bucket, _)) = oldest else {
      self.record_failure();
      return Insert::Failed(record);
    };

    // The victim may have been touched after the scan released its lock.
    let slot: &Slot<R> = self.slot(bucket);
    let mut guard = slot.write();

    if guard.is_none() {
      slot.claim(&mut guard, record, now);
      return Insert::New;
    }

    if let Some(existing) = guard.as_mut() {
      self.assign(&record, existing);
    }

    slot.set_stamp(now);

    trace!(primary, bucket = bucket.get(), "evicted least recently touched entry");

    Insert::Occupy(record)
  }
}
