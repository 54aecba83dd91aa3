use tracing::trace;

use crate::clock::Timestamp;
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
  /// Self-expiring insert.
  ///
  /// The first bucket in the window that is empty, holds the same key, or
  /// holds an expired entry wins. A window of live foreign entries fails.
  pub(crate) fn insert_expiring(&self, primary: u32, record: R, expiry: Timestamp) -> Insert<R> {
    let now: Timestamp = self.ops().now();

    for bucket in self.probe(primary) {
      let slot: &Slot<R> = self.slot(bucket);
      let mut guard = slot.write();

      if guard.is_none() {
        slot.claim(&mut guard, record, expiry);
        return Insert::New;
      }

      if let Some(existing) = guard.as_mut()
        && (now >= slot.stamp() || self.ops().compare(existing.key(), record.key()))
      {
        self.assign(&record, existing);
        slot.set_stamp(expiry);
        return Insert::Occupy(record);
      }

      self.record_collision();
    }

    self.record_failure();

    trace!(primary, "probe window full of live entries");

    Insert::Failed(record)
  }
}
