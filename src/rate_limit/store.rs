use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::time::Instant;

// Rate record - one per client identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateRecord {
    pub count: u32,
    pub reset_time: Instant, // end of the current window
}

impl RateRecord {
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.reset_time
    }
}

/// Backing table for the rate limiter.
///
/// `update` is the only operation the limiter uses on the request path and
/// must run its closure atomically for the key. `sweep` must never remove a
/// record whose window is still open at `now`.
pub trait RateStore: Send + Sync {
    fn get(&self, key: &str) -> Option<RateRecord>;

    fn set(&self, key: &str, record: RateRecord);

    fn delete(&self, key: &str) -> Option<RateRecord>;

    /// Apply `apply` to the slot for `key` while holding its lock. Setting the
    /// slot to `None` removes the record.
    fn update(&self, key: &str, apply: &mut dyn FnMut(&mut Option<RateRecord>));

    /// Drop every record that expired before `now`, returning how many went.
    fn sweep(&self, now: Instant) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// In-process store, one DashMap shard lock per key group
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<String, RateRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<RateRecord> {
        self.records.get(key).map(|r| *r)
    }

    fn set(&self, key: &str, record: RateRecord) {
        self.records.insert(key.to_string(), record);
    }

    fn delete(&self, key: &str) -> Option<RateRecord> {
        self.records.remove(key).map(|(_, r)| r)
    }

    fn update(&self, key: &str, apply: &mut dyn FnMut(&mut Option<RateRecord>)) {
        // entry() holds the shard write lock until it is dropped
        match self.records.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let mut slot = Some(*occupied.get());
                apply(&mut slot);
                match slot {
                    Some(record) => {
                        occupied.insert(record);
                    }
                    None => {
                        occupied.remove();
                    }
                }
            }
            Entry::Vacant(vacant) => {
                let mut slot = None;
                apply(&mut slot);
                if let Some(record) = slot {
                    vacant.insert(record);
                }
            }
        }
    }

    fn sweep(&self, now: Instant) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired(now));
        before.saturating_sub(self.records.len())
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
