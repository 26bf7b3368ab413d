use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::map::{ScheduleMap, TableId};

/// Source of fresh table ids for duplicated tables.
pub trait TableKeyGenerator: Send + Sync {
    /// A key not present in `existing`.
    fn next_key(&self, existing: &ScheduleMap) -> TableId;
}

/// `schedule-<unix millis>`, with a `-<seq>` suffix when that key is already taken
/// (several duplicates inside the same millisecond).
#[derive(Debug, Default)]
pub struct TimestampKeyGenerator {
    sequence: AtomicU64,
}

impl TimestampKeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TableKeyGenerator for TimestampKeyGenerator {
    fn next_key(&self, existing: &ScheduleMap) -> TableId {
        let base = format!("schedule-{}", Utc::now().timestamp_millis());
        if !existing.contains(&base) {
            return base;
        }
        loop {
            let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
            let candidate = format!("{base}-{seq}");
            if !existing.contains(&candidate) {
                return candidate;
            }
        }
    }
}

/// `<prefix>-1`, `<prefix>-2`, ... skipping keys already in use.
#[derive(Debug)]
pub struct SequentialKeyGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialKeyGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl TableKeyGenerator for SequentialKeyGenerator {
    fn next_key(&self, existing: &ScheduleMap) -> TableId {
        loop {
            let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
            let candidate = format!("{}-{n}", self.prefix);
            if !existing.contains(&candidate) {
                return candidate;
            }
        }
    }
}
