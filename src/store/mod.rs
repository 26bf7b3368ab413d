//! Multi-table state store.
//!
//! The store owns the [`ScheduleMap`]. Every change goes through a pure transform
//! (`prev -> next`), is collapsed by [`settle`] when nothing observable changed, and is
//! then announced only to the subscribers whose slice changed identity: key-set
//! listeners when tables are added, removed or reordered, and per-table listeners when
//! that table's list was replaced.

pub mod keys;
pub mod map;
pub mod reducer;
mod registry;

use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

use crate::lecture::Lecture;
use crate::schedule::{PeriodRange, Schedule};
use crate::time_grid::{Day, Period};

pub use keys::{SequentialKeyGenerator, TableKeyGenerator, TimestampKeyGenerator};
pub use map::{ScheduleMap, TableId, TableSchedules};
pub use reducer::{ScheduleAction, reduce, settle};
pub use registry::{KeysListener, Subscription, TableListener};

use registry::SubscriptionRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("table '{0}' is the last remaining table and cannot be removed")]
    LastTable(TableId),
    #[error("table id '{0}' is already in use")]
    DuplicateTableId(TableId),
}

pub type StoreResult<T> = Result<T, StoreError>;

struct StoreState {
    map: ScheduleMap,
    keys: Arc<[TableId]>,
}

pub struct ScheduleStore {
    state: Mutex<StoreState>,
    registry: Arc<Mutex<SubscriptionRegistry>>,
    key_generator: Box<dyn TableKeyGenerator>,
}

impl ScheduleStore {
    pub fn new(initial: ScheduleMap) -> Self {
        Self::with_key_generator(initial, TimestampKeyGenerator::new())
    }

    pub fn with_key_generator(
        initial: ScheduleMap,
        key_generator: impl TableKeyGenerator + 'static,
    ) -> Self {
        let keys: Arc<[TableId]> = initial.key_list().into();
        Self {
            state: Mutex::new(StoreState { map: initial, keys }),
            registry: Arc::new(Mutex::new(SubscriptionRegistry::default())),
            key_generator: Box::new(key_generator),
        }
    }

    pub fn snapshot(&self) -> ScheduleMap {
        self.state.lock().map.clone()
    }

    /// Table ids in display order. The returned list keeps its identity until the key
    /// set itself changes.
    pub fn table_keys(&self) -> Arc<[TableId]> {
        Arc::clone(&self.state.lock().keys)
    }

    /// The table's current list; empty for unknown ids.
    pub fn table(&self, table_id: &str) -> TableSchedules {
        self.state
            .lock()
            .map
            .get(table_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn contains_table(&self, table_id: &str) -> bool {
        self.state.lock().map.contains(table_id)
    }

    /// False while only one table is left.
    pub fn can_remove_table(&self) -> bool {
        self.state.lock().map.len() > 1
    }

    pub fn subscribe_keys<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<[TableId]>) + Send + Sync + 'static,
    {
        SubscriptionRegistry::add_keys_listener(&self.registry, Arc::new(listener))
    }

    pub fn subscribe_table<F>(&self, table_id: impl Into<TableId>, listener: F) -> Subscription
    where
        F: Fn(&TableSchedules) + Send + Sync + 'static,
    {
        SubscriptionRegistry::add_table_listener(&self.registry, table_id.into(), Arc::new(listener))
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().listener_count()
    }

    /// Apply a map-level transform. Returns whether any observable state changed.
    ///
    /// The transform runs while the store is locked and must not call back into it.
    /// Listeners run after the lock is released.
    pub fn update<F>(&self, transform: F) -> StoreResult<bool>
    where
        F: FnOnce(&ScheduleMap) -> StoreResult<ScheduleMap>,
    {
        let notifications = {
            let mut state = self.state.lock();
            let prev = state.map.clone();
            let next = settle(&prev, transform(&prev)?);
            if next.same_as(&prev) {
                tracing::debug!("schedule map unchanged; no notifications");
                return Ok(false);
            }

            let keys_changed = !prev.has_same_keys(&next);
            if keys_changed {
                state.keys = next.key_list().into();
            }
            state.map = next.clone();

            let keys_snapshot = keys_changed.then(|| Arc::clone(&state.keys));
            self.registry.lock().collect(&prev, &next, keys_snapshot)
        };
        notifications.deliver();
        Ok(true)
    }

    pub fn dispatch(&self, action: ScheduleAction) -> StoreResult<bool> {
        tracing::debug!(?action, "dispatching schedule action");
        self.update(|state| reduce(state, &action))
    }

    /// Replace the whole map.
    pub fn replace(&self, map: ScheduleMap) -> StoreResult<bool> {
        self.update(|_| Ok(map))
    }

    pub fn add_schedule(&self, table_id: &str, schedule: Schedule) -> StoreResult<bool> {
        self.dispatch(ScheduleAction::AddSchedules {
            table_id: table_id.to_string(),
            schedules: vec![schedule],
        })
    }

    /// Place every time segment of `lecture` on the table.
    pub fn add_lecture(&self, table_id: &str, lecture: &Arc<Lecture>) -> StoreResult<bool> {
        self.dispatch(ScheduleAction::AddSchedules {
            table_id: table_id.to_string(),
            schedules: lecture.to_schedules(),
        })
    }

    /// Remove every schedule on `table_id` covering the `day`/`period` cell.
    pub fn delete_by_slot(&self, table_id: &str, day: Day, period: Period) -> StoreResult<bool> {
        self.dispatch(ScheduleAction::DeleteBySlot {
            table_id: table_id.to_string(),
            day,
            period,
        })
    }

    /// Copy `source` under a freshly generated id. `Ok(None)` when `source` is unknown.
    pub fn duplicate_table(&self, source: &str) -> StoreResult<Option<TableId>> {
        let mut created = None;
        self.update(|state| {
            if !state.contains(source) {
                return Ok(state.clone());
            }
            let new_table_id = self.key_generator.next_key(state);
            created = Some(new_table_id.clone());
            reduce(
                state,
                &ScheduleAction::DuplicateTable {
                    source: source.to_string(),
                    new_table_id,
                },
            )
        })?;
        if let Some(table_id) = &created {
            tracing::info!(source, table_id = %table_id, "duplicated table");
        }
        Ok(created)
    }

    pub fn move_schedule(
        &self,
        table_id: &str,
        index: usize,
        day: Day,
        range: PeriodRange,
    ) -> StoreResult<bool> {
        self.dispatch(ScheduleAction::MoveSchedule {
            table_id: table_id.to_string(),
            index,
            day,
            range,
        })
    }

    /// Remove a table. Rejected with [`StoreError::LastTable`] for the sole table.
    pub fn remove_table(&self, table_id: &str) -> StoreResult<bool> {
        let result = self.dispatch(ScheduleAction::RemoveTable {
            table_id: table_id.to_string(),
        });
        if let Err(err) = &result {
            tracing::warn!(table_id, %err, "table removal rejected");
        }
        result
    }
}

impl Default for ScheduleStore {
    fn default() -> Self {
        Self::new(ScheduleMap::new())
    }
}
