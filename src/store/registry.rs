use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use super::map::{ScheduleMap, TableId, TableSchedules};

pub type KeysListener = Arc<dyn Fn(&Arc<[TableId]>) + Send + Sync>;
pub type TableListener = Arc<dyn Fn(&TableSchedules) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Topic {
    Keys,
    Table(TableId),
}

#[derive(Default)]
pub(crate) struct SubscriptionRegistry {
    next_id: u64,
    keys: Vec<(u64, KeysListener)>,
    tables: HashMap<TableId, Vec<(u64, TableListener)>>,
}

impl SubscriptionRegistry {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub(crate) fn add_keys_listener(
        registry: &Arc<Mutex<Self>>,
        listener: KeysListener,
    ) -> Subscription {
        let mut guard = registry.lock();
        let id = guard.allocate_id();
        guard.keys.push((id, listener));
        Subscription::new(id, Topic::Keys, registry)
    }

    pub(crate) fn add_table_listener(
        registry: &Arc<Mutex<Self>>,
        table_id: TableId,
        listener: TableListener,
    ) -> Subscription {
        let mut guard = registry.lock();
        let id = guard.allocate_id();
        guard
            .tables
            .entry(table_id.clone())
            .or_default()
            .push((id, listener));
        Subscription::new(id, Topic::Table(table_id), registry)
    }

    fn remove(&mut self, id: u64, topic: &Topic) {
        match topic {
            Topic::Keys => self.keys.retain(|(existing, _)| *existing != id),
            Topic::Table(table_id) => {
                if let Some(listeners) = self.tables.get_mut(table_id) {
                    listeners.retain(|(existing, _)| *existing != id);
                    if listeners.is_empty() {
                        self.tables.remove(table_id);
                    }
                }
            }
        }
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.keys.len() + self.tables.values().map(Vec::len).sum::<usize>()
    }

    /// Listeners whose slice differs between `prev` and `next`, paired with the new value.
    pub(crate) fn collect(
        &self,
        prev: &ScheduleMap,
        next: &ScheduleMap,
        keys: Option<Arc<[TableId]>>,
    ) -> Notifications {
        let keys = keys.map(|snapshot| {
            let listeners = self.keys.iter().map(|(_, l)| Arc::clone(l)).collect();
            (listeners, snapshot)
        });

        let mut tables = Vec::new();
        for (table_id, listeners) in &self.tables {
            let changed = match (prev.get(table_id), next.get(table_id)) {
                (Some(before), Some(after)) => !before.same_as(after),
                (None, None) => false,
                _ => true,
            };
            if !changed {
                continue;
            }
            let value = next.get(table_id).cloned().unwrap_or_default();
            for (_, listener) in listeners {
                tables.push((Arc::clone(listener), value.clone()));
            }
        }

        Notifications { keys, tables }
    }
}

/// Pending listener calls, delivered once the store has released its locks.
pub(crate) struct Notifications {
    keys: Option<(Vec<KeysListener>, Arc<[TableId]>)>,
    tables: Vec<(TableListener, TableSchedules)>,
}

impl Notifications {
    pub(crate) fn deliver(self) {
        if let Some((listeners, snapshot)) = self.keys {
            for listener in listeners {
                listener(&snapshot);
            }
        }
        for (listener, schedules) in self.tables {
            listener(&schedules);
        }
    }
}

/// Keeps a listener registered. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    topic: Topic,
    registry: Weak<Mutex<SubscriptionRegistry>>,
}

impl Subscription {
    fn new(id: u64, topic: Topic, registry: &Arc<Mutex<SubscriptionRegistry>>) -> Self {
        Self {
            id,
            topic,
            registry: Arc::downgrade(registry),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().remove(self.id, &self.topic);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .finish()
    }
}
