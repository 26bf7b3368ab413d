use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::Deref;
use std::sync::Arc;

use crate::schedule::Schedule;

pub type TableId = String;

/// The schedule list of one table.
///
/// Cloning is cheap and keeps the same identity; [`TableSchedules::same_as`] compares
/// identity, which is what subscribers are notified on.
#[derive(Debug, Clone, Default)]
pub struct TableSchedules(Arc<Vec<Arc<Schedule>>>);

impl TableSchedules {
    pub fn new(schedules: Vec<Arc<Schedule>>) -> Self {
        Self(Arc::new(schedules))
    }

    pub fn from_schedules(schedules: impl IntoIterator<Item = Schedule>) -> Self {
        Self::new(schedules.into_iter().map(Arc::new).collect())
    }

    pub fn same_as(&self, other: &TableSchedules) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// New list identity holding the same schedule entries.
    pub fn shallow_copy(&self) -> TableSchedules {
        Self::new(self.0.as_ref().clone())
    }

    pub fn to_vec(&self) -> Vec<Arc<Schedule>> {
        self.0.as_ref().clone()
    }
}

impl Deref for TableSchedules {
    type Target = [Arc<Schedule>];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl PartialEq for TableSchedules {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other) || self.0 == other.0
    }
}

impl Serialize for TableSchedules {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TableSchedules {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Arc<Schedule>>::deserialize(deserializer).map(Self::new)
    }
}

/// Ordered table id → schedule list mapping. Insertion order is display order.
#[derive(Debug, Clone, Default)]
pub struct ScheduleMap(Arc<Vec<(TableId, TableSchedules)>>);

impl ScheduleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tables(tables: impl IntoIterator<Item = (TableId, TableSchedules)>) -> Self {
        let mut entries: Vec<(TableId, TableSchedules)> = Vec::new();
        for (id, schedules) in tables {
            match entries.iter_mut().find(|(existing, _)| *existing == id) {
                Some(entry) => entry.1 = schedules,
                None => entries.push((id, schedules)),
            }
        }
        Self(Arc::new(entries))
    }

    pub fn same_as(&self, other: &ScheduleMap) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, table_id: &str) -> bool {
        self.get(table_id).is_some()
    }

    pub fn get(&self, table_id: &str) -> Option<&TableSchedules> {
        self.0
            .iter()
            .find(|(id, _)| id == table_id)
            .map(|(_, schedules)| schedules)
    }

    pub fn keys(&self) -> impl Iterator<Item = &TableId> {
        self.0.iter().map(|(id, _)| id)
    }

    pub fn key_list(&self) -> Vec<TableId> {
        self.keys().cloned().collect()
    }

    pub fn has_same_keys(&self, other: &ScheduleMap) -> bool {
        self.len() == other.len() && self.keys().eq(other.keys())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TableId, &TableSchedules)> {
        self.0.iter().map(|(id, schedules)| (id, schedules))
    }

    /// Copy of the map with `table_id` set to `schedules`. An existing table keeps its
    /// position; a new one is appended. Other tables keep their list identity.
    pub fn with_table(&self, table_id: impl Into<TableId>, schedules: TableSchedules) -> ScheduleMap {
        let table_id = table_id.into();
        let mut entries = self.0.as_ref().clone();
        match entries.iter_mut().find(|(id, _)| *id == table_id) {
            Some(entry) => entry.1 = schedules,
            None => entries.push((table_id, schedules)),
        }
        Self(Arc::new(entries))
    }

    pub fn without_table(&self, table_id: &str) -> ScheduleMap {
        let entries = self
            .0
            .iter()
            .filter(|(id, _)| id != table_id)
            .cloned()
            .collect();
        Self(Arc::new(entries))
    }
}

impl PartialEq for ScheduleMap {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other) || self.0 == other.0
    }
}

impl Serialize for ScheduleMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (id, schedules) in self.iter() {
            map.serialize_entry(id, schedules)?;
        }
        map.end()
    }
}
