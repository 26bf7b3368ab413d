use std::sync::Arc;

use super::map::{ScheduleMap, TableId, TableSchedules};
use super::{StoreError, StoreResult};
use crate::schedule::{PeriodRange, Schedule};
use crate::time_grid::{Day, Period};

/// A named transform over the schedule map.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleAction {
    AddSchedules {
        table_id: TableId,
        schedules: Vec<Schedule>,
    },
    DeleteBySlot {
        table_id: TableId,
        day: Day,
        period: Period,
    },
    DuplicateTable {
        source: TableId,
        new_table_id: TableId,
    },
    MoveSchedule {
        table_id: TableId,
        index: usize,
        day: Day,
        range: PeriodRange,
    },
    RemoveTable {
        table_id: TableId,
    },
}

/// Apply `action` to `state` without side effects.
///
/// Actions naming an unknown table return `state` itself. Tables an action does not
/// touch keep their list identity in the result.
pub fn reduce(state: &ScheduleMap, action: &ScheduleAction) -> StoreResult<ScheduleMap> {
    match action {
        ScheduleAction::AddSchedules {
            table_id,
            schedules,
        } => {
            let Some(current) = state.get(table_id) else {
                return Ok(state.clone());
            };
            if schedules.is_empty() {
                return Ok(state.clone());
            }
            let mut next = current.to_vec();
            next.extend(schedules.iter().cloned().map(Arc::new));
            Ok(state.with_table(table_id.clone(), TableSchedules::new(next)))
        }
        ScheduleAction::DeleteBySlot {
            table_id,
            day,
            period,
        } => {
            let Some(current) = state.get(table_id) else {
                return Ok(state.clone());
            };
            let kept: Vec<Arc<Schedule>> = current
                .iter()
                .filter(|schedule| !schedule.occupies(*day, *period))
                .cloned()
                .collect();
            if kept.len() == current.len() {
                return Ok(state.clone());
            }
            Ok(state.with_table(table_id.clone(), TableSchedules::new(kept)))
        }
        ScheduleAction::DuplicateTable {
            source,
            new_table_id,
        } => {
            let Some(current) = state.get(source) else {
                return Ok(state.clone());
            };
            if state.contains(new_table_id) {
                return Err(StoreError::DuplicateTableId(new_table_id.clone()));
            }
            Ok(state.with_table(new_table_id.clone(), current.shallow_copy()))
        }
        ScheduleAction::MoveSchedule {
            table_id,
            index,
            day,
            range,
        } => {
            let Some(current) = state.get(table_id) else {
                return Ok(state.clone());
            };
            let Some(schedule) = current.get(*index) else {
                return Ok(state.clone());
            };
            if schedule.day == *day && schedule.range == *range {
                return Ok(state.clone());
            }
            let mut next = current.to_vec();
            next[*index] = Arc::new(schedule.placed_at(*day, *range));
            Ok(state.with_table(table_id.clone(), TableSchedules::new(next)))
        }
        ScheduleAction::RemoveTable { table_id } => {
            if !state.contains(table_id) {
                return Ok(state.clone());
            }
            if state.len() <= 1 {
                return Err(StoreError::LastTable(table_id.clone()));
            }
            Ok(state.without_table(table_id))
        }
    }
}

/// Collapse `next` back onto `prev` when nothing observable changed.
///
/// Returns `prev` when `next` is the same map, or when it has the same keys in the same
/// order and every table list is the same identity as before.
pub fn settle(prev: &ScheduleMap, next: ScheduleMap) -> ScheduleMap {
    if next.same_as(prev) {
        return next;
    }
    let unchanged = prev.has_same_keys(&next)
        && prev.iter().zip(next.iter()).all(|((_, before), (_, after))| before.same_as(after));
    if unchanged {
        tracing::trace!("transform produced an equivalent map; keeping previous state");
        prev.clone()
    } else {
        next
    }
}
