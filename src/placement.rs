//! Drag placement on the timetable grid.
//!
//! A drag is reduced to a displacement in whole cells; the resolver turns that into a
//! candidate position for the dragged block. Whether an overlapping candidate is
//! committed is up to the caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::schedule::{PeriodRange, Schedule, find_conflicts};
use crate::store::TableId;
use crate::time_grid::Day;

/// Displacement in grid cells: columns (days) and rows (periods).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDelta {
    pub days: i32,
    pub periods: i32,
}

impl CellDelta {
    pub fn new(days: i32, periods: i32) -> Self {
        Self { days, periods }
    }

    pub fn is_zero(&self) -> bool {
        self.days == 0 && self.periods == 0
    }
}

/// Pixel size of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridMetrics {
    pub cell_width: f32,
    pub cell_height: f32,
}

impl Default for GridMetrics {
    fn default() -> Self {
        Self {
            cell_width: 80.0,
            cell_height: 30.0,
        }
    }
}

/// Anything that can report how far a block was dragged, in cells.
pub trait DragGesture {
    fn cell_delta(&self, metrics: &GridMetrics) -> CellDelta;
}

impl DragGesture for CellDelta {
    fn cell_delta(&self, _metrics: &GridMetrics) -> CellDelta {
        *self
    }
}

/// Pointer positions at drag start and release, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerDrag {
    pub start: (f32, f32),
    pub end: (f32, f32),
}

impl PointerDrag {
    pub fn new(start: (f32, f32), end: (f32, f32)) -> Self {
        Self { start, end }
    }
}

impl DragGesture for PointerDrag {
    /// Snaps to the nearest cell in each direction.
    fn cell_delta(&self, metrics: &GridMetrics) -> CellDelta {
        let snap = |pixels: f32, cell: f32| -> i32 {
            if cell <= 0.0 || !pixels.is_finite() {
                return 0;
            }
            (pixels / cell).round() as i32
        };
        CellDelta {
            days: snap(self.end.0 - self.start.0, metrics.cell_width),
            periods: snap(self.end.1 - self.start.1, metrics.cell_height),
        }
    }
}

/// Candidate position for a dragged block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub index: usize,
    pub day: Day,
    pub range: PeriodRange,
    /// Other blocks on the table the candidate would overlap.
    pub conflicts: Vec<usize>,
    pub moved: bool,
}

impl Placement {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Resolve where the block at `index` lands after moving by `delta`.
///
/// The day is clamped to Mon..Fri and the period range shifts as one block, clamped
/// into the grid. Returns `None` when `index` is out of bounds.
pub fn resolve_drag(schedules: &[Arc<Schedule>], index: usize, delta: CellDelta) -> Option<Placement> {
    let schedule = schedules.get(index)?;
    let (day, range) = if delta.is_zero() {
        (schedule.day, schedule.range)
    } else {
        (schedule.day.offset(delta.days), schedule.range.shifted(delta.periods))
    };
    let moved = day != schedule.day || range != schedule.range;
    let conflicts = find_conflicts(schedules, day, range, Some(index));
    Some(Placement {
        index,
        day,
        range,
        conflicts,
        moved,
    })
}

/// Identifier of a draggable block: `<table-id>:<index>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScheduleHandle {
    pub table_id: TableId,
    pub index: usize,
}

impl ScheduleHandle {
    pub fn new(table_id: impl Into<TableId>, index: usize) -> Self {
        Self {
            table_id: table_id.into(),
            index,
        }
    }
}

impl fmt::Display for ScheduleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table_id, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid schedule handle '{0}'")]
pub struct InvalidHandle(pub String);

impl FromStr for ScheduleHandle {
    type Err = InvalidHandle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (table_id, index) = s.rsplit_once(':').ok_or_else(|| InvalidHandle(s.to_string()))?;
        if table_id.is_empty() {
            return Err(InvalidHandle(s.to_string()));
        }
        let index = index.parse().map_err(|_| InvalidHandle(s.to_string()))?;
        Ok(Self::new(table_id, index))
    }
}
