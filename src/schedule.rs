use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::lecture::Lecture;
use crate::time_grid::{Day, FIRST_PERIOD, LAST_PERIOD, Period, is_valid_period};

/// Background colours assigned to distinct lectures within one table.
pub const LECTURE_PALETTE: [&str; 6] = ["#fdd", "#ffd", "#dff", "#ddf", "#fdf", "#dfd"];

/// A contiguous, ascending run of periods inside the grid.
///
/// Serialized as the explicit period list (`[1, 2, 3]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Period>", into = "Vec<Period>")]
pub struct PeriodRange {
    first: Period,
    last: Period,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("periods {0:?} are not a contiguous run within {lo}..={hi}", lo = FIRST_PERIOD, hi = LAST_PERIOD)]
pub struct InvalidPeriodRange(pub Vec<Period>);

impl PeriodRange {
    pub fn new(first: Period, last: Period) -> Option<Self> {
        if is_valid_period(first) && is_valid_period(last) && first <= last {
            Some(Self { first, last })
        } else {
            None
        }
    }

    pub fn single(period: Period) -> Option<Self> {
        Self::new(period, period)
    }

    /// Build from periods given in any order. Duplicates are tolerated, gaps are not.
    pub fn from_periods(periods: &[Period]) -> Option<Self> {
        let mut sorted = periods.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let first = *sorted.first()?;
        let last = *sorted.last()?;
        if (last - first) as usize + 1 != sorted.len() {
            return None;
        }
        Self::new(first, last)
    }

    pub fn first(&self) -> Period {
        self.first
    }

    pub fn last(&self) -> Period {
        self.last
    }

    pub fn len(&self) -> usize {
        (self.last - self.first) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = Period> {
        self.first..=self.last
    }

    pub fn to_vec(&self) -> Vec<Period> {
        self.iter().collect()
    }

    pub fn contains(&self, period: Period) -> bool {
        (self.first..=self.last).contains(&period)
    }

    pub fn intersects(&self, other: &PeriodRange) -> bool {
        self.first <= other.last && other.first <= self.last
    }

    /// Shift the whole run by `delta` periods, clamped so it stays inside the grid.
    /// The length never changes.
    pub fn shifted(&self, delta: i32) -> PeriodRange {
        let lowest = FIRST_PERIOD as i64 - self.first as i64;
        let highest = LAST_PERIOD as i64 - self.last as i64;
        let delta = (delta as i64).clamp(lowest, highest);
        PeriodRange {
            first: (self.first as i64 + delta) as Period,
            last: (self.last as i64 + delta) as Period,
        }
    }
}

impl TryFrom<Vec<Period>> for PeriodRange {
    type Error = InvalidPeriodRange;

    fn try_from(periods: Vec<Period>) -> Result<Self, Self::Error> {
        Self::from_periods(&periods).ok_or(InvalidPeriodRange(periods))
    }
}

impl From<PeriodRange> for Vec<Period> {
    fn from(range: PeriodRange) -> Self {
        range.to_vec()
    }
}

/// One placed occurrence of a lecture on a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub lecture: Arc<Lecture>,
    pub day: Day,
    pub range: PeriodRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

impl Schedule {
    pub fn new(lecture: Arc<Lecture>, day: Day, range: PeriodRange, room: Option<String>) -> Self {
        Self {
            lecture,
            day,
            range,
            room,
        }
    }

    /// Same lecture and room at another position.
    pub fn placed_at(&self, day: Day, range: PeriodRange) -> Schedule {
        Schedule {
            lecture: Arc::clone(&self.lecture),
            day,
            range,
            room: self.room.clone(),
        }
    }

    /// True when the block covers the given grid cell. Used for delete-by-slot.
    pub fn occupies(&self, day: Day, period: Period) -> bool {
        self.day == day && self.range.contains(period)
    }
}

/// Two occurrences overlap when they share a day and at least one period.
pub fn overlaps(a: &Schedule, b: &Schedule) -> bool {
    a.day == b.day && a.range.intersects(&b.range)
}

/// Indices of schedules that a block at `day`/`range` would overlap, ignoring `exclude`.
pub fn find_conflicts<S>(
    schedules: &[S],
    day: Day,
    range: PeriodRange,
    exclude: Option<usize>,
) -> Vec<usize>
where
    S: AsRef<Schedule>,
{
    schedules
        .iter()
        .enumerate()
        .filter(|(idx, _)| Some(*idx) != exclude)
        .filter(|(_, schedule)| {
            let schedule = schedule.as_ref();
            schedule.day == day && schedule.range.intersects(&range)
        })
        .map(|(idx, _)| idx)
        .collect()
}

impl AsRef<Schedule> for Schedule {
    fn as_ref(&self) -> &Schedule {
        self
    }
}

/// Colour per lecture id, assigned in order of first appearance.
pub fn lecture_palette<S>(schedules: &[S]) -> HashMap<String, &'static str>
where
    S: AsRef<Schedule>,
{
    let mut colours = HashMap::new();
    for schedule in schedules {
        let id = &schedule.as_ref().lecture.id;
        if !colours.contains_key(id) {
            let colour = LECTURE_PALETTE[colours.len() % LECTURE_PALETTE.len()];
            colours.insert(id.clone(), colour);
        }
    }
    colours
}
