use chrono::{Duration, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Grid row index. Valid periods are `FIRST_PERIOD..=LAST_PERIOD`.
pub type Period = u8;

pub const FIRST_PERIOD: Period = 1;
pub const LAST_PERIOD: Period = 24;
/// Periods after this one are the longer evening slots.
pub const LAST_DAYTIME_PERIOD: Period = 18;

const DAYTIME_SLOT_MINUTES: i64 = 30;
const EVENING_SLOT_MINUTES: i64 = 50;
const EVENING_STRIDE_MINUTES: i64 = 55;

/// One header row plus one row per period.
pub const GRID_ROWS: usize = 1 + LAST_PERIOD as usize;
/// One header column plus one column per day.
pub const GRID_COLUMNS: usize = 1 + Day::ALL.len();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
}

impl Day {
    pub const ALL: [Day; 5] = [Day::Mon, Day::Tue, Day::Wed, Day::Thu, Day::Fri];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Day for a zero-based grid column.
    pub fn from_index(index: usize) -> Option<Day> {
        Self::ALL.get(index).copied()
    }

    /// `None` for weekend days, which have no grid column.
    pub fn from_weekday(weekday: Weekday) -> Option<Day> {
        Self::from_index(weekday.num_days_from_monday() as usize)
    }

    pub fn label(self) -> &'static str {
        match self {
            Day::Mon => "Mon",
            Day::Tue => "Tue",
            Day::Wed => "Wed",
            Day::Thu => "Thu",
            Day::Fri => "Fri",
        }
    }

    /// Move `delta` columns, clamping at the first and last day instead of wrapping.
    pub fn offset(self, delta: i32) -> Day {
        let last = (Self::ALL.len() - 1) as i64;
        let target = (self.index() as i64 + delta as i64).clamp(0, last);
        Self::ALL[target as usize]
    }
}

impl From<Day> for Weekday {
    fn from(day: Day) -> Self {
        match day {
            Day::Mon => Weekday::Mon,
            Day::Tue => Weekday::Tue,
            Day::Wed => Weekday::Wed,
            Day::Thu => Weekday::Thu,
            Day::Fri => Weekday::Fri,
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown day '{0}'")]
pub struct UnknownDay(pub String);

impl FromStr for Day {
    type Err = UnknownDay;

    /// Accepts English abbreviations and names, single-letter codes (M T W R F)
    /// and the Korean weekday characters used by the catalog data.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        let day = match token {
            "M" | "월" => Day::Mon,
            "T" | "화" => Day::Tue,
            "W" | "수" => Day::Wed,
            "R" | "목" => Day::Thu,
            "F" | "금" => Day::Fri,
            _ => match token.to_ascii_lowercase().as_str() {
                "mon" | "monday" => Day::Mon,
                "tue" | "tues" | "tuesday" => Day::Tue,
                "wed" | "wednesday" => Day::Wed,
                "thu" | "thur" | "thurs" | "thursday" => Day::Thu,
                "fri" | "friday" => Day::Fri,
                _ => return Err(UnknownDay(token.to_string())),
            },
        };
        Ok(day)
    }
}

pub fn is_valid_period(period: Period) -> bool {
    (FIRST_PERIOD..=LAST_PERIOD).contains(&period)
}

pub fn is_evening(period: Period) -> bool {
    period > LAST_DAYTIME_PERIOD && period <= LAST_PERIOD
}

/// All periods of the grid, top to bottom.
pub fn periods() -> impl Iterator<Item = Period> {
    FIRST_PERIOD..=LAST_PERIOD
}

fn base_time() -> NaiveTime {
    NaiveTime::MIN + Duration::hours(9)
}

/// Offset of the period start from the 09:00 base, in minutes.
fn start_offset_minutes(period: Period) -> i64 {
    let period = period as i64;
    let daytime = LAST_DAYTIME_PERIOD as i64;
    if period <= daytime {
        (period - 1) * DAYTIME_SLOT_MINUTES
    } else {
        daytime * DAYTIME_SLOT_MINUTES + (period - daytime - 1) * EVENING_STRIDE_MINUTES
    }
}

fn slot_minutes(period: Period) -> i64 {
    if is_evening(period) {
        EVENING_SLOT_MINUTES
    } else {
        DAYTIME_SLOT_MINUTES
    }
}

pub fn period_start(period: Period) -> Option<NaiveTime> {
    if !is_valid_period(period) {
        return None;
    }
    Some(base_time() + Duration::minutes(start_offset_minutes(period)))
}

pub fn period_end(period: Period) -> Option<NaiveTime> {
    let start = period_start(period)?;
    Some(start + Duration::minutes(slot_minutes(period)))
}

/// Render a period as `HH:MM~HH:MM`, e.g. period 1 is `09:00~09:30`.
pub fn period_to_label(period: Period) -> Option<String> {
    let start = period_start(period)?;
    let end = period_end(period)?;
    Some(format!("{}~{}", start.format("%H:%M"), end.format("%H:%M")))
}

/// Inverse of [`period_to_label`] over the fixed grid; anything else is `None`.
pub fn parse_time_label(label: &str) -> Option<Period> {
    let (start, end) = label.trim().split_once('~')?;
    let start = NaiveTime::parse_from_str(start.trim(), "%H:%M").ok()?;
    let end = NaiveTime::parse_from_str(end.trim(), "%H:%M").ok()?;
    periods().find(|&p| period_start(p) == Some(start) && period_end(p) == Some(end))
}

/// Labels for every grid row, index 0 being period 1.
pub fn period_labels() -> Vec<String> {
    periods().filter_map(period_to_label).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evening_periods_use_fifty_five_minute_stride() {
        assert_eq!(period_to_label(18).as_deref(), Some("17:30~18:00"));
        assert_eq!(period_to_label(20).as_deref(), Some("18:55~19:45"));
        assert_eq!(period_to_label(24).as_deref(), Some("22:35~23:25"));
    }

    #[test]
    fn out_of_range_periods_have_no_label() {
        assert_eq!(period_to_label(0), None);
        assert_eq!(period_to_label(25), None);
    }
}
