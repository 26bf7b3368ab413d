use once_cell::sync::OnceCell;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

use crate::schedule::{PeriodRange, Schedule};
use crate::time_grid::{Day, Period};

/// Separator between segments inside a raw schedule string.
pub const SEGMENT_DELIMITER: &str = "<p>";

/// A catalog course record. Immutable once fetched and shared through `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lecture {
    pub id: String,
    pub title: String,
    #[serde(deserialize_with = "credits_from_text_or_number")]
    pub credits: String,
    pub major: String,
    pub grade: u8,
    pub schedule: String,
    #[serde(skip)]
    segments: OnceCell<Vec<Segment>>,
}

/// One `(day, range, room)` triple decoded from a lecture's raw schedule string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub day: Day,
    pub range: PeriodRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

impl PartialEq for Lecture {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.credits == other.credits
            && self.major == other.major
            && self.grade == other.grade
            && self.schedule == other.schedule
    }
}

impl Lecture {
    pub fn new(id: impl Into<String>, title: impl Into<String>, schedule: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            credits: String::new(),
            major: String::new(),
            grade: 1,
            schedule: schedule.into(),
            segments: OnceCell::new(),
        }
    }

    pub fn with_credits(mut self, credits: impl Into<String>) -> Self {
        self.credits = credits.into();
        self
    }

    pub fn with_major(mut self, major: impl Into<String>) -> Self {
        self.major = major.into();
        self
    }

    pub fn with_grade(mut self, grade: u8) -> Self {
        self.grade = grade;
        self
    }

    /// Numeric credit value, read from the leading numeric part of the raw field
    /// (`"3"`, `"2.5"`, `"3학점"`).
    pub fn credit_value(&self) -> Option<f64> {
        let trimmed = self.credits.trim();
        let end = trimmed
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
            .map(|(idx, _)| idx)
            .unwrap_or(trimmed.len());
        trimmed[..end].parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Decoded time segments, parsed on first access and cached for the lifetime
    /// of the lecture.
    pub fn segments(&self) -> &[Segment] {
        self.segments.get_or_init(|| parse_schedule(&self.schedule))
    }

    pub fn meets_on(&self, day: Day) -> bool {
        self.segments().iter().any(|segment| segment.day == day)
    }

    pub fn meets_during(&self, period: Period) -> bool {
        self.segments().iter().any(|segment| segment.range.contains(period))
    }

    /// Expand a shared lecture into one placeable schedule per segment.
    pub fn to_schedules(self: &Arc<Self>) -> Vec<Schedule> {
        self.segments()
            .iter()
            .map(|segment| {
                Schedule::new(Arc::clone(self), segment.day, segment.range, segment.room.clone())
            })
            .collect()
    }
}

fn credits_from_text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCredits {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match RawCredits::deserialize(deserializer)? {
        RawCredits::Text(text) => text,
        RawCredits::Integer(value) => value.to_string(),
        RawCredits::Float(value) => value.to_string(),
    })
}

/// Decode a raw schedule string such as `"Mon1,2,3/101"` or
/// `"월1~2(공학관301)<p>수3(공학관301)"`.
///
/// Malformed segments are skipped on their own; the remaining segments are kept.
pub fn parse_schedule(raw: &str) -> Vec<Segment> {
    raw.split(SEGMENT_DELIMITER)
        .flat_map(str::lines)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| {
            let parsed = parse_segment(segment);
            if parsed.is_none() {
                tracing::debug!(segment, "skipping malformed schedule segment");
            }
            parsed
        })
        .collect()
}

fn parse_segment(segment: &str) -> Option<Segment> {
    let digit_at = segment.find(|c: char| c.is_ascii_digit())?;
    let (day_token, rest) = segment.split_at(digit_at);
    let day = day_token.trim().parse::<Day>().ok()?;

    let (period_token, room) = match rest.find(['(', '/']) {
        Some(idx) => (&rest[..idx], parse_room(&rest[idx..])),
        None => (rest, None),
    };
    let periods = parse_periods(period_token)?;
    let range = PeriodRange::from_periods(&periods)?;

    Some(Segment { day, range, room })
}

fn parse_periods(token: &str) -> Option<Vec<Period>> {
    let mut periods = Vec::new();
    for part in token.split(',').map(str::trim) {
        match part.split_once('~') {
            Some((from, to)) => {
                let from: Period = from.trim().parse().ok()?;
                let to: Period = to.trim().parse().ok()?;
                if from > to {
                    return None;
                }
                periods.extend(from..=to);
            }
            None => periods.push(part.parse().ok()?),
        }
    }
    Some(periods)
}

fn parse_room(tail: &str) -> Option<String> {
    let room = match tail.strip_prefix('(') {
        Some(inner) => inner.split(')').next().unwrap_or(inner),
        None => tail.trim_start_matches('/'),
    };
    let room = room.trim();
    (!room.is_empty()).then(|| room.to_string())
}
