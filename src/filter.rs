//! Multi-criteria lecture search.
//!
//! Criteria combine with AND; values inside one criterion combine with OR.
//! An absent or empty criterion never constrains the result.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::lecture::Lecture;
use crate::time_grid::{Day, Period};

/// Rows revealed per page of the incremental result list.
pub const PAGE_SIZE: usize = 100;

const CREDIT_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    pub query: Option<String>,
    pub grades: BTreeSet<u8>,
    pub days: BTreeSet<Day>,
    pub times: BTreeSet<Period>,
    pub majors: BTreeSet<String>,
    pub credits: Option<f64>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search pre-filled from a click on an empty grid cell.
    pub fn for_slot(day: Day, period: Period) -> Self {
        Self {
            days: BTreeSet::from([day]),
            times: BTreeSet::from([period]),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_credits(mut self, credits: f64) -> Self {
        self.credits = Some(credits);
        self
    }

    pub fn matches(&self, lecture: &Lecture) -> bool {
        self.matches_query(lecture)
            && self.matches_grade(lecture)
            && self.matches_major(lecture)
            && self.matches_credits(lecture)
            && self.matches_days(lecture)
            && self.matches_times(lecture)
    }

    fn matches_query(&self, lecture: &Lecture) -> bool {
        let Some(query) = self.query.as_deref().map(str::trim) else {
            return true;
        };
        if query.is_empty() {
            return true;
        }
        let needle = query.to_lowercase();
        lecture.title.to_lowercase().contains(&needle) || lecture.id.to_lowercase().contains(&needle)
    }

    fn matches_grade(&self, lecture: &Lecture) -> bool {
        self.grades.is_empty() || self.grades.contains(&lecture.grade)
    }

    fn matches_major(&self, lecture: &Lecture) -> bool {
        self.majors.is_empty() || self.majors.contains(&lecture.major)
    }

    fn matches_credits(&self, lecture: &Lecture) -> bool {
        match self.credits {
            None => true,
            Some(wanted) => lecture
                .credit_value()
                .is_some_and(|value| (value - wanted).abs() <= CREDIT_EPSILON),
        }
    }

    fn matches_days(&self, lecture: &Lecture) -> bool {
        self.days.is_empty() || self.days.iter().any(|day| lecture.meets_on(*day))
    }

    fn matches_times(&self, lecture: &Lecture) -> bool {
        self.times.is_empty() || self.times.iter().any(|period| lecture.meets_during(*period))
    }
}

/// Lectures matching `options`, in catalog order.
pub fn filter_lectures(lectures: &[Arc<Lecture>], options: &SearchOptions) -> Vec<Arc<Lecture>> {
    lectures
        .iter()
        .filter(|lecture| options.matches(lecture))
        .cloned()
        .collect()
}

/// Results visible after scrolling to `page` (1-based); earlier pages stay visible.
pub fn paginate<T>(results: &[T], page: usize, page_size: usize) -> &[T] {
    let end = page.max(1).saturating_mul(page_size).min(results.len());
    &results[..end]
}

pub fn visible_results<T>(results: &[T], page: usize) -> &[T] {
    paginate(results, page, PAGE_SIZE)
}

pub fn last_page(total: usize) -> usize {
    total.div_ceil(PAGE_SIZE).max(1)
}
