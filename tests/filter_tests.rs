use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;
use timetable::{Day, Lecture, SearchOptions, filter_lectures, seed};

fn catalog() -> Vec<Arc<Lecture>> {
    let (majors, liberal_arts) = seed::demo_catalog();
    majors.into_iter().chain(liberal_arts).map(Arc::new).collect()
}

fn ids(lectures: &[Arc<Lecture>]) -> Vec<&str> {
    lectures.iter().map(|lecture| lecture.id.as_str()).collect()
}

#[test]
fn empty_options_return_the_whole_catalog() {
    let lectures = catalog();
    assert_eq!(filter_lectures(&lectures, &SearchOptions::new()).len(), lectures.len());
}

#[test]
fn single_segment_lecture_expands_to_one_schedule() {
    let lecture = Arc::new(Lecture::new("1", "Discrete Mathematics", "Mon1,2,3/101"));
    let schedules = lecture.to_schedules();
    assert_eq!(schedules.len(), 1);
    assert_eq!(schedules[0].day, Day::Mon);
    assert_eq!(schedules[0].range.to_vec(), vec![1, 2, 3]);
    assert_eq!(schedules[0].room.as_deref(), Some("101"));
    assert!(Arc::ptr_eq(&schedules[0].lecture, &lecture));
}

#[test]
fn query_matches_title_or_id_case_insensitively() {
    let lectures = catalog();
    let by_title = filter_lectures(&lectures, &SearchOptions::new().with_query("DATA"));
    assert_eq!(ids(&by_title), vec!["502007"]);
    let by_id = filter_lectures(&lectures, &SearchOptions::new().with_query("5032"));
    assert_eq!(ids(&by_id), vec!["503210"]);
}

#[test]
fn slot_search_finds_lectures_meeting_at_that_cell() {
    let lectures = catalog();
    let found = filter_lectures(&lectures, &SearchOptions::for_slot(Day::Mon, 2));
    assert_eq!(ids(&found), vec!["502001", "503104"]);
}

#[test]
fn credits_compare_numerically() {
    let lectures = catalog();
    let half = filter_lectures(&lectures, &SearchOptions::new().with_credits(0.5));
    assert_eq!(ids(&half), vec!["900330"]);
    let three = filter_lectures(&lectures, &SearchOptions::new().with_credits(3.0));
    assert!(three.iter().any(|lecture| lecture.credits == "3학점"));
}

#[test]
fn criteria_combine_with_and() {
    let lectures = catalog();
    let mut options = SearchOptions::new();
    options.grades = BTreeSet::from([2]);
    options.majors = BTreeSet::from(["Computer Science".to_string()]);
    assert_eq!(ids(&filter_lectures(&lectures, &options)), vec!["502007"]);
}

const MAJORS: [&str; 4] = ["Computer Science", "Electrical Engineering", "Mathematics", "Liberal Arts"];

fn arb_options() -> impl Strategy<Value = SearchOptions> {
    (
        prop::collection::btree_set(1u8..=4, 0..3),
        prop::collection::btree_set(0usize..5, 0..3),
        prop::collection::btree_set(1u8..=24, 0..4),
        prop::collection::btree_set(prop::sample::select(MAJORS.to_vec()), 0..3),
        prop::option::of(prop::sample::select(vec!["data", "systems", "theory", "x"])),
        prop::option::of(prop::sample::select(vec![0.5, 2.0, 3.0])),
    )
        .prop_map(|(grades, days, times, majors, query, credits)| SearchOptions {
            query: query.map(str::to_string),
            grades,
            days: days.into_iter().map(|idx| Day::ALL[idx]).collect(),
            times,
            majors: majors.into_iter().map(str::to_string).collect(),
            credits,
        })
}

#[derive(Debug, Clone)]
enum Criterion {
    Grade(u8),
    Day(Day),
    Time(u8),
    Major(&'static str),
    Query(&'static str),
    Credits(f64),
}

fn arb_criterion() -> impl Strategy<Value = Criterion> {
    prop_oneof![
        (1u8..=4).prop_map(Criterion::Grade),
        (0usize..5).prop_map(|idx| Criterion::Day(Day::ALL[idx])),
        (1u8..=24).prop_map(Criterion::Time),
        prop::sample::select(MAJORS.to_vec()).prop_map(Criterion::Major),
        prop::sample::select(vec!["a", "e", "1", "structures"]).prop_map(Criterion::Query),
        prop::sample::select(vec![0.5, 2.0, 3.0]).prop_map(Criterion::Credits),
    ]
}

/// An empty set criterion starts constraining; a populated one shrinks to one value.
fn restrict<T: Ord + Clone>(set: &mut BTreeSet<T>, value: T) {
    match set.first().cloned() {
        None => {
            set.insert(value);
        }
        Some(kept) => *set = BTreeSet::from([kept]),
    }
}

fn narrow(options: &SearchOptions, criterion: Criterion) -> SearchOptions {
    let mut narrowed = options.clone();
    match criterion {
        Criterion::Grade(grade) => restrict(&mut narrowed.grades, grade),
        Criterion::Day(day) => restrict(&mut narrowed.days, day),
        Criterion::Time(period) => restrict(&mut narrowed.times, period),
        Criterion::Major(major) => restrict(&mut narrowed.majors, major.to_string()),
        Criterion::Query(extra) => {
            let query = narrowed.query.take().unwrap_or_default();
            narrowed.query = Some(format!("{query}{extra}"));
        }
        Criterion::Credits(credits) => {
            narrowed.credits.get_or_insert(credits);
        }
    }
    narrowed
}

proptest! {
    #[test]
    fn adding_a_criterion_never_grows_the_result(options in arb_options(), criterion in arb_criterion()) {
        let lectures = catalog();
        let base = filter_lectures(&lectures, &options);
        let narrowed = filter_lectures(&lectures, &narrow(&options, criterion));
        prop_assert!(narrowed.len() <= base.len());
        for lecture in &narrowed {
            prop_assert!(base.iter().any(|l| Arc::ptr_eq(l, lecture)));
        }
    }
}
