use std::sync::Arc;

use proptest::prelude::*;
use timetable::{Day, Lecture, PeriodRange, Schedule, find_conflicts, overlaps};

fn block(day: Day, first: u8, last: u8) -> Schedule {
    let lecture = Arc::new(Lecture::new("L", "Lecture", ""));
    Schedule::new(lecture, day, PeriodRange::new(first, last).unwrap(), None)
}

#[test]
fn different_days_never_overlap() {
    assert!(!overlaps(&block(Day::Mon, 1, 3), &block(Day::Tue, 1, 3)));
}

#[test]
fn touching_ranges_do_not_overlap() {
    assert!(!overlaps(&block(Day::Wed, 1, 3), &block(Day::Wed, 4, 6)));
    assert!(overlaps(&block(Day::Wed, 1, 3), &block(Day::Wed, 3, 6)));
}

#[test]
fn conflicts_skip_the_excluded_index() {
    let table = vec![
        block(Day::Mon, 1, 3),
        block(Day::Mon, 2, 4),
        block(Day::Tue, 1, 2),
    ];
    let range = PeriodRange::new(2, 2).unwrap();
    assert_eq!(find_conflicts(&table, Day::Mon, range, None), vec![0, 1]);
    assert_eq!(find_conflicts(&table, Day::Mon, range, Some(0)), vec![1]);
    assert!(find_conflicts(&table, Day::Fri, range, None).is_empty());
}

fn arb_block() -> impl Strategy<Value = (usize, u8, u8)> {
    (0usize..5, 1u8..=24, 0u8..6).prop_map(|(day, first, len)| {
        let last = (first + len).min(24);
        (day, first, last)
    })
}

proptest! {
    #[test]
    fn overlap_is_symmetric((d1, f1, l1) in arb_block(), (d2, f2, l2) in arb_block()) {
        let a = block(Day::ALL[d1], f1, l1);
        let b = block(Day::ALL[d2], f2, l2);
        prop_assert_eq!(overlaps(&a, &b), overlaps(&b, &a));
    }

    #[test]
    fn same_day_overlap_matches_period_intersection((_, f1, l1) in arb_block(), (_, f2, l2) in arb_block()) {
        let a = block(Day::Thu, f1, l1);
        let b = block(Day::Thu, f2, l2);
        let shared = a.range.iter().any(|p| b.range.contains(p));
        prop_assert_eq!(overlaps(&a, &b), shared);
    }
}
