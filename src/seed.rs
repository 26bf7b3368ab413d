//! Built-in demo data used when no catalog location is configured.

use std::sync::Arc;

use crate::lecture::Lecture;
use crate::store::{ScheduleMap, TableSchedules};

/// Demo catalog as `(majors, liberal_arts)`.
pub fn demo_catalog() -> (Vec<Lecture>, Vec<Lecture>) {
    let majors = vec![
        Lecture::new("502001", "Discrete Mathematics", "Mon1,2,3/101")
            .with_credits("3")
            .with_major("Computer Science")
            .with_grade(1),
        Lecture::new("502007", "Data Structures", "Tue4,5,6(B101)<p>Thu4,5(B101)")
            .with_credits("3")
            .with_major("Computer Science")
            .with_grade(2),
        Lecture::new("502013", "Operating Systems", "Wed7~9(B203)")
            .with_credits("3")
            .with_major("Computer Science")
            .with_grade(3),
        Lecture::new("502021", "Compiler Construction", "Fri1~4(B203)")
            .with_credits("3")
            .with_major("Computer Science")
            .with_grade(4),
        Lecture::new("503104", "Circuit Theory", "월1~2(공학관301)<p>수3,4(공학관302)")
            .with_credits("3학점")
            .with_major("Electrical Engineering")
            .with_grade(2),
        Lecture::new("503210", "Signals and Systems", "Thu19,20(E402)")
            .with_credits("3")
            .with_major("Electrical Engineering")
            .with_grade(3),
        Lecture::new("504002", "Linear Algebra", "Mon5,6/M201<p>Wed5,6/M201")
            .with_credits("3")
            .with_major("Mathematics")
            .with_grade(1),
    ];

    let liberal_arts = vec![
        Lecture::new("900101", "Academic Writing", "Tue1,2(H105)")
            .with_credits("2")
            .with_major("Liberal Arts")
            .with_grade(1),
        Lecture::new("900215", "Philosophy of Science", "Thu7,8,9(H210)")
            .with_credits("2")
            .with_major("Liberal Arts")
            .with_grade(2),
        Lecture::new("900330", "Choir Practice", "Fri21~22(Music Hall)")
            .with_credits("0.5")
            .with_major("Liberal Arts")
            .with_grade(1),
    ];

    (majors, liberal_arts)
}

/// Starting tables: `schedule-1` with two demo lectures and an empty `schedule-2`.
pub fn demo_schedule_map() -> ScheduleMap {
    let (majors, _) = demo_catalog();
    let placed: Vec<_> = majors
        .into_iter()
        .take(2)
        .map(Arc::new)
        .flat_map(|lecture| lecture.to_schedules())
        .collect();

    ScheduleMap::from_tables([
        ("schedule-1".to_string(), TableSchedules::from_schedules(placed)),
        ("schedule-2".to_string(), TableSchedules::default()),
    ])
}
