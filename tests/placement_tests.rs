use std::sync::Arc;

use timetable::placement::ScheduleHandle;
use timetable::{
    CellDelta, Day, DragGesture, GridMetrics, Lecture, PeriodRange, PointerDrag, Schedule,
    ScheduleMap, ScheduleStore, TableSchedules, resolve_drag,
};

fn placed(id: &str, day: Day, first: u8, last: u8) -> Arc<Schedule> {
    let lecture = Arc::new(Lecture::new(id, id, ""));
    Arc::new(Schedule::new(lecture, day, PeriodRange::new(first, last).unwrap(), None))
}

fn table() -> Vec<Arc<Schedule>> {
    vec![
        placed("A", Day::Mon, 1, 3),
        placed("B", Day::Tue, 4, 6),
        placed("C", Day::Fri, 22, 24),
    ]
}

#[test]
fn drag_onto_an_occupied_range_reports_the_conflict() {
    let placement = resolve_drag(&table(), 0, CellDelta::new(1, 3)).unwrap();
    assert_eq!(placement.day, Day::Tue);
    assert_eq!(placement.range, PeriodRange::new(4, 6).unwrap());
    assert!(placement.moved);
    assert_eq!(placement.conflicts, vec![1]);
}

#[test]
fn drag_past_friday_clamps_the_day() {
    let placement = resolve_drag(&table(), 1, CellDelta::new(7, 0)).unwrap();
    assert_eq!(placement.day, Day::Fri);
    assert_eq!(placement.range, PeriodRange::new(4, 6).unwrap());
    assert!(!placement.has_conflicts());
}

#[test]
fn drag_below_the_grid_keeps_the_block_length() {
    let placement = resolve_drag(&table(), 1, CellDelta::new(0, 30)).unwrap();
    assert_eq!(placement.range, PeriodRange::new(22, 24).unwrap());
    let placement = resolve_drag(&table(), 0, CellDelta::new(0, -5)).unwrap();
    assert_eq!(placement.range, PeriodRange::new(1, 3).unwrap());
    assert!(!placement.moved);
}

#[test]
fn zero_drag_is_not_a_move() {
    let placement = resolve_drag(&table(), 2, CellDelta::default()).unwrap();
    assert!(!placement.moved);
    assert!(placement.conflicts.is_empty());
}

#[test]
fn out_of_range_index_resolves_to_nothing() {
    assert!(resolve_drag(&table(), 3, CellDelta::new(1, 0)).is_none());
}

#[test]
fn pointer_drag_rounds_to_the_nearest_cell() {
    let metrics = GridMetrics::default();
    let drag = PointerDrag::new((10.0, 10.0), (135.0, 54.0));
    assert_eq!(drag.cell_delta(&metrics), CellDelta::new(2, 1));
    let back = PointerDrag::new((200.0, 200.0), (165.0, 140.0));
    assert_eq!(back.cell_delta(&metrics), CellDelta::new(0, -2));
}

#[test]
fn committed_drag_replaces_only_the_moved_entry() {
    let store = ScheduleStore::new(ScheduleMap::from_tables([(
        "schedule-1".to_string(),
        TableSchedules::new(table()),
    )]));
    let before = store.table("schedule-1");
    let placement = resolve_drag(&before, 0, CellDelta::new(2, 0)).unwrap();
    assert!(!placement.has_conflicts());
    assert!(
        store
            .move_schedule("schedule-1", 0, placement.day, placement.range)
            .unwrap()
    );

    let after = store.table("schedule-1");
    assert_eq!(after[0].day, Day::Wed);
    assert!(Arc::ptr_eq(&after[0].lecture, &before[0].lecture));
    assert!(Arc::ptr_eq(&after[1], &before[1]));
    assert!(Arc::ptr_eq(&after[2], &before[2]));
}

#[test]
fn schedule_handles_use_the_last_colon() {
    let handle: ScheduleHandle = "schedule-17:3".parse().unwrap();
    assert_eq!(handle, ScheduleHandle::new("schedule-17", 3));
    assert_eq!(handle.to_string(), "schedule-17:3");
    let nested: ScheduleHandle = "a:b:0".parse().unwrap();
    assert_eq!(nested.table_id, "a:b");
    assert!("no-index".parse::<ScheduleHandle>().is_err());
    let err = ":1".parse::<ScheduleHandle>().unwrap_err();
    assert_eq!(err.to_string(), "invalid schedule handle ':1'");
}

#[test]
fn single_cell_drags_move_a_two_period_block() {
    let schedules = vec![placed("A", Day::Mon, 1, 2)];
    let right = resolve_drag(&schedules, 0, CellDelta::new(1, 0)).unwrap();
    assert_eq!((right.day, right.range.to_vec()), (Day::Tue, vec![1, 2]));
    let down = resolve_drag(&schedules, 0, CellDelta::new(0, 2)).unwrap();
    assert_eq!((down.day, down.range.to_vec()), (Day::Mon, vec![3, 4]));
}
