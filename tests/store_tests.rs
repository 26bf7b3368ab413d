use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use timetable::store::{SequentialKeyGenerator, TimestampKeyGenerator};
use timetable::{
    Day, Lecture, PeriodRange, ScheduleAction, ScheduleMap, ScheduleStore, StoreError,
    TableSchedules,
};

fn lecture(id: &str, schedule: &str) -> Arc<Lecture> {
    Arc::new(Lecture::new(id, format!("Lecture {id}"), schedule))
}

fn two_table_store() -> ScheduleStore {
    let a = lecture("A", "Mon1,2,3/101");
    let b = lecture("B", "Mon3,4/102<p>Wed1,2/103");
    let table: Vec<_> = [a, b].iter().flat_map(|l| l.to_schedules()).collect();
    let map = ScheduleMap::from_tables([
        ("schedule-1".to_string(), TableSchedules::from_schedules(table)),
        ("schedule-2".to_string(), TableSchedules::default()),
    ]);
    ScheduleStore::with_key_generator(map, SequentialKeyGenerator::new("copy"))
}

fn counter() -> (Arc<AtomicUsize>, impl Fn(&TableSchedules) + Send + Sync + 'static) {
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&hits);
    (hits, move |_: &TableSchedules| {
        seen.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn change_to_one_table_notifies_only_its_listeners() {
    let store = two_table_store();
    let (first_hits, first) = counter();
    let (second_hits, second) = counter();
    let key_hits = Arc::new(AtomicUsize::new(0));
    let key_seen = Arc::clone(&key_hits);
    let _s1 = store.subscribe_table("schedule-1", first);
    let _s2 = store.subscribe_table("schedule-2", second);
    let _k = store.subscribe_keys(move |_| {
        key_seen.fetch_add(1, Ordering::SeqCst);
    });

    let untouched = store.table("schedule-2");
    store
        .add_lecture("schedule-1", &lecture("C", "Fri1,2"))
        .unwrap();

    assert_eq!(first_hits.load(Ordering::SeqCst), 1);
    assert_eq!(second_hits.load(Ordering::SeqCst), 0);
    assert_eq!(key_hits.load(Ordering::SeqCst), 0);
    assert!(store.table("schedule-2").same_as(&untouched));
}

#[test]
fn no_op_dispatch_keeps_the_snapshot_identity() {
    let store = two_table_store();
    let (hits, listener) = counter();
    let _sub = store.subscribe_table("schedule-1", listener);
    let before = store.snapshot();

    let changed = store.delete_by_slot("schedule-1", Day::Fri, 10).unwrap();
    assert!(!changed);
    let changed = store
        .dispatch(ScheduleAction::AddSchedules {
            table_id: "missing".to_string(),
            schedules: lecture("X", "Tue1").to_schedules(),
        })
        .unwrap();
    assert!(!changed);

    assert!(store.snapshot().same_as(&before));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn replacing_with_equivalent_tables_is_settled_away() {
    let store = two_table_store();
    let before = store.snapshot();
    let rebuilt = ScheduleMap::from_tables(
        before
            .iter()
            .map(|(id, schedules)| (id.clone(), schedules.clone())),
    );
    assert!(!store.replace(rebuilt).unwrap());
    assert!(store.snapshot().same_as(&before));
}

#[test]
fn delete_by_slot_removes_every_block_containing_the_cell() {
    let store = two_table_store();
    // A covers Mon 1..3 and B covers Mon 3..4.
    assert!(store.delete_by_slot("schedule-1", Day::Mon, 3).unwrap());
    let remaining = store.table("schedule-1");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].day, Day::Wed);
}

#[test]
fn delete_by_slot_keeps_blocks_that_only_neighbour_the_cell() {
    let store = two_table_store();
    assert!(store.delete_by_slot("schedule-1", Day::Mon, 4).unwrap());
    let remaining = store.table("schedule-1");
    assert_eq!(remaining.len(), 2);
    assert_eq!(remaining[0].lecture.id, "A");
}

#[test]
fn duplicate_shares_schedules_and_enables_removal() {
    let single = ScheduleMap::from_tables([(
        "schedule-1".to_string(),
        TableSchedules::from_schedules(lecture("A", "Mon1,2").to_schedules()),
    )]);
    let store = ScheduleStore::new(single);
    assert!(!store.can_remove_table());

    let created = store.duplicate_table("schedule-1").unwrap().unwrap();
    assert!(created.starts_with("schedule-"));
    assert_ne!(created, "schedule-1");
    assert!(store.can_remove_table());

    let source = store.table("schedule-1");
    let copy = store.table(&created);
    assert!(!copy.same_as(&source));
    assert!(Arc::ptr_eq(&copy[0], &source[0]));
}

#[test]
fn timestamp_keys_stay_unique_within_one_millisecond() {
    let store = ScheduleStore::with_key_generator(
        ScheduleMap::from_tables([("schedule-1".to_string(), TableSchedules::default())]),
        TimestampKeyGenerator::new(),
    );
    for _ in 0..5 {
        store.duplicate_table("schedule-1").unwrap().unwrap();
    }
    let keys = store.table_keys();
    assert_eq!(keys.len(), 6);
    let mut unique = keys.to_vec();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 6);
}

#[test]
fn duplicating_an_unknown_table_does_nothing() {
    let store = two_table_store();
    let before = store.snapshot();
    assert_eq!(store.duplicate_table("nope").unwrap(), None);
    assert!(store.snapshot().same_as(&before));
}

#[test]
fn last_table_cannot_be_removed() {
    let store = two_table_store();
    assert!(store.remove_table("schedule-2").unwrap());
    let err = store.remove_table("schedule-1").unwrap_err();
    assert_eq!(err, StoreError::LastTable("schedule-1".to_string()));
    assert_eq!(store.table_keys().to_vec(), vec!["schedule-1"]);
}

#[test]
fn removing_a_table_notifies_key_and_table_listeners() {
    let store = two_table_store();
    let seen_keys = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen_keys);
    let _k = store.subscribe_keys(move |keys| sink.lock().push(keys.to_vec()));
    let emptied = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&emptied);
    let _t = store.subscribe_table("schedule-1", move |schedules| {
        *slot.lock() = Some(schedules.len());
    });

    store.remove_table("schedule-1").unwrap();

    assert_eq!(*seen_keys.lock(), vec![vec!["schedule-2".to_string()]]);
    assert_eq!(*emptied.lock(), Some(0));
}

#[test]
fn key_list_identity_survives_content_changes() {
    let store = two_table_store();
    let keys = store.table_keys();
    store
        .add_lecture("schedule-2", &lecture("D", "Thu5"))
        .unwrap();
    assert!(Arc::ptr_eq(&keys, &store.table_keys()));
}

#[test]
fn dropping_a_subscription_unsubscribes() {
    let store = two_table_store();
    let (hits, listener) = counter();
    let sub = store.subscribe_table("schedule-1", listener);
    assert_eq!(store.subscriber_count(), 1);
    drop(sub);
    assert_eq!(store.subscriber_count(), 0);
    store
        .move_schedule("schedule-1", 0, Day::Tue, PeriodRange::new(1, 3).unwrap())
        .unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn listeners_may_read_the_store_while_notified() {
    let store = Arc::new(two_table_store());
    let observed = Arc::new(AtomicUsize::new(0));
    let reader = Arc::clone(&store);
    let out = Arc::clone(&observed);
    let _sub = store.subscribe_table("schedule-2", move |_| {
        out.store(reader.table("schedule-2").len(), Ordering::SeqCst);
    });
    store
        .add_lecture("schedule-2", &lecture("E", "Tue7,8"))
        .unwrap();
    assert_eq!(observed.load(Ordering::SeqCst), 1);
}

#[test]
fn duplicating_the_only_table_appends_a_timestamped_key() {
    let store = ScheduleStore::new(ScheduleMap::from_tables([(
        "A".to_string(),
        TableSchedules::from_schedules(lecture("L", "Mon1,2").to_schedules()),
    )]));
    let created = store.duplicate_table("A").unwrap().unwrap();
    let keys = store.table_keys();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0], "A");
    assert_eq!(keys[1], created);
    let suffix = created.strip_prefix("schedule-").unwrap();
    assert!(suffix.chars().all(|c| c.is_ascii_digit() || c == '-'));
    assert_eq!(store.table(&created), store.table("A"));
}

#[test]
fn delete_by_slot_checks_membership_not_neighbours() {
    let map = || {
        ScheduleMap::from_tables([(
            "A".to_string(),
            TableSchedules::from_schedules(lecture("L", "Mon1,2").to_schedules()),
        )])
    };
    let store = ScheduleStore::new(map());
    assert!(!store.delete_by_slot("A", Day::Mon, 3).unwrap());
    assert_eq!(store.table("A").len(), 1);
    assert!(store.delete_by_slot("A", Day::Mon, 1).unwrap());
    assert!(store.table("A").is_empty());
}

#[test]
fn add_schedule_appends_in_display_order() {
    let store = two_table_store();
    let extra = lecture("F", "Fri9").to_schedules().remove(0);
    assert!(store.add_schedule("schedule-1", extra).unwrap());
    let table = store.table("schedule-1");
    assert_eq!(table.len(), 4);
    assert_eq!(table[3].lecture.id, "F");
    assert_eq!(table[3].day, Day::Fri);
}

#[test]
fn moving_a_block_onto_its_own_cells_is_a_no_op() {
    let store = two_table_store();
    let (hits, listener) = counter();
    let _sub = store.subscribe_table("schedule-1", listener);
    let before = store.table("schedule-1");

    let range = PeriodRange::new(1, 3).unwrap();
    assert!(!store.move_schedule("schedule-1", 0, Day::Mon, range).unwrap());

    assert!(store.table("schedule-1").same_as(&before));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn operations_on_unknown_tables_change_nothing() {
    let store = two_table_store();
    let (hits, listener) = counter();
    let _sub = store.subscribe_table("schedule-1", listener);
    let key_hits = Arc::new(AtomicUsize::new(0));
    let key_seen = Arc::clone(&key_hits);
    let _k = store.subscribe_keys(move |_| {
        key_seen.fetch_add(1, Ordering::SeqCst);
    });
    let before = store.snapshot();
    let keys = store.table_keys();

    assert!(!store.delete_by_slot("unknown", Day::Mon, 1).unwrap());
    let range = PeriodRange::new(2, 3).unwrap();
    assert!(!store.move_schedule("unknown", 0, Day::Tue, range).unwrap());
    assert!(!store.remove_table("unknown").unwrap());

    assert!(store.snapshot().same_as(&before));
    assert!(Arc::ptr_eq(&store.table_keys(), &keys));
    assert_eq!(store.table_keys().to_vec(), vec!["schedule-1", "schedule-2"]);
    assert!(!store.contains_table("unknown"));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(key_hits.load(Ordering::SeqCst), 0);
}

#[test]
fn removing_an_unknown_table_from_a_single_table_map_is_not_rejected() {
    let store = ScheduleStore::new(ScheduleMap::from_tables([(
        "only".to_string(),
        TableSchedules::default(),
    )]));
    assert!(!store.remove_table("unknown").unwrap());
    assert!(store.contains_table("only"));
}
