//! Error handling and edge case tests.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use subtrack::{
    CategoryId, CategoryRegistry, ManualClock, MemorySink, NoticeKind, StaticIdentity, Store,
    StoreSnapshot, SubscriptionId, SubscriptionInput, Tracker, TrackerConfig, TrackerError,
    ValidationError,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn test_tracker(sink: Arc<MemorySink>) -> Tracker {
    Tracker::new(
        TrackerConfig::default(),
        Arc::new(ManualClock::new(date(2023, 11, 25))),
        Arc::new(StaticIdentity::free("Test User")),
        sink,
    )
}

fn input(name: &str) -> SubscriptionInput {
    SubscriptionInput::new(name, Decimal::from(100), date(2023, 11, 1), CategoryId(1))
}

// --- Validation Errors ---

#[test]
fn test_empty_name_rejected() {
    let tracker = test_tracker(Arc::new(MemorySink::new()));

    let result = tracker.add(input("   "));
    assert!(matches!(
        result,
        Err(TrackerError::Validation(ValidationError::EmptyName))
    ));
    assert!(tracker.is_empty());
    assert!(tracker.history().is_empty());
}

#[test]
fn test_negative_amount_rejected() {
    let tracker = test_tracker(Arc::new(MemorySink::new()));

    let mut negative = input("Netflix");
    negative.amount = Decimal::new(-599, 0);
    let result = tracker.add(negative);
    assert!(matches!(
        result,
        Err(TrackerError::Validation(ValidationError::NegativeAmount))
    ));
}

#[test]
fn test_end_before_start_rejected() {
    let tracker = test_tracker(Arc::new(MemorySink::new()));

    let result = tracker.add(input("Netflix").with_end_date(date(2023, 10, 1)));
    match result {
        Err(TrackerError::Validation(ValidationError::EndBeforeStart { start, end })) => {
            assert_eq!(start, date(2023, 11, 1));
            assert_eq!(end, date(2023, 10, 1));
        }
        other => panic!("Expected EndBeforeStart, got {:?}", other),
    }
}

#[test]
fn test_trial_before_start_allowed() {
    let tracker = test_tracker(Arc::new(MemorySink::new()));

    // The trial date is independent of the start/end range.
    let record = tracker
        .add(input("Trial").with_free_trial_end(date(2023, 10, 1)))
        .unwrap();
    assert_eq!(record.free_trial_end_date, Some(date(2023, 10, 1)));
}

#[test]
fn test_invalid_update_is_atomic() {
    let tracker = test_tracker(Arc::new(MemorySink::new()));
    let original = tracker.add(input("Netflix")).unwrap();

    let mut bad = input("Netflix Premium");
    bad.end_date = Some(date(2020, 1, 1));
    assert!(tracker.update(original.id, bad).is_err());

    assert_eq!(tracker.get(original.id), Some(original));
}

#[test]
fn test_custom_registry_rejects_default_ids() {
    let tracker = test_tracker(Arc::new(MemorySink::new())).with_categories(
        CategoryRegistry::with_categories([(CategoryId(100), "Streaming")]),
    );

    assert!(matches!(
        tracker.add(input("Netflix")),
        Err(TrackerError::Validation(ValidationError::UnknownCategory(CategoryId(1))))
    ));

    let mut streaming = input("Netflix");
    streaming.category_id = CategoryId(100);
    assert!(tracker.add(streaming).is_ok());
}

// --- Missing Records ---

#[test]
fn test_operations_on_missing_id() {
    let sink = Arc::new(MemorySink::new());
    let tracker = test_tracker(sink.clone());
    let missing = SubscriptionId(404);

    assert!(matches!(tracker.update(missing, input("x")), Err(TrackerError::NotFound(_))));
    assert!(matches!(tracker.remove(missing), Err(TrackerError::NotFound(_))));
    assert!(matches!(tracker.toggle_active(missing), Err(TrackerError::NotFound(_))));
    assert!(matches!(tracker.status_of(missing), Err(TrackerError::NotFound(_))));

    // Remove never asked for confirmation of a record that does not exist.
    assert!(sink.prompts().is_empty());
    assert!(sink.notices().iter().all(|n| n.kind == NoticeKind::Error));
}

#[test]
fn test_remove_twice() {
    let tracker = test_tracker(Arc::new(MemorySink::new()));
    let a = tracker.add(input("a")).unwrap();

    tracker.remove(a.id).unwrap();
    assert!(matches!(tracker.remove(a.id), Err(TrackerError::NotFound(id)) if id == a.id));
}

// --- Confirmation Gate ---

#[test]
fn test_declined_delete_keeps_record() {
    let sink = Arc::new(MemorySink::answering(false));
    let tracker = test_tracker(sink.clone());
    let a = tracker.add(input("Netflix")).unwrap();
    let notices_before = sink.notices().len();

    assert!(matches!(tracker.remove(a.id), Err(TrackerError::Cancelled)));
    assert_eq!(tracker.len(), 1);
    assert_eq!(sink.notices().len(), notices_before);
}

// --- Import Errors ---

#[test]
fn test_import_malformed_json() {
    let tracker = test_tracker(Arc::new(MemorySink::new()));
    tracker.add(input("keep me")).unwrap();

    let result = tracker.import_json("{ not json");
    assert!(matches!(result, Err(TrackerError::Serialization(_))));
    assert_eq!(tracker.len(), 1);
}

#[test]
fn test_import_over_quota_for_free_user() {
    let store = Store::new();
    for i in 0..6 {
        store.add(input(&format!("s{i}"))).unwrap();
    }
    let json = serde_json::to_string(&store.snapshot()).unwrap();

    let tracker = test_tracker(Arc::new(MemorySink::new()));
    assert!(matches!(
        tracker.import_json(&json),
        Err(TrackerError::QuotaExceeded { limit: 5 })
    ));
    assert!(tracker.is_empty());
}

#[test]
fn test_import_rejects_exhausted_id_space() {
    let tracker = test_tracker(Arc::new(MemorySink::new()));
    tracker.add(input("keep me")).unwrap();

    let max_record = format!(
        r#"{{"next_id":1,"subscriptions":[{{"id":{},"name":"Max","amount":"1",
            "start_date":"2023-11-01","end_date":null,"free_trial_end_date":null,
            "category_id":1,"notes":null,"is_active":true}}]}}"#,
        u64::MAX
    );
    assert!(matches!(
        tracker.import_json(&max_record),
        Err(TrackerError::IdSpaceExhausted)
    ));

    let max_next_id = format!(r#"{{"next_id":{},"subscriptions":[]}}"#, u64::MAX);
    assert!(matches!(
        tracker.import_json(&max_next_id),
        Err(TrackerError::IdSpaceExhausted)
    ));

    // Both imports were refused, so adding still works.
    assert_eq!(tracker.list()[0].name, "keep me");
    assert!(tracker.add(input("next")).is_ok());
}

#[test]
fn test_restore_rejects_invalid_record() {
    let store = Store::new();
    let mut record = store.add(input("valid")).unwrap();
    record.name = String::new();

    let result = store.restore(StoreSnapshot {
        next_id: 10,
        subscriptions: vec![record],
    });
    assert!(matches!(
        result,
        Err(TrackerError::Validation(ValidationError::EmptyName))
    ));
    assert_eq!(store.list()[0].name, "valid");
}

#[test]
fn test_error_messages() {
    assert_eq!(
        TrackerError::NotFound(SubscriptionId(7)).to_string(),
        "Subscription not found: 7"
    );
    assert_eq!(
        TrackerError::QuotaExceeded { limit: 5 }.to_string(),
        "Subscription limit reached (5)"
    );
    assert_eq!(
        TrackerError::IdSpaceExhausted.to_string(),
        "No subscription ids left to assign"
    );
    assert_eq!(
        TrackerError::from(ValidationError::EmptyName).to_string(),
        "Invalid subscription: name must not be empty"
    );
}
