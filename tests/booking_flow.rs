//! End-to-end booking flow over a file-backed store: guest form submit,
//! admin accept, calendar agreement, conflict rejection, completion, and
//! the bulk wipe.

use std::sync::Arc;

use chrono::NaiveDate;

use arriba::admin::BookingManager;
use arriba::calendar::{CalendarEditor, DayState, day_state};
use arriba::engine::{
    DeleteAllRequest, Engine, EngineConfig, EngineError, ValidationError,
};
use arriba::form::{BookingForm, GuestDetails, RevalidatePolicy};
use arriba::model::BookingStatus;
use arriba::notify::NotifyHub;
use arriba::store::JsonStore;

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

const TODAY: &str = "2025-10-01";

fn details(name: &str) -> GuestDetails {
    GuestDetails {
        guest_name: name.into(),
        email: "guest@example.com".into(),
        phone: "0917 123 4567".into(),
        guests: 2,
        extra_beds: 1,
        special_requests: None,
    }
}

#[tokio::test]
async fn booking_lifecycle_end_to_end() {
    let dir = std::env::temp_dir().join(format!("arriba_flow_{}", ulid::Ulid::new()));
    std::fs::create_dir_all(&dir).unwrap();

    let store = Arc::new(JsonStore::open(dir.clone()).unwrap());
    let notify = Arc::new(NotifyHub::new());
    let engine = Arc::new(Engine::new(store, notify, EngineConfig::default()));

    // Guest picks dates and submits
    let mut form = BookingForm::open(engine.clone(), d(TODAY), RevalidatePolicy::default())
        .await
        .unwrap();
    form.select_check_in(d("2025-11-01")).unwrap();
    form.select_check_out(d("2025-11-03")).unwrap();
    let summary = form.summary(1).unwrap();
    assert_eq!(summary.total_fee, 6900);

    let booking = form.submit(details("Maria Santos")).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);

    // Admin sees the request and accepts it
    let mut manager = BookingManager::open(engine.clone()).await.unwrap();
    let mut calendar = CalendarEditor::open(
        engine.availability().clone(),
        engine.notify().clone(),
    )
    .await
    .unwrap();
    manager.accept(booking.id, Some(&mut calendar)).await.unwrap();

    // The calendar shows the two nights blocked and the checkout day open
    assert_eq!(
        day_state(d("2025-11-01"), calendar.snapshot(), d(TODAY)),
        DayState::Unavailable
    );
    assert_eq!(
        day_state(d("2025-11-02"), calendar.snapshot(), d(TODAY)),
        DayState::Unavailable
    );
    assert_eq!(
        day_state(d("2025-11-03"), calendar.snapshot(), d(TODAY)),
        DayState::Available
    );

    // A fresh form now rejects an overlapping span, naming the conflict
    let mut second = BookingForm::open(engine.clone(), d(TODAY), RevalidatePolicy::default())
        .await
        .unwrap();
    assert_eq!(
        second.select_check_in(d("2025-11-02")).unwrap_err(),
        EngineError::Validation(ValidationError::DateUnavailable(d("2025-11-02")))
    );

    // Same-day turnover: a stay starting on the checkout day is fine
    second.select_check_in(d("2025-11-03")).unwrap();
    second.select_check_out(d("2025-11-05")).unwrap();
    let turnover = second.submit(details("Juan Cruz")).await.unwrap();
    assert_eq!(turnover.status, BookingStatus::Pending);

    // Completing the first stay releases its span
    manager.complete(booking.id, Some(&mut calendar)).await.unwrap();
    assert!(calendar.snapshot().is_empty());

    // The wipe needs the double confirmation, then clears everything
    let accepted = manager.accept(turnover.id, Some(&mut calendar)).await;
    accepted.unwrap();
    let token = DeleteAllRequest::confirm().confirm_again();
    let report = manager.delete_all(token, Some(&mut calendar)).await.unwrap();
    assert_eq!(report.deleted, 2);
    assert!(report.failed_dates.is_empty());
    assert!(manager.visible().is_empty());
    assert!(calendar.snapshot().is_empty());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn file_store_survives_reopen() {
    let dir = std::env::temp_dir().join(format!("arriba_reopen_{}", ulid::Ulid::new()));
    std::fs::create_dir_all(&dir).unwrap();

    let booking_id = {
        let store = Arc::new(JsonStore::open(dir.clone()).unwrap());
        let engine = Arc::new(Engine::new(
            store,
            Arc::new(NotifyHub::new()),
            EngineConfig::default(),
        ));
        let mut form = BookingForm::open(engine.clone(), d(TODAY), RevalidatePolicy::default())
            .await
            .unwrap();
        form.select_check_in(d("2025-11-01")).unwrap();
        form.select_check_out(d("2025-11-03")).unwrap();
        let booking = form.submit(details("Maria Santos")).await.unwrap();
        engine.accept(booking.id).await.unwrap();
        booking.id
    };

    // A fresh process over the same directory sees the accepted booking and
    // its blocked span
    let store = Arc::new(JsonStore::open(dir.clone()).unwrap());
    let engine = Arc::new(Engine::new(
        store,
        Arc::new(NotifyHub::new()),
        EngineConfig::default(),
    ));
    let booking = engine.get(booking_id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Accepted);
    let snap = engine.load_snapshot().await.unwrap();
    assert!(!snap.is_available(d("2025-11-01")));
    assert!(!snap.is_available(d("2025-11-02")));
    assert!(snap.is_available(d("2025-11-03")));

    std::fs::remove_dir_all(&dir).unwrap();
}
