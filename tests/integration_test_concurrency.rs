mod common;

use std::collections::HashSet;
use std::sync::Arc;

use axum::http::StatusCode;
use chrono::NaiveDate;
use common::{TestApp, PROVIDER};
use slot_booking::domain::ports::BookingCounterRepository;
use slot_booking::domain::services::booking_code::{parse_sequence, BookingCodeGenerator};
use slot_booking::infra::repositories::sqlite_counter_repo::SqliteCounterRepo;
use tokio::task::JoinSet;

#[tokio::test]
async fn test_two_requests_for_one_slot() {
    let app = Arc::new(TestApp::new().await);
    let slots = app.seed_slots(PROVIDER, "2030-06-03", &["10:00"]).await;
    let first = app.register_customer("Uma", "0940", None).await;
    let second = app.register_customer("Vic", "0941", None).await;

    let mut set = JoinSet::new();
    for customer_id in [first, second] {
        let app = app.clone();
        let slots = slots.clone();
        set.spawn(async move { app.book(&customer_id, &slots, 500, 0).await });
    }

    let mut statuses = Vec::new();
    while let Some(result) = set.join_next().await {
        let (status, body) = result.unwrap();
        if status == StatusCode::CONFLICT {
            assert_eq!(body["code"], "slot_unavailable");
        }
        statuses.push(status);
    }

    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CREATED).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(), 1);
    assert_eq!(app.slot_status(&slots[0]).await, "pending");

    let (_, bookings) = app.request("GET", &format!("/api/v1/providers/{}/bookings", PROVIDER), None).await;
    assert_eq!(bookings.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_fifty_codes_for_one_day() {
    let app = TestApp::new().await;
    let counters: Arc<dyn BookingCounterRepository> = Arc::new(SqliteCounterRepo::new(app.pool.clone()));
    let generator = Arc::new(BookingCodeGenerator::new(counters, "BK".into(), chrono_tz::UTC));
    let day = NaiveDate::from_ymd_opt(2030, 6, 4).unwrap();

    let mut set = JoinSet::new();
    for _ in 0..50 {
        let generator = generator.clone();
        set.spawn(async move { generator.next(day).await });
    }

    let mut seqs = HashSet::new();
    while let Some(result) = set.join_next().await {
        let code = result.unwrap().expect("code generation failed");
        assert!(code.starts_with("BK-20300604"));
        assert!(seqs.insert(parse_sequence("BK", &code).unwrap()), "duplicate code {}", code);
    }

    let expected: HashSet<i64> = (1..=50).collect();
    assert_eq!(seqs, expected);

    // Another day starts over.
    let other = generator.next(day.succ_opt().unwrap()).await.unwrap();
    assert_eq!(other, "BK-20300605001");
}

#[tokio::test]
async fn test_concurrent_confirm_and_cancel() {
    let app = Arc::new(TestApp::new().await);
    let slots = app.seed_slots(PROVIDER, "2030-06-06", &["11:00", "11:30"]).await;
    let customer_id = app.register_customer("Wen", "0942", None).await;
    let (_, booking) = app.book(&customer_id, &slots, 500, 0).await;
    let booking_id = booking["id"].as_str().unwrap().to_string();

    let confirm = {
        let app = app.clone();
        let uri = format!("/api/v1/bookings/{}/confirm", booking_id);
        tokio::spawn(async move { app.request("POST", &uri, None).await })
    };
    let cancel = {
        let app = app.clone();
        let uri = format!("/api/v1/bookings/{}/cancel", booking_id);
        tokio::spawn(async move { app.request("POST", &uri, Some(serde_json::json!({}))).await })
    };
    let _ = confirm.await.unwrap();
    let _ = cancel.await.unwrap();

    // Whatever the interleaving, slots mirror the final booking status.
    let (_, final_booking) = app.request("GET", &format!("/api/v1/bookings/{}", booking_id), None).await;
    let expected = match final_booking["status"].as_str().unwrap() {
        "confirmed" => "confirmed",
        "cancelled" => "available",
        other => panic!("unexpected status {}", other),
    };
    for slot in &slots {
        assert_eq!(app.slot_status(slot).await, expected);
    }
}
