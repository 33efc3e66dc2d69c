mod common;

use axum::http::StatusCode;
use common::{TestApp, PROVIDER};
use serde_json::json;

#[tokio::test]
async fn test_end_to_end_deposit_confirm_complete() {
    let app = TestApp::new().await;
    let customer_id = app.register_customer("Carla", "+63 900 000 0001", Some("carla@example.com")).await;
    let slots = app.seed_slots(PROVIDER, "2024-06-01", &["09:00", "09:30", "10:00"]).await;

    let (status, booking) = app.request("POST", "/api/v1/bookings", Some(json!({
        "customer_id": customer_id,
        "provider_id": PROVIDER,
        "start_slot_id": slots[0],
        "required_slots": 2,
        "service": { "type": "Gel Manicure", "location": "Studio", "client_type": "NEW" },
        "total": 1500,
        "deposit_required": 500,
    }))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", booking);
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["payment_status"], "unpaid");
    assert_eq!(booking["slot_ids"], json!([slots[0], slots[1]]));
    let booking_id = booking["id"].as_str().unwrap().to_string();

    assert_eq!(app.slot_status(&slots[0]).await, "pending");
    assert_eq!(app.slot_status(&slots[1]).await, "pending");
    assert_eq!(app.slot_status(&slots[2]).await, "available");

    let (status, paid) = app.request("POST", &format!("/api/v1/bookings/{}/payment", booking_id), Some(json!({
        "paid_amount": 500, "method": "gcash"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["payment_status"], "partial");
    assert!(paid["payment"]["deposit_paid_at"].is_string());
    assert!(paid["payment"]["fully_paid_at"].is_null());

    let (status, confirmed) = app.request("POST", &format!("/api/v1/bookings/{}/confirm", booking_id), None).await;
    assert_eq!(status, StatusCode::OK, "{}", confirmed);
    assert_eq!(confirmed["status"], "confirmed");
    assert!(confirmed["confirmed_at"].is_string());
    assert_eq!(app.slot_status(&slots[0]).await, "confirmed");
    assert_eq!(app.slot_status(&slots[1]).await, "confirmed");

    let (status, completed) = app.request("POST", &format!("/api/v1/bookings/{}/complete", booking_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "completed");
    assert!(completed["completed_at"].is_string());

    let (_, customer) = app.request("GET", &format!("/api/v1/customers/{}", customer_id), None).await;
    assert_eq!(customer["stats"]["total_bookings"], 1);
    assert_eq!(customer["stats"]["completed_bookings"], 1);
    assert_eq!(customer["stats"]["total_spent"], 500);
    assert_eq!(customer["stats"]["client_type"], "NEW");
    assert!(customer["stats"]["last_visit"].is_string());
}

#[tokio::test]
async fn test_confirm_requires_deposit() {
    let app = TestApp::new().await;
    let customer_id = app.register_customer("Dana", "0917", None).await;
    let slots = app.seed_slots(PROVIDER, "2030-03-04", &["11:00"]).await;

    let (_, booking) = app.book(&customer_id, &slots, 1000, 300).await;
    let booking_id = booking["id"].as_str().unwrap();

    let (status, body) = app.request("POST", &format!("/api/v1/bookings/{}/confirm", booking_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "precondition_not_met");
    assert_eq!(app.slot_status(&slots[0]).await, "pending");

    app.request("POST", &format!("/api/v1/bookings/{}/payment", booking_id), Some(json!({
        "paid_amount": 200, "tip_amount": 100
    }))).await;
    let (status, _) = app.request("POST", &format!("/api/v1/bookings/{}/confirm", booking_id), None).await;
    assert_eq!(status, StatusCode::OK);

    // Confirming again is a no-op.
    let (status, again) = app.request("POST", &format!("/api/v1/bookings/{}/confirm", booking_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["status"], "confirmed");
}

#[tokio::test]
async fn test_cancel_confirmed_needs_override() {
    let app = TestApp::new().await;
    let customer_id = app.register_customer("Eve", "0918", None).await;
    let slots = app.seed_slots(PROVIDER, "2030-03-05", &["13:00", "13:30"]).await;

    let (_, booking) = app.book(&customer_id, &slots, 800, 0).await;
    let booking_id = booking["id"].as_str().unwrap();
    app.request("POST", &format!("/api/v1/bookings/{}/confirm", booking_id), None).await;

    let (status, body) = app.request("POST", &format!("/api/v1/bookings/{}/cancel", booking_id), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "precondition_not_met");

    let (status, body) = app.request("POST", &format!("/api/v1/bookings/{}/cancel", booking_id), Some(json!({
        "admin_override": true
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "override without a reason: {}", body);

    let (status, cancelled) = app.request("POST", &format!("/api/v1/bookings/{}/cancel", booking_id), Some(json!({
        "admin_override": true, "reason": "Provider sick"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["status_reason"], "Provider sick");
    for slot in &slots {
        assert_eq!(app.slot_status(slot).await, "available");
    }

    // Re-cancelling is idempotent.
    let (status, again) = app.request("POST", &format!("/api/v1/bookings/{}/cancel", booking_id), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["status"], "cancelled");
}

#[tokio::test]
async fn test_customer_cancels_pending_without_reason() {
    let app = TestApp::new().await;
    let customer_id = app.register_customer("Fay", "0919", None).await;
    let slots = app.seed_slots(PROVIDER, "2030-03-06", &["15:00"]).await;

    let (_, booking) = app.book(&customer_id, &slots, 500, 100).await;
    let (status, cancelled) = app.request("POST", &format!("/api/v1/bookings/{}/cancel", booking["id"].as_str().unwrap()), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(app.slot_status(&slots[0]).await, "available");

    // The freed slot can be booked again and gets a fresh code.
    let (status, rebooked) = app.book(&customer_id, &slots, 500, 100).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(rebooked["booking_code"], booking["booking_code"]);
}

#[tokio::test]
async fn test_mark_completed_rules() {
    let app = TestApp::new().await;
    let customer_id = app.register_customer("Gia", "0920", None).await;
    let slots = app.seed_slots(PROVIDER, "2030-03-07", &["10:00"]).await;

    let (_, booking) = app.book(&customer_id, &slots, 1200, 0).await;
    let booking_id = booking["id"].as_str().unwrap();

    let (status, body) = app.request("POST", &format!("/api/v1/bookings/{}/complete", booking_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "precondition_not_met");

    app.request("POST", &format!("/api/v1/bookings/{}/confirm", booking_id), None).await;
    app.request("POST", &format!("/api/v1/bookings/{}/payment", booking_id), Some(json!({
        "paid_amount": 1200, "tip_amount": 100
    }))).await;

    let (status, completed) = app.request("POST", &format!("/api/v1/bookings/{}/complete", booking_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["payment_status"], "paid");

    let (status, _) = app.request("POST", &format!("/api/v1/bookings/{}/complete", booking_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, customer) = app.request("GET", &format!("/api/v1/customers/{}", customer_id), None).await;
    assert_eq!(customer["stats"]["total_spent"], 1200);
    assert_eq!(customer["stats"]["total_tips"], 100);
}

#[tokio::test]
async fn test_completed_booking_is_immutable() {
    let app = TestApp::new().await;
    let customer_id = app.register_customer("Hana", "0921", None).await;
    let slots = app.seed_slots(PROVIDER, "2030-03-08", &["10:00"]).await;

    let (_, booking) = app.book(&customer_id, &slots, 900, 0).await;
    let booking_id = booking["id"].as_str().unwrap();
    app.request("POST", &format!("/api/v1/bookings/{}/confirm", booking_id), None).await;
    app.request("POST", &format!("/api/v1/bookings/{}/complete", booking_id), None).await;

    let (status, _) = app.request("PUT", &format!("/api/v1/bookings/{}", booking_id), Some(json!({ "total": 100 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, notes) = app.request("PUT", &format!("/api/v1/bookings/{}", booking_id), Some(json!({ "admin_notes": "Loved it" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notes["admin_notes"], "Loved it");
    assert_eq!(notes["pricing"]["total"], 900);

    let (status, _) = app.request("POST", &format!("/api/v1/bookings/{}/cancel", booking_id), Some(json!({
        "admin_override": true, "reason": "too late"
    }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_no_show_frees_slots() {
    let app = TestApp::new().await;
    let customer_id = app.register_customer("Ivy", "0922", None).await;
    let slots = app.seed_slots(PROVIDER, "2030-03-09", &["16:00", "16:30"]).await;

    let (_, booking) = app.book(&customer_id, &slots, 700, 0).await;
    let booking_id = booking["id"].as_str().unwrap();

    let (status, _) = app.request("POST", &format!("/api/v1/bookings/{}/no-show", booking_id), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT, "pending bookings cannot be no-shows");

    app.request("POST", &format!("/api/v1/bookings/{}/confirm", booking_id), None).await;
    let (status, no_show) = app.request("POST", &format!("/api/v1/bookings/{}/no-show", booking_id), Some(json!({
        "reason": "Did not arrive"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(no_show["status"], "no_show");
    for slot in &slots {
        assert_eq!(app.slot_status(slot).await, "available");
    }

    let (status, body) = app.request("POST", &format!("/api/v1/bookings/{}/payment", booking_id), Some(json!({
        "paid_amount": 100
    }))).await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);
}

#[tokio::test]
async fn test_reschedule_requires_reason() {
    let app = TestApp::new().await;
    let customer_id = app.register_customer("Jo", "0923", None).await;
    let slots = app.seed_slots(PROVIDER, "2030-03-10", &["09:00"]).await;

    let (_, booking) = app.book(&customer_id, &slots, 600, 0).await;
    let booking_id = booking["id"].as_str().unwrap();

    let (status, _) = app.request("POST", &format!("/api/v1/bookings/{}/reschedule", booking_id), Some(json!({ "reason": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, moved) = app.request("POST", &format!("/api/v1/bookings/{}/reschedule", booking_id), Some(json!({
        "reason": "moved to Friday"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["status"], "cancelled");
    assert_eq!(moved["status_reason"], "Rescheduled: moved to Friday");
    assert_eq!(app.slot_status(&slots[0]).await, "available");
}

#[tokio::test]
async fn test_booking_lookup_and_inline_customer() {
    let app = TestApp::new().await;
    let slots = app.seed_slots(PROVIDER, "2030-03-11", &["12:00"]).await;

    let (status, booking) = app.request("POST", "/api/v1/bookings", Some(json!({
        "customer": { "name": "Kim", "phone": "0924", "email": "kim@example.com" },
        "provider_id": PROVIDER,
        "slot_ids": slots,
        "service": { "type": "Pedicure", "location": "Home service", "client_type": "NEW" },
        "total": 650,
    }))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", booking);
    let code = booking["booking_code"].as_str().unwrap();
    assert!(code.starts_with("BK-"));
    assert!(code.ends_with("001"));

    let (status, by_code) = app.request("GET", &format!("/api/v1/bookings/by-code/{}", code), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_code["id"], booking["id"]);

    // The same phone resolves to the same customer.
    let again = app.register_customer("Kim", "0924", None).await;
    assert_eq!(again, booking["customer_id"].as_str().unwrap());

    let (_, listed) = app.request("GET", &format!("/api/v1/customers/{}/bookings", again), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let (_, by_provider) = app.request("GET", &format!("/api/v1/providers/{}/bookings", PROVIDER), None).await;
    assert_eq!(by_provider.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_customer_reserves_nothing() {
    let app = TestApp::new().await;
    let slots = app.seed_slots(PROVIDER, "2030-03-12", &["12:00"]).await;

    let (status, body) = app.book("missing-customer", &slots, 100, 0).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "customer_not_found");
    assert_eq!(app.slot_status(&slots[0]).await, "available");
}

#[tokio::test]
async fn test_confirmation_email_and_backup_are_sent() {
    let app = TestApp::new().await;
    let customer_id = app.register_customer("Lea", "0925", Some("lea@example.com")).await;
    let slots = app.seed_slots(PROVIDER, "2030-03-13", &["14:00", "14:30"]).await;

    let (status, booking) = app.book(&customer_id, &slots, 1000, 200).await;
    assert_eq!(status, StatusCode::CREATED);
    let code = booking["booking_code"].as_str().unwrap().to_string();

    let mut delivered = false;
    for _ in 0..50 {
        if !app.email.sent.lock().unwrap().is_empty() && !app.backup.pushed.lock().unwrap().is_empty() {
            delivered = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(delivered, "notification side effects did not run");

    let mail = app.email.sent.lock().unwrap()[0].clone();
    assert_eq!(mail.recipient, "lea@example.com");
    assert!(mail.subject.contains(&code));
    assert_eq!(mail.attachment_name.as_deref(), Some("booking.ics"));
    assert_eq!(app.backup.pushed.lock().unwrap()[0], code);
}
