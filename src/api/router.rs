use axum::{
    body::Body,
    extract::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{health, slot, booking, customer};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Slot ledger
        .route("/api/v1/providers/{provider_id}/slots", post(slot::create_slots).get(slot::list_available_slots))
        .route("/api/v1/providers/{provider_id}/dates", get(slot::list_eligible_dates))
        .route("/api/v1/slots/{slot_id}", get(slot::get_slot).put(slot::update_slot).delete(slot::delete_slot))

        // Customers
        .route("/api/v1/customers", post(customer::register_customer))
        .route("/api/v1/customers/{customer_id}", get(customer::get_customer))
        .route("/api/v1/customers/{customer_id}/bookings", get(customer::list_customer_bookings))
        .route("/api/v1/customers/{customer_id}/stats/recompute", post(customer::recompute_stats))

        // Bookings
        .route("/api/v1/bookings", post(booking::create_booking))
        .route("/api/v1/bookings/by-code/{code}", get(booking::get_booking_by_code))
        .route("/api/v1/bookings/{booking_id}", get(booking::get_booking).put(booking::update_booking))
        .route("/api/v1/bookings/{booking_id}/payment", post(booking::update_payment))
        .route("/api/v1/bookings/{booking_id}/proof", post(booking::attach_payment_proof))
        .route("/api/v1/bookings/{booking_id}/confirm", post(booking::confirm_booking))
        .route("/api/v1/bookings/{booking_id}/cancel", post(booking::cancel_booking))
        .route("/api/v1/bookings/{booking_id}/complete", post(booking::complete_booking))
        .route("/api/v1/bookings/{booking_id}/no-show", post(booking::mark_no_show))
        .route("/api/v1/bookings/{booking_id}/reschedule", post(booking::reschedule_booking))
        .route("/api/v1/providers/{provider_id}/bookings", get(booking::list_provider_bookings))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
