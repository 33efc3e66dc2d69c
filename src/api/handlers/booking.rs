use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{
    CancelBookingRequest, CreateBookingRequest, NoShowRequest, PaymentProofRequest, PaymentRequest,
    RescheduleRequest, UpdateBookingRequest,
};
use crate::domain::services::booking_lifecycle::{
    BookingDetailsUpdate, CreateBookingCommand, CustomerRef, PaymentUpdate, SlotSelection,
};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let customer = match (payload.customer_id, payload.customer) {
        (Some(id), _) => CustomerRef::Existing(id),
        (None, Some(details)) => CustomerRef::Details(details),
        (None, None) => return Err(AppError::Validation("customer_id or customer details are required".into())),
    };

    let slots = match (payload.slot_ids, payload.start_slot_id) {
        (Some(ids), None) => SlotSelection::Explicit(ids),
        (None, Some(start_slot_id)) => SlotSelection::Consecutive {
            start_slot_id,
            required_slots: payload.required_slots.unwrap_or(1),
        },
        _ => return Err(AppError::Validation("Provide either slot_ids or start_slot_id".into())),
    };

    info!(provider_id = %payload.provider_id, "create_booking");

    let booking = state.booking_service.create_booking(CreateBookingCommand {
        customer,
        provider_id: payload.provider_id,
        slots,
        service: payload.service,
        total: payload.total,
        deposit_required: payload.deposit_required,
        discount: payload.discount,
        client_notes: payload.client_notes,
        admin_notes: payload.admin_notes,
    }).await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.get_booking(&booking_id).await?))
}

pub async fn get_booking_by_code(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.get_by_code(&code).await?))
}

pub async fn list_provider_bookings(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.list_for_provider(&provider_id).await?))
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<UpdateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state.booking_service.update_details(&booking_id, BookingDetailsUpdate {
        service: payload.service,
        total: payload.total,
        deposit_required: payload.deposit_required,
        discount: payload.discount,
        client_notes: payload.client_notes,
        admin_notes: payload.admin_notes,
    }).await?;
    Ok(Json(updated))
}

pub async fn update_payment(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<PaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state.booking_service.update_payment(&booking_id, PaymentUpdate {
        paid_amount: payload.paid_amount,
        tip_amount: payload.tip_amount,
        method: payload.method,
    }).await?;
    Ok(Json(updated))
}

pub async fn attach_payment_proof(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<PaymentProofRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.attach_payment_proof(&booking_id, payload.proof_url).await?))
}

pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.confirm_booking(&booking_id).await?))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<CancelBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let cancelled = state.booking_service
        .cancel_booking(&booking_id, payload.admin_override, payload.reason)
        .await?;
    Ok(Json(cancelled))
}

pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.mark_completed(&booking_id).await?))
}

pub async fn mark_no_show(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<NoShowRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.mark_no_show(&booking_id, payload.reason).await?))
}

pub async fn reschedule_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<RescheduleRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.reschedule_booking(&booking_id, payload.reason).await?))
}
