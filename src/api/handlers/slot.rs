use axum::{extract::{State, Path, Query}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{parse_clock, AvailabilityQuery, CreateSlotsRequest, UpdateSlotRequest};
use crate::api::dtos::responses::{AvailableSlotsResponse, EligibleDatesResponse};
use crate::domain::models::slot::{SlotStatus, SlotType};
use crate::domain::services::slot_ledger::{CreateSlotsCommand, SlotUpdate};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn create_slots(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
    Json(payload): Json<CreateSlotsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let times = payload.times.iter()
        .map(|t| parse_clock(t))
        .collect::<Result<Vec<_>, _>>()?;

    let outcome = state.slot_ledger.create_slots(CreateSlotsCommand {
        provider_id,
        dates: payload.dates,
        times,
        status: payload.status.unwrap_or(SlotStatus::Available),
        slot_type: payload.slot_type.unwrap_or(SlotType::Regular),
        notes: payload.notes,
    }).await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn list_available_slots(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let required_slots = query.required_slots.unwrap_or(1);
    if required_slots == 0 {
        return Err(AppError::Validation("required_slots must be at least 1".into()));
    }
    let to = query.to.unwrap_or(query.from);

    let slots = state.slot_ledger.list_available(&provider_id, query.from, to, required_slots).await?;
    Ok(Json(AvailableSlotsResponse { provider_id, required_slots, slots }))
}

pub async fn list_eligible_dates(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let required_slots = query.required_slots.unwrap_or(1).max(1);
    let to = query.to.unwrap_or(query.from);

    let dates = state.slot_ledger.eligible_dates(&provider_id, query.from, to, required_slots).await?;
    Ok(Json(EligibleDatesResponse { provider_id, dates }))
}

pub async fn get_slot(
    State(state): State<Arc<AppState>>,
    Path(slot_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.slot_ledger.find(&slot_id).await?))
}

pub async fn update_slot(
    State(state): State<Arc<AppState>>,
    Path(slot_id): Path<String>,
    Json(payload): Json<UpdateSlotRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state.slot_ledger.update_slot(&slot_id, SlotUpdate {
        slot_type: payload.slot_type,
        notes: payload.notes,
        hidden: payload.hidden,
        status: payload.status,
    }).await?;
    Ok(Json(updated))
}

pub async fn delete_slot(
    State(state): State<Arc<AppState>>,
    Path(slot_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.slot_ledger.delete_slot(&slot_id).await?;
    info!("Deleted slot {}", slot_id);
    Ok(StatusCode::NO_CONTENT)
}
