use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::domain::models::customer::CustomerDetails;
use crate::error::AppError;
use std::sync::Arc;

pub async fn register_customer(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CustomerDetails>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Json(state.customer_repo.find_or_create(&payload).await?))
}

pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let customer = state.customer_repo.find_by_id(&customer_id).await?
        .ok_or(AppError::CustomerNotFound(customer_id))?;
    Ok(Json(customer))
}

pub async fn list_customer_bookings(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.list_for_customer(&customer_id).await?))
}

/// Rebuilds the rollups from the customer's bookings.
pub async fn recompute_stats(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if state.customer_repo.find_by_id(&customer_id).await?.is_none() {
        return Err(AppError::CustomerNotFound(customer_id));
    }
    Ok(Json(state.booking_service.stats().recompute_customer_stats(&customer_id).await?))
}
