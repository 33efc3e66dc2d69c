use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::domain::models::slot::ReservationError;
use crate::domain::services::slot_resolver::ResolveError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),
    #[error("Slot reservation failed: {0}")]
    SlotReservation(#[from] ReservationError),
    #[error("Slot resolution failed: {0}")]
    SlotResolution(#[from] ResolveError),
    #[error("Precondition not met: {0}")]
    PreconditionNotMet(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::NotFound(_) => "not_found",
            AppError::CustomerNotFound(_) => "customer_not_found",
            AppError::SlotReservation(ReservationError::SlotNotFound(_)) => "slot_not_found",
            AppError::SlotReservation(ReservationError::ProviderMismatch { .. }) => "provider_mismatch",
            AppError::SlotReservation(ReservationError::SlotUnavailable { .. }) => "slot_unavailable",
            AppError::SlotResolution(ResolveError::InsufficientGrid { .. }) => "insufficient_grid",
            AppError::SlotResolution(ResolveError::GapInSequence { .. }) => "gap_in_sequence",
            AppError::SlotResolution(ResolveError::NotOnGrid { .. }) => "not_on_grid",
            AppError::PreconditionNotMet(_) => "precondition_not_met",
            AppError::Conflict(_) => "conflict",
            AppError::Validation(_) => "validation_error",
            AppError::Internal | AppError::InternalWithMsg(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match &self {
            AppError::Database(e) => {
                if let Some(db_err) = e.as_database_error() {
                    let db_code = db_err.code().unwrap_or_default();

                    // 2067 = SQLite Unique Constraint
                    // 23505 = PostgreSQL Unique Violation
                    if db_code == "2067" || db_code == "23505" {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "error": "Resource already exists (duplicate entry)", "code": "duplicate" }))
                        ).into_response();
                    }
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::NotFound(_) | AppError::CustomerNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::SlotReservation(_)
            | AppError::SlotResolution(_)
            | AppError::PreconditionNotMet(_)
            | AppError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message,
            "code": code
        }));

        (status, body).into_response()
    }
}
