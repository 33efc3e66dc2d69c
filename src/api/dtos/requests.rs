use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::domain::models::booking::ServiceDetails;
use crate::domain::models::customer::CustomerDetails;
use crate::domain::models::slot::{SlotStatus, SlotType};
use crate::error::AppError;

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_clock(value: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| AppError::Validation(format!("Invalid time '{}' (HH:MM)", value)))
}

#[derive(Deserialize)]
pub struct CreateSlotsRequest {
    pub dates: Vec<NaiveDate>,
    pub times: Vec<String>,
    pub status: Option<SlotStatus>,
    pub slot_type: Option<SlotType>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateSlotRequest {
    pub slot_type: Option<SlotType>,
    pub notes: Option<String>,
    pub hidden: Option<bool>,
    pub status: Option<SlotStatus>,
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub from: NaiveDate,
    /// Defaults to `from`.
    pub to: Option<NaiveDate>,
    pub required_slots: Option<usize>,
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    /// Existing customer; otherwise `customer` is looked up by phone or created.
    pub customer_id: Option<String>,
    pub customer: Option<CustomerDetails>,
    pub provider_id: String,
    pub slot_ids: Option<Vec<String>>,
    pub start_slot_id: Option<String>,
    pub required_slots: Option<usize>,
    pub service: ServiceDetails,
    pub total: i64,
    #[serde(default)]
    pub deposit_required: i64,
    #[serde(default)]
    pub discount: i64,
    pub client_notes: Option<String>,
    pub admin_notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateBookingRequest {
    pub service: Option<ServiceDetails>,
    pub total: Option<i64>,
    pub deposit_required: Option<i64>,
    pub discount: Option<i64>,
    pub client_notes: Option<String>,
    pub admin_notes: Option<String>,
}

#[derive(Deserialize)]
pub struct PaymentRequest {
    pub paid_amount: i64,
    #[serde(default)]
    pub tip_amount: i64,
    pub method: Option<String>,
}

#[derive(Deserialize)]
pub struct PaymentProofRequest {
    pub proof_url: String,
}

#[derive(Deserialize)]
pub struct CancelBookingRequest {
    #[serde(default)]
    pub admin_override: bool,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct NoShowRequest {
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct RescheduleRequest {
    pub reason: String,
}
