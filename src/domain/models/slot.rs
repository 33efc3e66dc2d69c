use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use thiserror::Error;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Pending,
    Confirmed,
    Blocked,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Pending => "pending",
            SlotStatus::Confirmed => "confirmed",
            SlotStatus::Blocked => "blocked",
        }
    }

    /// Held by a pending or confirmed booking.
    pub fn is_reserved(&self) -> bool {
        matches!(self, SlotStatus::Pending | SlotStatus::Confirmed)
    }
}

impl TryFrom<String> for SlotStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "available" => Ok(SlotStatus::Available),
            "pending" => Ok(SlotStatus::Pending),
            "confirmed" => Ok(SlotStatus::Confirmed),
            "blocked" => Ok(SlotStatus::Blocked),
            _ => Err(UnknownVariant::new("slot status", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    #[default]
    Regular,
    /// Squeeze-in slot; the extra fee is applied at invoice time.
    Surcharge,
}

impl SlotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotType::Regular => "regular",
            SlotType::Surcharge => "surcharge",
        }
    }
}

impl TryFrom<String> for SlotType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "regular" => Ok(SlotType::Regular),
            "surcharge" => Ok(SlotType::Surcharge),
            _ => Err(UnknownVariant::new("slot type", value)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Slot {
    pub id: String,
    pub provider_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[sqlx(try_from = "String")]
    pub status: SlotStatus,
    #[sqlx(try_from = "String")]
    pub slot_type: SlotType,
    pub hidden: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct NewSlotParams {
    pub provider_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: SlotStatus,
    pub slot_type: SlotType,
    pub notes: Option<String>,
}

impl Slot {
    pub fn new(params: NewSlotParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            provider_id: params.provider_id,
            date: params.date,
            time: params.time,
            status: params.status,
            slot_type: params.slot_type,
            hidden: false,
            notes: params.notes,
            created_at: Utc::now(),
        }
    }
}

/// Why a batch reservation was refused. Nothing is reserved when any of these occur.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReservationError {
    #[error("Slot {0} does not exist")]
    SlotNotFound(String),
    #[error("Slot {slot_id} does not belong to provider {provider_id}")]
    ProviderMismatch { slot_id: String, provider_id: String },
    #[error("Slot {slot_id} is no longer available (currently {status})")]
    SlotUnavailable { slot_id: String, status: String },
}

/// Slot transition performed in the same transaction as a booking status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotEffect {
    None,
    /// pending -> confirmed; every slot must currently be pending.
    Confirm,
    /// any -> available.
    Release,
}
