use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::UnknownVariant;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientType {
    #[default]
    New,
    Repeat,
}

impl ClientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::New => "NEW",
            ClientType::Repeat => "REPEAT",
        }
    }
}

impl TryFrom<String> for ClientType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "NEW" => Ok(ClientType::New),
            "REPEAT" => Ok(ClientType::Repeat),
            _ => Err(UnknownVariant::new("client type", value)),
        }
    }
}

/// Rollups derived from a customer's bookings. Never edited directly; always
/// reproducible by replaying the bookings.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq, Eq, Default)]
pub struct CustomerStats {
    pub total_bookings: i64,
    pub completed_bookings: i64,
    pub total_spent: i64,
    pub total_tips: i64,
    pub total_discounts: i64,
    pub last_visit: Option<DateTime<Utc>>,
    #[sqlx(try_from = "String")]
    pub client_type: ClientType,
}

#[derive(Debug, Serialize, FromRow, Clone)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    #[sqlx(flatten)]
    pub stats: CustomerStats,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

impl CustomerDetails {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() || self.phone.trim().is_empty() {
            return Err(AppError::Validation("Customer name and phone are required".into()));
        }
        Ok(())
    }
}

impl Customer {
    pub fn new(details: CustomerDetails) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: details.name,
            phone: details.phone,
            email: details.email,
            stats: CustomerStats::default(),
            created_at: Utc::now(),
        }
    }
}
