use crate::domain::models::{booking::Booking, customer::Customer};
use crate::domain::ports::BackupSync;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

/// Posts each new booking as one flat row to an external sheet endpoint.
pub struct HttpBackupSync {
    client: Client,
    endpoint: String,
}

impl HttpBackupSync {
    pub fn new(endpoint: String) -> Self {
        Self { client: Client::new(), endpoint }
    }
}

#[derive(Serialize)]
struct BookingRow<'a> {
    booking_code: &'a str,
    status: &'a str,
    customer_name: &'a str,
    customer_phone: &'a str,
    customer_email: Option<&'a str>,
    service_type: &'a str,
    service_location: &'a str,
    client_type: &'a str,
    slot_ids: &'a [String],
    total: i64,
    deposit_required: i64,
    discount: i64,
    created_at: String,
}

#[async_trait]
impl BackupSync for HttpBackupSync {
    async fn push_booking(&self, booking: &Booking, customer: &Customer) -> Result<(), AppError> {
        let service = booking.service();
        let pricing = booking.pricing();
        let row = BookingRow {
            booking_code: &booking.booking_code,
            status: booking.status().as_str(),
            customer_name: &customer.name,
            customer_phone: &customer.phone,
            customer_email: customer.email.as_deref(),
            service_type: &service.service_type,
            service_location: &service.service_location,
            client_type: service.service_client_type.as_str(),
            slot_ids: booking.slot_ids(),
            total: pricing.total,
            deposit_required: pricing.deposit_required,
            discount: pricing.discount,
            created_at: booking.created_at.to_rfc3339(),
        };

        let res = self.client.post(&self.endpoint)
            .json(&row)
            .send()
            .await
            .map_err(|e| AppError::InternalWithMsg(format!("Backup sync connection error: {}", e)))?;

        if !res.status().is_success() {
            return Err(AppError::InternalWithMsg(format!("Backup sync failed. Status: {}", res.status())));
        }
        Ok(())
    }
}

/// Used when no backup endpoint is configured.
pub struct NoopBackupSync;

#[async_trait]
impl BackupSync for NoopBackupSync {
    async fn push_booking(&self, _booking: &Booking, _customer: &Customer) -> Result<(), AppError> {
        Ok(())
    }
}
