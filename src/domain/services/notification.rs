use std::sync::Arc;

use chrono::Duration;
use chrono_tz::Tz;
use serde_json::json;
use tera::{Context, Tera};
use tracing::{error, info, warn};

use crate::domain::models::{booking::Booking, customer::Customer, slot::Slot};
use crate::domain::ports::{BackupSync, EmailService};
use crate::domain::services::calendar::generate_ics;
use crate::error::AppError;

pub const CONFIRMATION_TEMPLATE: &str = "booking_confirmation.html";

/// Outbound side effects of a new booking. Failures are logged and never reach the caller.
pub struct BookingNotifier {
    email: Arc<dyn EmailService>,
    backup: Arc<dyn BackupSync>,
    templates: Arc<Tera>,
    timezone: Tz,
    interval_min: u32,
}

impl BookingNotifier {
    pub fn new(email: Arc<dyn EmailService>, backup: Arc<dyn BackupSync>, templates: Arc<Tera>, timezone: Tz, interval_min: u32) -> Self {
        Self { email, backup, templates, timezone, interval_min }
    }

    pub async fn booking_created(&self, booking: &Booking, customer: &Customer, slots: &[Slot]) {
        if let Some(email) = &customer.email {
            match self.send_confirmation(email, booking, customer, slots).await {
                Ok(()) => info!(booking_code = %booking.booking_code, "Confirmation email sent"),
                Err(e) => error!(booking_code = %booking.booking_code, "Confirmation email failed: {}", e),
            }
        }

        if let Err(e) = self.backup.push_booking(booking, customer).await {
            warn!(booking_code = %booking.booking_code, "Backup sync failed: {}", e);
        }
    }

    pub fn render_confirmation(&self, booking: &Booking, customer: &Customer, slots: &[Slot]) -> Result<String, AppError> {
        let first = slots.iter().min_by_key(|s| s.time);
        let last = slots.iter().max_by_key(|s| s.time);
        let end = last.map(|s| (s.time + Duration::minutes(self.interval_min as i64)).format("%H:%M").to_string());

        let service = booking.service();
        let pricing = booking.pricing();
        let data = json!({
            "customer_name": customer.name,
            "booking_code": booking.booking_code,
            "service_type": service.service_type,
            "service_location": service.service_location,
            "date": first.map(|s| s.date.to_string()).unwrap_or_default(),
            "start_time": first.map(|s| s.time.format("%H:%M").to_string()).unwrap_or_default(),
            "end_time": end.unwrap_or_default(),
            "total": pricing.total,
            "deposit_required": pricing.deposit_required,
        });

        let context = Context::from_value(data).map_err(|_| AppError::Internal)?;
        self.templates.render(CONFIRMATION_TEMPLATE, &context)
            .map_err(|e| AppError::InternalWithMsg(format!("Template render error: {}", e)))
    }

    async fn send_confirmation(&self, recipient: &str, booking: &Booking, customer: &Customer, slots: &[Slot]) -> Result<(), AppError> {
        let body = self.render_confirmation(booking, customer, slots)?;
        let subject = format!("Booking received: {}", booking.booking_code);
        let ics = generate_ics(booking, slots, self.interval_min, self.timezone);

        self.email.send(
            recipient,
            &subject,
            &body,
            ics.as_ref().map(|_| "booking.ics"),
            ics.as_ref().map(|s| s.as_bytes()),
        ).await
    }
}
