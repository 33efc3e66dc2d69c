use crate::domain::models::{
    booking::{Booking, BookingStatus},
    customer::{Customer, CustomerDetails, CustomerStats},
    slot::{Slot, SlotEffect},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Persistence of slot records. Every status write is a conditional update on the
/// stored status, never a read followed by a blind write.
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Returns `None` when a slot already exists at the same provider/date/time.
    async fn create(&self, slot: &Slot) -> Result<Option<Slot>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Slot>, AppError>;
    async fn list_by_day(&self, provider_id: &str, date: NaiveDate) -> Result<Vec<Slot>, AppError>;
    async fn list_by_range(&self, provider_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Slot>, AppError>;

    /// All-or-nothing: every slot moves available -> pending, or none does.
    async fn reserve(&self, provider_id: &str, slot_ids: &[String]) -> Result<(), AppError>;
    async fn release(&self, slot_ids: &[String]) -> Result<(), AppError>;

    /// Staff edit of type/notes/hidden/status. `None` when the slot is held by an active booking.
    async fn update_unreserved(&self, slot: &Slot) -> Result<Option<Slot>, AppError>;
    /// `false` when the slot is held by an active booking.
    async fn delete_unreserved(&self, id: &str) -> Result<bool, AppError>;
    async fn delete_past_unreserved(&self, before: NaiveDate) -> Result<u64, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn find_by_code(&self, code: &str) -> Result<Option<Booking>, AppError>;
    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Booking>, AppError>;
    async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<Booking>, AppError>;
    async fn list_stale_pending(&self, created_before: DateTime<Utc>) -> Result<Vec<Booking>, AppError>;

    /// Persists pricing, payment and notes. `None` if the stored row is no longer at
    /// `expected` status and the booking's version.
    async fn update_details(&self, booking: &Booking, expected: BookingStatus) -> Result<Option<Booking>, AppError>;

    /// Compare-and-swap from `expected` to the booking's current status, applying
    /// `effect` to its slots in the same transaction. `None` if the stored row is no
    /// longer at `expected` status and the booking's version.
    async fn transition(&self, booking: &Booking, expected: BookingStatus, effect: SlotEffect) -> Result<Option<Booking>, AppError>;
}

#[async_trait]
pub trait BookingCounterRepository: Send + Sync {
    /// Atomically increments and returns the sequence for `date_key`, starting at 1.
    async fn next_sequence(&self, date_key: NaiveDate) -> Result<i64, AppError>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_or_create(&self, details: &CustomerDetails) -> Result<Customer, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Customer>, AppError>;
    async fn update_stats(&self, id: &str, stats: &CustomerStats) -> Result<(), AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str, attachment_name: Option<&str>, attachment_data: Option<&[u8]>) -> Result<(), AppError>;
}

/// Mirror of bookings kept outside the database (e.g. a spreadsheet).
#[async_trait]
pub trait BackupSync: Send + Sync {
    async fn push_booking(&self, booking: &Booking, customer: &Customer) -> Result<(), AppError>;
}
