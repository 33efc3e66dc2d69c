use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow};

use super::UnknownVariant;
use super::customer::ClientType;
use super::slot::SlotEffect;
use crate::domain::services::payment::derive_payment_status;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
        }
    }

    /// Holds its slots.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// The booking state machine. Every status change goes through this table.
    pub fn on(self, action: BookingAction) -> Transition {
        use BookingAction as A;
        use BookingStatus::*;

        match (self, action) {
            (Pending, A::Confirm) => Transition::Apply(Confirmed),
            (Confirmed, A::Confirm) => Transition::AlreadyThere,
            (Confirmed, A::Complete) => Transition::Apply(Completed),
            (Pending | Confirmed, A::Cancel | A::Reschedule) => Transition::Apply(Cancelled),
            (Confirmed, A::NoShow) => Transition::Apply(NoShow),
            (Cancelled, A::Cancel) => Transition::AlreadyThere,
            (NoShow, A::NoShow) => Transition::AlreadyThere,
            (Pending, A::Complete) => Transition::Rejected("only confirmed bookings can be completed"),
            (Pending, A::NoShow) => Transition::Rejected("only confirmed bookings can be marked as no-show"),
            (Completed, _) => Transition::Rejected("booking is already completed"),
            (Cancelled, _) => Transition::Rejected("booking is cancelled"),
            (NoShow, _) => Transition::Rejected("booking was marked as no-show"),
        }
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "no_show" => Ok(BookingStatus::NoShow),
            _ => Err(UnknownVariant::new("booking status", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Confirm,
    Complete,
    Cancel,
    NoShow,
    Reschedule,
}

impl BookingAction {
    pub fn slot_effect(&self) -> SlotEffect {
        match self {
            BookingAction::Confirm => SlotEffect::Confirm,
            BookingAction::Complete => SlotEffect::None,
            BookingAction::Cancel | BookingAction::NoShow | BookingAction::Reschedule => SlotEffect::Release,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Apply(BookingStatus),
    AlreadyThere,
    Rejected(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "partial" => Ok(PaymentStatus::Partial),
            "paid" => Ok(PaymentStatus::Paid),
            _ => Err(UnknownVariant::new("payment status", value)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq, Eq)]
pub struct ServiceDetails {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(rename = "location")]
    pub service_location: String,
    #[serde(rename = "client_type")]
    #[sqlx(try_from = "String")]
    pub service_client_type: ClientType,
}

/// Amounts are integer currency units.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pricing {
    pub total: i64,
    pub deposit_required: i64,
    pub discount: i64,
    pub paid_amount: i64,
    pub tip_amount: i64,
}

impl Pricing {
    pub fn paid_so_far(&self) -> i64 {
        self.paid_amount.saturating_add(self.tip_amount)
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, Default, PartialEq, Eq)]
pub struct PaymentRecord {
    pub deposit_paid_at: Option<DateTime<Utc>>,
    pub fully_paid_at: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
    pub proof_url: Option<String>,
}

/// A customer's reservation of one or more slots with one provider.
///
/// Status, pricing and payment fields are private: status only changes through
/// [`BookingStatus::on`], and `payment_status` is recomputed every time the
/// amounts move.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub booking_code: String,
    pub customer_id: String,
    pub provider_id: String,
    slot_ids: Json<Vec<String>>,
    #[sqlx(flatten)]
    service: ServiceDetails,
    #[sqlx(try_from = "String")]
    status: BookingStatus,
    #[sqlx(try_from = "String")]
    payment_status: PaymentStatus,
    #[sqlx(flatten)]
    pricing: Pricing,
    #[sqlx(flatten)]
    payment: PaymentRecord,
    confirmed_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    pub status_reason: Option<String>,
    pub client_notes: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by every stored write; writes compare against the value they read.
    #[serde(skip)]
    version: i64,
}

pub struct NewBookingParams {
    pub booking_code: String,
    pub customer_id: String,
    pub provider_id: String,
    pub slot_ids: Vec<String>,
    pub service: ServiceDetails,
    pub total: i64,
    pub deposit_required: i64,
    pub discount: i64,
    pub client_notes: Option<String>,
    pub admin_notes: Option<String>,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        let now = Utc::now();
        let mut booking = Self {
            id: Uuid::new_v4().to_string(),
            booking_code: params.booking_code,
            customer_id: params.customer_id,
            provider_id: params.provider_id,
            slot_ids: Json(params.slot_ids),
            service: params.service,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            pricing: Pricing {
                total: params.total,
                deposit_required: params.deposit_required,
                discount: params.discount,
                paid_amount: 0,
                tip_amount: 0,
            },
            payment: PaymentRecord::default(),
            confirmed_at: None,
            completed_at: None,
            status_reason: None,
            client_notes: params.client_notes,
            admin_notes: params.admin_notes,
            created_at: now,
            updated_at: now,
            version: 0,
        };
        booking.refresh_payment_status(now);
        booking
    }

    pub fn slot_ids(&self) -> &[String] {
        &self.slot_ids.0
    }

    pub fn service(&self) -> &ServiceDetails {
        &self.service
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn pricing(&self) -> &Pricing {
        &self.pricing
    }

    pub fn payment(&self) -> &PaymentRecord {
        &self.payment
    }

    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub(crate) fn record_payment(&mut self, paid_amount: i64, tip_amount: i64, method: Option<String>, now: DateTime<Utc>) {
        self.pricing.paid_amount = paid_amount;
        self.pricing.tip_amount = tip_amount;
        if method.is_some() {
            self.payment.payment_method = method;
        }
        self.refresh_payment_status(now);
        self.updated_at = now;
    }

    pub(crate) fn attach_proof(&mut self, proof_url: String, now: DateTime<Utc>) {
        self.payment.proof_url = Some(proof_url);
        self.updated_at = now;
    }

    pub(crate) fn reprice(&mut self, total: i64, deposit_required: i64, discount: i64, now: DateTime<Utc>) -> Result<(), AppError> {
        self.ensure_mutable()?;
        self.pricing.total = total;
        self.pricing.deposit_required = deposit_required;
        self.pricing.discount = discount;
        self.refresh_payment_status(now);
        self.updated_at = now;
        Ok(())
    }

    pub(crate) fn change_service(&mut self, service: ServiceDetails, now: DateTime<Utc>) -> Result<(), AppError> {
        self.ensure_mutable()?;
        self.service = service;
        self.updated_at = now;
        Ok(())
    }

    /// Moves to `to`. `confirmed_at` is stamped once; `completed_at` is stamped on completion and never cleared.
    pub(crate) fn enter(&mut self, to: BookingStatus, reason: Option<String>, now: DateTime<Utc>) {
        self.status = to;
        if reason.is_some() {
            self.status_reason = reason;
        }
        if to == BookingStatus::Confirmed && self.confirmed_at.is_none() {
            self.confirmed_at = Some(now);
        }
        if to == BookingStatus::Completed {
            self.completed_at = Some(now);
        }
        self.updated_at = now;
    }

    fn ensure_mutable(&self) -> Result<(), AppError> {
        if self.is_completed() {
            return Err(AppError::PreconditionNotMet(
                "completed bookings cannot change their service or pricing".into(),
            ));
        }
        Ok(())
    }

    fn refresh_payment_status(&mut self, now: DateTime<Utc>) {
        let p = &self.pricing;
        self.payment_status = derive_payment_status(p.paid_amount, p.tip_amount, p.total, p.deposit_required);

        let paid_so_far = p.paid_so_far();
        if self.payment.deposit_paid_at.is_none() && paid_so_far > 0 && paid_so_far >= p.deposit_required {
            self.payment.deposit_paid_at = Some(now);
        }
        if self.payment.fully_paid_at.is_none() && self.payment_status == PaymentStatus::Paid {
            self.payment.fully_paid_at = Some(now);
        }
    }
}
