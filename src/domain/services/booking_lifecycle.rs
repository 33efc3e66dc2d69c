use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::domain::models::booking::{
    Booking, BookingAction, BookingStatus, NewBookingParams, ServiceDetails, Transition,
};
use crate::domain::models::customer::{Customer, CustomerDetails};
use crate::domain::models::slot::{ReservationError, Slot};
use crate::domain::ports::{BookingRepository, CustomerRepository};
use crate::domain::services::booking_code::BookingCodeGenerator;
use crate::domain::services::notification::BookingNotifier;
use crate::domain::services::payment::StatsAggregator;
use crate::domain::services::slot_ledger::SlotLedger;
use crate::domain::services::slot_resolver::resolve;
use crate::error::AppError;

pub const RESCHEDULE_REASON_PREFIX: &str = "Rescheduled: ";

/// How the slots of a new booking are chosen.
#[derive(Debug, Clone)]
pub enum SlotSelection {
    Explicit(Vec<String>),
    /// Start slot plus the consecutive slots resolved along the time grid.
    Consecutive { start_slot_id: String, required_slots: usize },
}

/// Who the booking is for.
#[derive(Debug, Clone)]
pub enum CustomerRef {
    Existing(String),
    /// Looked up by phone, created when unknown.
    Details(CustomerDetails),
}

#[derive(Debug, Clone)]
pub struct CreateBookingCommand {
    pub customer: CustomerRef,
    pub provider_id: String,
    pub slots: SlotSelection,
    pub service: ServiceDetails,
    pub total: i64,
    pub deposit_required: i64,
    pub discount: i64,
    pub client_notes: Option<String>,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PaymentUpdate {
    pub paid_amount: i64,
    pub tip_amount: i64,
    pub method: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BookingDetailsUpdate {
    pub service: Option<ServiceDetails>,
    pub total: Option<i64>,
    pub deposit_required: Option<i64>,
    pub discount: Option<i64>,
    pub client_notes: Option<String>,
    pub admin_notes: Option<String>,
}

/// Drives bookings through their lifecycle in lock-step with their slots.
pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    customers: Arc<dyn CustomerRepository>,
    ledger: Arc<SlotLedger>,
    codes: BookingCodeGenerator,
    stats: StatsAggregator,
    notifier: Arc<BookingNotifier>,
}

impl BookingService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        customers: Arc<dyn CustomerRepository>,
        ledger: Arc<SlotLedger>,
        codes: BookingCodeGenerator,
        notifier: Arc<BookingNotifier>,
    ) -> Self {
        let stats = StatsAggregator::new(bookings.clone(), customers.clone());
        Self { bookings, customers, ledger, codes, stats, notifier }
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    pub async fn get_booking(&self, booking_id: &str) -> Result<Booking, AppError> {
        self.bookings.find_by_id(booking_id).await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))
    }

    pub async fn get_by_code(&self, code: &str) -> Result<Booking, AppError> {
        self.bookings.find_by_code(code).await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", code)))
    }

    pub async fn list_for_customer(&self, customer_id: &str) -> Result<Vec<Booking>, AppError> {
        self.bookings.list_by_customer(customer_id).await
    }

    pub async fn list_for_provider(&self, provider_id: &str) -> Result<Vec<Booking>, AppError> {
        self.bookings.list_by_provider(provider_id).await
    }

    /// Pending bookings created before `cutoff` that still have no payment proof.
    pub async fn stale_pending(&self, cutoff: DateTime<Utc>) -> Result<Vec<Booking>, AppError> {
        self.bookings.list_stale_pending(cutoff).await
    }

    pub async fn create_booking(&self, cmd: CreateBookingCommand) -> Result<Booking, AppError> {
        validate_new_booking(&cmd)?;

        let customer = self.resolve_customer(&cmd.customer).await?;

        let slot_ids = self.select_slots(&cmd.provider_id, &cmd.slots).await?;
        self.ledger.validate_and_reserve(&slot_ids, &cmd.provider_id).await?;

        let code = match self.codes.next_for_now().await {
            Ok(code) => code,
            Err(e) => {
                self.compensate(&slot_ids).await;
                return Err(e);
            }
        };

        let booking = Booking::new(NewBookingParams {
            booking_code: code,
            customer_id: customer.id.clone(),
            provider_id: cmd.provider_id,
            slot_ids: slot_ids.clone(),
            service: cmd.service,
            total: cmd.total,
            deposit_required: cmd.deposit_required,
            discount: cmd.discount,
            client_notes: cmd.client_notes,
            admin_notes: cmd.admin_notes,
        });

        let created = match self.bookings.create(&booking).await {
            Ok(created) => created,
            Err(e) => {
                error!(booking_code = %booking.booking_code, "Booking insert failed after reservation: {}", e);
                self.compensate(&slot_ids).await;
                return Err(e);
            }
        };

        info!(booking_id = %created.id, booking_code = %created.booking_code, slots = ?slot_ids, "Booking created");
        self.refresh_stats(&created.customer_id).await;
        self.notify_created(&created, customer);
        Ok(created)
    }

    pub async fn update_payment(&self, booking_id: &str, update: PaymentUpdate) -> Result<Booking, AppError> {
        if update.paid_amount < 0 || update.tip_amount < 0 {
            return Err(AppError::Validation("Payment amounts must not be negative".into()));
        }
        if update.paid_amount.checked_add(update.tip_amount).is_none() {
            return Err(AppError::Validation("Payment amounts are out of range".into()));
        }
        let mut booking = self.get_booking(booking_id).await?;
        ensure_open(&booking)?;

        booking.record_payment(update.paid_amount, update.tip_amount, update.method, Utc::now());
        let updated = self.persist_details(&booking).await?;
        info!(booking_id, payment_status = updated.payment_status().as_str(), "Payment updated");

        if updated.is_completed() {
            self.refresh_stats(&updated.customer_id).await;
        }
        Ok(updated)
    }

    pub async fn attach_payment_proof(&self, booking_id: &str, proof_url: String) -> Result<Booking, AppError> {
        if proof_url.trim().is_empty() {
            return Err(AppError::Validation("proof_url is required".into()));
        }
        let mut booking = self.get_booking(booking_id).await?;
        ensure_open(&booking)?;

        booking.attach_proof(proof_url, Utc::now());
        self.persist_details(&booking).await
    }

    pub async fn update_details(&self, booking_id: &str, update: BookingDetailsUpdate) -> Result<Booking, AppError> {
        let mut booking = self.get_booking(booking_id).await?;
        let now = Utc::now();

        if let Some(service) = update.service {
            validate_service(&service)?;
            booking.change_service(service, now)?;
        }
        if update.total.is_some() || update.deposit_required.is_some() || update.discount.is_some() {
            let current = *booking.pricing();
            let total = update.total.unwrap_or(current.total);
            let deposit = update.deposit_required.unwrap_or(current.deposit_required);
            let discount = update.discount.unwrap_or(current.discount);
            validate_amounts(total, deposit, discount)?;
            booking.reprice(total, deposit, discount, now)?;
        }
        if let Some(notes) = update.client_notes {
            booking.client_notes = if notes.is_empty() { None } else { Some(notes) };
        }
        if let Some(notes) = update.admin_notes {
            booking.admin_notes = if notes.is_empty() { None } else { Some(notes) };
        }

        self.persist_details(&booking).await
    }

    pub async fn confirm_booking(&self, booking_id: &str) -> Result<Booking, AppError> {
        let booking = self.get_booking(booking_id).await?;
        let Some(to) = self.plan(&booking, BookingAction::Confirm)? else {
            return Ok(booking);
        };

        let pricing = booking.pricing();
        if pricing.paid_so_far() < pricing.deposit_required {
            return Err(AppError::PreconditionNotMet(format!(
                "deposit of {} required before confirmation, {} paid",
                pricing.deposit_required,
                pricing.paid_so_far()
            )));
        }

        self.apply(booking, BookingAction::Confirm, to, None).await
    }

    /// Customers may cancel their own pending booking; a confirmed booking needs
    /// `admin_override`, and staff cancellations must give a reason.
    pub async fn cancel_booking(&self, booking_id: &str, admin_override: bool, reason: Option<String>) -> Result<Booking, AppError> {
        let booking = self.get_booking(booking_id).await?;
        let Some(to) = self.plan(&booking, BookingAction::Cancel)? else {
            return Ok(booking);
        };

        if booking.status() == BookingStatus::Confirmed && !admin_override {
            return Err(AppError::PreconditionNotMet(
                "confirmed bookings can only be cancelled with an admin override".into(),
            ));
        }
        let reason = normalize(reason);
        if admin_override && reason.is_none() {
            return Err(AppError::Validation("A reason is required for staff cancellations".into()));
        }

        let cancelled = self.apply(booking, BookingAction::Cancel, to, reason).await?;
        self.refresh_stats(&cancelled.customer_id).await;
        Ok(cancelled)
    }

    pub async fn mark_completed(&self, booking_id: &str) -> Result<Booking, AppError> {
        let booking = self.get_booking(booking_id).await?;
        if booking.is_completed() {
            return Err(AppError::PreconditionNotMet("booking is already completed".into()));
        }
        let Some(to) = self.plan(&booking, BookingAction::Complete)? else {
            return Ok(booking);
        };

        let completed = self.apply(booking, BookingAction::Complete, to, None).await?;
        self.refresh_stats(&completed.customer_id).await;
        Ok(completed)
    }

    pub async fn mark_no_show(&self, booking_id: &str, reason: Option<String>) -> Result<Booking, AppError> {
        let booking = self.get_booking(booking_id).await?;
        let Some(to) = self.plan(&booking, BookingAction::NoShow)? else {
            return Ok(booking);
        };

        self.apply(booking, BookingAction::NoShow, to, normalize(reason)).await
    }

    /// Cancels the booking and frees its slots; the caller books the new time separately.
    pub async fn reschedule_booking(&self, booking_id: &str, reason: String) -> Result<Booking, AppError> {
        let Some(reason) = normalize(Some(reason)) else {
            return Err(AppError::Validation("A reason is required to reschedule".into()));
        };
        let booking = self.get_booking(booking_id).await?;
        let Some(to) = self.plan(&booking, BookingAction::Reschedule)? else {
            return Ok(booking);
        };

        let reason = format!("{}{}", RESCHEDULE_REASON_PREFIX, reason);
        let cancelled = self.apply(booking, BookingAction::Reschedule, to, Some(reason)).await?;
        self.refresh_stats(&cancelled.customer_id).await;
        Ok(cancelled)
    }

    /// `Ok(None)` when the booking is already where `action` would take it.
    fn plan(&self, booking: &Booking, action: BookingAction) -> Result<Option<BookingStatus>, AppError> {
        match booking.status().on(action) {
            Transition::Apply(to) => Ok(Some(to)),
            Transition::AlreadyThere => {
                info!(booking_id = %booking.id, status = booking.status().as_str(), ?action, "Booking already in target state");
                Ok(None)
            }
            Transition::Rejected(why) => Err(AppError::PreconditionNotMet(why.to_string())),
        }
    }

    async fn apply(&self, mut booking: Booking, action: BookingAction, to: BookingStatus, reason: Option<String>) -> Result<Booking, AppError> {
        let from = booking.status();
        booking.enter(to, reason, Utc::now());

        let updated = self.bookings.transition(&booking, from, action.slot_effect()).await?
            .ok_or_else(|| AppError::Conflict("Booking was modified concurrently; reload and retry".into()))?;

        info!(
            booking_id = %updated.id,
            from = from.as_str(),
            to = updated.status().as_str(),
            slot_effect = ?action.slot_effect(),
            "Booking transitioned"
        );
        Ok(updated)
    }

    async fn persist_details(&self, booking: &Booking) -> Result<Booking, AppError> {
        self.bookings.update_details(booking, booking.status()).await?
            .ok_or_else(|| AppError::Conflict("Booking was modified concurrently; reload and retry".into()))
    }

    async fn resolve_customer(&self, customer: &CustomerRef) -> Result<Customer, AppError> {
        match customer {
            CustomerRef::Existing(id) => self.customers.find_by_id(id).await?
                .ok_or_else(|| AppError::CustomerNotFound(id.clone())),
            CustomerRef::Details(details) => self.customers.find_or_create(details).await,
        }
    }

    async fn select_slots(&self, provider_id: &str, selection: &SlotSelection) -> Result<Vec<String>, AppError> {
        match selection {
            SlotSelection::Explicit(ids) => Ok(ids.clone()),
            SlotSelection::Consecutive { start_slot_id, required_slots } => {
                if *required_slots == 0 {
                    return Err(AppError::Validation("required_slots must be at least 1".into()));
                }
                let start = match self.ledger.find(start_slot_id).await {
                    Ok(slot) => slot,
                    Err(AppError::NotFound(_)) => return Err(ReservationError::SlotNotFound(start_slot_id.clone()).into()),
                    Err(e) => return Err(e),
                };
                if start.provider_id != provider_id {
                    return Err(ReservationError::ProviderMismatch {
                        slot_id: start.id,
                        provider_id: provider_id.to_string(),
                    }.into());
                }

                let run = if *required_slots > 1 {
                    let day = self.ledger.day_slots(provider_id, start.date).await?;
                    resolve(&start, *required_slots, &day, self.ledger.grid())?
                } else {
                    vec![start]
                };
                Ok(run.into_iter().map(|s| s.id).collect())
            }
        }
    }

    async fn compensate(&self, slot_ids: &[String]) {
        if let Err(e) = self.ledger.release(slot_ids).await {
            error!(slots = ?slot_ids, "Failed to release slots after aborted booking: {}", e);
        }
    }

    async fn refresh_stats(&self, customer_id: &str) {
        if let Err(e) = self.stats.recompute_customer_stats(customer_id).await {
            warn!(customer_id, "Customer stats recompute failed: {}", e);
        }
    }

    fn notify_created(&self, booking: &Booking, customer: Customer) {
        let notifier = self.notifier.clone();
        let ledger = self.ledger.clone();
        let booking = booking.clone();

        tokio::spawn(async move {
            let mut slots: Vec<Slot> = Vec::with_capacity(booking.slot_ids().len());
            for id in booking.slot_ids() {
                match ledger.find(id).await {
                    Ok(slot) => slots.push(slot),
                    Err(e) => warn!(slot_id = %id, "Slot lookup for notification failed: {}", e),
                }
            }
            notifier.booking_created(&booking, &customer, &slots).await;
        });
    }
}

fn validate_new_booking(cmd: &CreateBookingCommand) -> Result<(), AppError> {
    if cmd.provider_id.trim().is_empty() {
        return Err(AppError::Validation("provider_id is required".into()));
    }
    match &cmd.customer {
        CustomerRef::Existing(id) if id.trim().is_empty() => {
            return Err(AppError::Validation("customer_id is required".into()));
        }
        CustomerRef::Existing(_) => {}
        CustomerRef::Details(details) => details.validate()?,
    }
    validate_service(&cmd.service)?;
    validate_amounts(cmd.total, cmd.deposit_required, cmd.discount)
}

fn validate_service(service: &ServiceDetails) -> Result<(), AppError> {
    if service.service_type.trim().is_empty() || service.service_location.trim().is_empty() {
        return Err(AppError::Validation("Service type and location are required".into()));
    }
    Ok(())
}

fn validate_amounts(total: i64, deposit_required: i64, discount: i64) -> Result<(), AppError> {
    if total < 0 || deposit_required < 0 || discount < 0 {
        return Err(AppError::Validation("Amounts must not be negative".into()));
    }
    if total.checked_add(deposit_required).is_none() {
        return Err(AppError::Validation("Amounts are out of range".into()));
    }
    Ok(())
}

fn ensure_open(booking: &Booking) -> Result<(), AppError> {
    match booking.status() {
        BookingStatus::Cancelled | BookingStatus::NoShow => Err(AppError::PreconditionNotMet(
            format!("payments cannot be recorded on a {} booking", booking.status().as_str()),
        )),
        _ => Ok(()),
    }
}

fn normalize(reason: Option<String>) -> Option<String> {
    reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty())
}
