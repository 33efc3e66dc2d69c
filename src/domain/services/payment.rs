use std::sync::Arc;

use tracing::debug;

use crate::domain::models::booking::{Booking, BookingStatus, PaymentStatus};
use crate::domain::models::customer::{ClientType, CustomerStats};
use crate::domain::ports::{BookingRepository, CustomerRepository};
use crate::error::AppError;

/// `paid` once everything owed (total plus deposit) is covered, `partial` for any
/// smaller positive amount. Reaching the deposit alone confirms a booking but
/// still reads as `partial`. Sums are widened so no amount combination overflows.
pub fn derive_payment_status(paid_amount: i64, tip_amount: i64, total: i64, deposit_required: i64) -> PaymentStatus {
    let paid_so_far = paid_amount as i128 + tip_amount as i128;
    if paid_so_far >= total as i128 + deposit_required as i128 {
        PaymentStatus::Paid
    } else if paid_so_far > 0 {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Unpaid
    }
}

/// Wholesale rollup of one customer's bookings.
pub fn aggregate_stats(bookings: &[Booking]) -> CustomerStats {
    let mut stats = CustomerStats {
        total_bookings: bookings.iter().filter(|b| b.status() != BookingStatus::Cancelled).count() as i64,
        ..CustomerStats::default()
    };

    for booking in bookings {
        let Some(completed_at) = booking.completed_at() else { continue };
        let pricing = booking.pricing();
        stats.completed_bookings += 1;
        stats.total_spent = stats.total_spent.saturating_add(pricing.paid_amount);
        stats.total_tips = stats.total_tips.saturating_add(pricing.tip_amount);
        stats.total_discounts = stats.total_discounts.saturating_add(pricing.discount);
        if stats.last_visit.is_none_or(|last| completed_at > last) {
            stats.last_visit = Some(completed_at);
        }
    }

    stats.client_type = if stats.total_bookings > 1 { ClientType::Repeat } else { ClientType::New };
    stats
}

pub struct StatsAggregator {
    bookings: Arc<dyn BookingRepository>,
    customers: Arc<dyn CustomerRepository>,
}

impl StatsAggregator {
    pub fn new(bookings: Arc<dyn BookingRepository>, customers: Arc<dyn CustomerRepository>) -> Self {
        Self { bookings, customers }
    }

    /// Idempotent; safe to call after any change that could affect completion.
    pub async fn recompute_customer_stats(&self, customer_id: &str) -> Result<CustomerStats, AppError> {
        let bookings = self.bookings.list_by_customer(customer_id).await?;
        let stats = aggregate_stats(&bookings);
        self.customers.update_stats(customer_id, &stats).await?;
        debug!(customer_id, completed = stats.completed_bookings, "Customer stats recomputed");
        Ok(stats)
    }
}
