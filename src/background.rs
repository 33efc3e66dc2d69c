use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{error, info, info_span, Instrument};
use crate::error::AppError;
use crate::state::AppState;

pub const EXPIRY_REASON: &str = "Expired: no payment proof received";

/// Periodic cleanup: expires stale pending bookings and purges slots from past days.
pub async fn start_housekeeping_worker(state: Arc<AppState>) {
    info!("Starting housekeeping worker...");
    let interval = Duration::from_secs(state.config.housekeeping_interval_secs.max(1));

    loop {
        let span = info_span!("housekeeping", run_id = %uuid::Uuid::new_v4());
        async {
            match expire_stale_bookings(&state).await {
                Ok(0) => {}
                Ok(n) => info!(expired = n, "Stale pending bookings cancelled"),
                Err(e) => error!("Failed to expire stale bookings: {:?}", e),
            }
            match purge_past_slots(&state).await {
                Ok(0) => {}
                Ok(n) => info!(purged = n, "Past slots purged"),
                Err(e) => error!("Failed to purge past slots: {:?}", e),
            }
        }
            .instrument(span)
            .await;

        sleep(interval).await;
    }
}

/// Cancels pending bookings older than the expiry window that never received a
/// payment proof. Their slots are released by the cancellation itself.
pub async fn expire_stale_bookings(state: &AppState) -> Result<usize, AppError> {
    let cutoff = Utc::now() - chrono::Duration::hours(state.config.pending_expiry_hours);
    let stale = state.booking_service.stale_pending(cutoff).await?;

    let mut expired = 0;
    for booking in stale {
        match state.booking_service.cancel_booking(&booking.id, false, Some(EXPIRY_REASON.to_string())).await {
            Ok(_) => expired += 1,
            // Confirmed or paid in the meantime.
            Err(AppError::PreconditionNotMet(_)) | Err(AppError::Conflict(_)) => {}
            Err(e) => error!(booking_id = %booking.id, "Failed to expire booking: {}", e),
        }
    }
    Ok(expired)
}

/// Deletes unreserved slots dated before today in the business timezone.
pub async fn purge_past_slots(state: &AppState) -> Result<u64, AppError> {
    let today = Utc::now().with_timezone(&state.config.timezone).date_naive();
    state.slot_ledger.purge_before(today).await
}
