use crate::domain::{models::{booking::{Booking, BookingStatus}, slot::SlotEffect}, ports::BookingRepository};
use crate::error::AppError;
use crate::infra::repositories::sqlite_slot_repo::{confirm_slots, release_slots};
use async_trait::async_trait;
use sqlx::{types::Json, SqlitePool};
use chrono::{DateTime, Utc};

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        let service = booking.service();
        let pricing = booking.pricing();
        let payment = booking.payment();

        sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, booking_code, customer_id, provider_id, slot_ids, service_type, service_location, service_client_type,
                status, payment_status, total, deposit_required, discount, paid_amount, tip_amount, deposit_paid_at, fully_paid_at,
                payment_method, proof_url, confirmed_at, completed_at, status_reason, client_notes, admin_notes, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.booking_code).bind(&booking.customer_id).bind(&booking.provider_id)
            .bind(Json(booking.slot_ids())).bind(&service.service_type).bind(&service.service_location)
            .bind(service.service_client_type.as_str()).bind(booking.status().as_str()).bind(booking.payment_status().as_str())
            .bind(pricing.total).bind(pricing.deposit_required).bind(pricing.discount).bind(pricing.paid_amount).bind(pricing.tip_amount)
            .bind(payment.deposit_paid_at).bind(payment.fully_paid_at).bind(&payment.payment_method).bind(&payment.proof_url)
            .bind(booking.confirmed_at()).bind(booking.completed_at()).bind(&booking.status_reason)
            .bind(&booking.client_notes).bind(&booking.admin_notes).bind(booking.created_at).bind(booking.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE booking_code = ?").bind(code).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE customer_id = ? ORDER BY created_at ASC").bind(customer_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE provider_id = ? ORDER BY created_at ASC").bind(provider_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_stale_pending(&self, created_before: DateTime<Utc>) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE status = 'pending' AND proof_url IS NULL AND created_at < ? ORDER BY created_at ASC"
        )
            .bind(created_before)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_details(&self, booking: &Booking, expected: BookingStatus) -> Result<Option<Booking>, AppError> {
        let service = booking.service();
        let pricing = booking.pricing();
        let payment = booking.payment();

        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET service_type=?, service_location=?, service_client_type=?, payment_status=?,
                total=?, deposit_required=?, discount=?, paid_amount=?, tip_amount=?, deposit_paid_at=?, fully_paid_at=?,
                payment_method=?, proof_url=?, client_notes=?, admin_notes=?, updated_at=?, version=version+1
             WHERE id=? AND status=? AND version=?
             RETURNING *"
        )
            .bind(&service.service_type).bind(&service.service_location).bind(service.service_client_type.as_str())
            .bind(booking.payment_status().as_str())
            .bind(pricing.total).bind(pricing.deposit_required).bind(pricing.discount).bind(pricing.paid_amount).bind(pricing.tip_amount)
            .bind(payment.deposit_paid_at).bind(payment.fully_paid_at).bind(&payment.payment_method).bind(&payment.proof_url)
            .bind(&booking.client_notes).bind(&booking.admin_notes).bind(booking.updated_at)
            .bind(&booking.id).bind(expected.as_str()).bind(booking.version())
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn transition(&self, booking: &Booking, expected: BookingStatus, effect: SlotEffect) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let updated = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status=?, status_reason=?, confirmed_at=?, completed_at=?, updated_at=?, version=version+1
             WHERE id=? AND status=? AND version=?
             RETURNING *"
        )
            .bind(booking.status().as_str()).bind(&booking.status_reason)
            .bind(booking.confirmed_at()).bind(booking.completed_at()).bind(booking.updated_at)
            .bind(&booking.id).bind(expected.as_str()).bind(booking.version())
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

        let Some(updated) = updated else {
            tx.rollback().await.map_err(AppError::Database)?;
            return Ok(None);
        };

        match effect {
            SlotEffect::None => {}
            SlotEffect::Release => release_slots(&mut tx, updated.slot_ids()).await?,
            SlotEffect::Confirm => {
                if !confirm_slots(&mut tx, updated.slot_ids()).await? {
                    tx.rollback().await.map_err(AppError::Database)?;
                    return Err(AppError::Conflict(format!("Slots of booking {} are no longer pending", updated.booking_code)));
                }
            }
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(updated))
    }
}
