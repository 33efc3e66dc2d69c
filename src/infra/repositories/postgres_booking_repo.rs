use crate::domain::{models::{booking::{Booking, BookingStatus}, slot::SlotEffect}, ports::BookingRepository};
use crate::error::AppError;
use crate::infra::repositories::postgres_slot_repo::{confirm_slots, release_slots};
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use chrono::{DateTime, Utc};

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        let service = booking.service();
        let pricing = booking.pricing();
        let payment = booking.payment();

        sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, booking_code, customer_id, provider_id, slot_ids, service_type, service_location, service_client_type,
                status, payment_status, total, deposit_required, discount, paid_amount, tip_amount, deposit_paid_at, fully_paid_at,
                payment_method, proof_url, confirmed_at, completed_at, status_reason, client_notes, admin_notes, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26)
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
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE booking_code = $1").bind(code).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE customer_id = $1 ORDER BY created_at ASC").bind(customer_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE provider_id = $1 ORDER BY created_at ASC").bind(provider_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_stale_pending(&self, created_before: DateTime<Utc>) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE status = 'pending' AND proof_url IS NULL AND created_at < $1 ORDER BY created_at ASC"
        )
            .bind(created_before)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_details(&self, booking: &Booking, expected: BookingStatus) -> Result<Option<Booking>, AppError> {
        let service = booking.service();
        let pricing = booking.pricing();
        let payment = booking.payment();

        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET service_type=$1, service_location=$2, service_client_type=$3, payment_status=$4,
                total=$5, deposit_required=$6, discount=$7, paid_amount=$8, tip_amount=$9, deposit_paid_at=$10, fully_paid_at=$11,
                payment_method=$12, proof_url=$13, client_notes=$14, admin_notes=$15, updated_at=$16, version=version+1
             WHERE id=$17 AND status=$18 AND version=$19
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
            "UPDATE bookings SET status=$1, status_reason=$2, confirmed_at=$3, completed_at=$4, updated_at=$5, version=version+1
             WHERE id=$6 AND status=$7 AND version=$8
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
