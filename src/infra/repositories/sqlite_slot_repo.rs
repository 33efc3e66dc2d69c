use crate::domain::{models::slot::{ReservationError, Slot}, ports::SlotRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};

pub struct SqliteSlotRepo {
    pool: SqlitePool,
}

impl SqliteSlotRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// pending/confirmed -> available for every id. Runs on the caller's connection so it
/// can share a transaction with a booking update.
pub(crate) async fn release_slots(conn: &mut SqliteConnection, slot_ids: &[String]) -> Result<(), AppError> {
    for id in slot_ids {
        sqlx::query("UPDATE slots SET status = 'available' WHERE id = ?")
            .bind(id)
            .execute(&mut *conn).await.map_err(AppError::Database)?;
    }
    Ok(())
}

/// pending -> confirmed. Returns `false` as soon as one slot is not pending; the
/// caller must roll back.
pub(crate) async fn confirm_slots(conn: &mut SqliteConnection, slot_ids: &[String]) -> Result<bool, AppError> {
    for id in slot_ids {
        let result = sqlx::query("UPDATE slots SET status = 'confirmed' WHERE id = ? AND status = 'pending'")
            .bind(id)
            .execute(&mut *conn).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }
    }
    Ok(true)
}

async fn diagnose(conn: &mut SqliteConnection, provider_id: &str, slot_id: &str) -> Result<ReservationError, AppError> {
    let slot = sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE id = ?")
        .bind(slot_id)
        .fetch_optional(&mut *conn).await.map_err(AppError::Database)?;

    Ok(match slot {
        None => ReservationError::SlotNotFound(slot_id.to_string()),
        Some(s) if s.provider_id != provider_id => ReservationError::ProviderMismatch {
            slot_id: s.id,
            provider_id: provider_id.to_string(),
        },
        Some(s) => ReservationError::SlotUnavailable { slot_id: s.id, status: s.status.as_str().to_string() },
    })
}

#[async_trait]
impl SlotRepository for SqliteSlotRepo {
    async fn create(&self, slot: &Slot) -> Result<Option<Slot>, AppError> {
        sqlx::query_as::<_, Slot>(
            "INSERT INTO slots (id, provider_id, date, time, status, slot_type, hidden, notes, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (provider_id, date, time) DO NOTHING
             RETURNING *"
        )
            .bind(&slot.id).bind(&slot.provider_id).bind(slot.date).bind(slot.time)
            .bind(slot.status.as_str()).bind(slot.slot_type.as_str()).bind(slot.hidden)
            .bind(&slot.notes).bind(slot.created_at)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Slot>, AppError> {
        sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_day(&self, provider_id: &str, date: NaiveDate) -> Result<Vec<Slot>, AppError> {
        sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE provider_id = ? AND date = ? ORDER BY time ASC")
            .bind(provider_id).bind(date)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_range(&self, provider_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Slot>, AppError> {
        sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE provider_id = ? AND date >= ? AND date <= ? ORDER BY date ASC, time ASC")
            .bind(provider_id).bind(start).bind(end)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn reserve(&self, provider_id: &str, slot_ids: &[String]) -> Result<(), AppError> {
        let mut ordered = slot_ids.to_vec();
        ordered.sort();

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        for id in &ordered {
            let result = sqlx::query("UPDATE slots SET status = 'pending' WHERE id = ? AND provider_id = ? AND status = 'available'")
                .bind(id).bind(provider_id)
                .execute(&mut *tx).await.map_err(AppError::Database)?;

            if result.rows_affected() == 0 {
                let reason = diagnose(&mut tx, provider_id, id).await?;
                tx.rollback().await.map_err(AppError::Database)?;
                return Err(reason.into());
            }
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn release(&self, slot_ids: &[String]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        release_slots(&mut tx, slot_ids).await?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn update_unreserved(&self, slot: &Slot) -> Result<Option<Slot>, AppError> {
        sqlx::query_as::<_, Slot>(
            "UPDATE slots SET status = ?, slot_type = ?, hidden = ?, notes = ?
             WHERE id = ? AND status IN ('available', 'blocked')
             RETURNING *"
        )
            .bind(slot.status.as_str()).bind(slot.slot_type.as_str()).bind(slot.hidden).bind(&slot.notes)
            .bind(&slot.id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete_unreserved(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM slots WHERE id = ? AND status IN ('available', 'blocked')")
            .bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_past_unreserved(&self, before: NaiveDate) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM slots WHERE date < ? AND status IN ('available', 'blocked')")
            .bind(before)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
