use crate::domain::ports::BookingCounterRepository;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};

pub struct SqliteCounterRepo {
    pool: SqlitePool,
}

impl SqliteCounterRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingCounterRepository for SqliteCounterRepo {
    async fn next_sequence(&self, date_key: NaiveDate) -> Result<i64, AppError> {
        let row = sqlx::query(
            "INSERT INTO booking_counters (date_key, seq) VALUES (?, 1)
             ON CONFLICT (date_key) DO UPDATE SET seq = booking_counters.seq + 1
             RETURNING seq"
        )
            .bind(date_key)
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;
        Ok(row.get::<i64, _>("seq"))
    }
}
