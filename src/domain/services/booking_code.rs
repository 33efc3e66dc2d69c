use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::domain::ports::BookingCounterRepository;
use crate::error::AppError;

/// Issues `PREFIX-YYYYMMDDNNN` codes from a per-business-day counter.
/// Codes are never reused, even when their booking is later cancelled.
pub struct BookingCodeGenerator {
    counters: Arc<dyn BookingCounterRepository>,
    prefix: String,
    timezone: Tz,
}

impl BookingCodeGenerator {
    pub fn new(counters: Arc<dyn BookingCounterRepository>, prefix: String, timezone: Tz) -> Self {
        Self { counters, prefix, timezone }
    }

    /// The calendar date of `at` in the business timezone.
    pub fn business_date_key(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.timezone).date_naive()
    }

    pub async fn next(&self, date_key: NaiveDate) -> Result<String, AppError> {
        let seq = self.counters.next_sequence(date_key).await?;
        Ok(format_code(&self.prefix, date_key, seq))
    }

    pub async fn next_for_now(&self) -> Result<String, AppError> {
        self.next(self.business_date_key(Utc::now())).await
    }
}

pub fn format_code(prefix: &str, date_key: NaiveDate, seq: i64) -> String {
    format!("{}-{}{:03}", prefix, date_key.format("%Y%m%d"), seq)
}

/// Inverse of [`format_code`]: the sequence number of a code issued with `prefix`.
pub fn parse_sequence(prefix: &str, code: &str) -> Option<i64> {
    let rest = code.strip_prefix(prefix)?.strip_prefix('-')?;
    if rest.len() < 9 {
        return None;
    }
    rest.get(8..)?.parse().ok()
}
