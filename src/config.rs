use std::env;

use chrono::NaiveTime;
use chrono_tz::Tz;

use crate::domain::models::time_grid::TimeGrid;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub mail_service_url: String,
    pub mail_service_token: String,
    /// Spreadsheet mirror endpoint; sync is disabled when unset.
    pub backup_sync_url: Option<String>,
    /// Timezone of the business; decides the date of booking codes and "today".
    pub timezone: Tz,
    pub booking_code_prefix: String,
    pub grid_opening: NaiveTime,
    pub grid_closing: NaiveTime,
    pub grid_interval_min: u32,
    pub pending_expiry_hours: i64,
    pub housekeeping_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let config = Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            backup_sync_url: env::var("BACKUP_SYNC_URL").ok().filter(|url| !url.is_empty()),
            timezone: env::var("BUSINESS_TIMEZONE").unwrap_or_else(|_| "UTC".to_string()).parse().expect("BUSINESS_TIMEZONE must be an IANA timezone"),
            booking_code_prefix: env::var("BOOKING_CODE_PREFIX").unwrap_or_else(|_| "BK".to_string()),
            grid_opening: parse_time(&env::var("GRID_OPENING").unwrap_or_else(|_| "09:00".to_string())).expect("GRID_OPENING must be HH:MM"),
            grid_closing: parse_time(&env::var("GRID_CLOSING").unwrap_or_else(|_| "18:00".to_string())).expect("GRID_CLOSING must be HH:MM"),
            grid_interval_min: env::var("GRID_INTERVAL_MIN").unwrap_or_else(|_| "30".to_string()).parse().expect("GRID_INTERVAL_MIN must be a number"),
            pending_expiry_hours: env::var("PENDING_EXPIRY_HOURS").unwrap_or_else(|_| "48".to_string()).parse().expect("PENDING_EXPIRY_HOURS must be a number"),
            housekeeping_interval_secs: env::var("HOUSEKEEPING_INTERVAL_SECS").unwrap_or_else(|_| "300".to_string()).parse().expect("HOUSEKEEPING_INTERVAL_SECS must be a number"),
        };
        if let Err(msg) = config.validate() {
            panic!("Invalid configuration: {}", msg);
        }
        config
    }

    /// Rejects settings that would leave the service unable to take bookings.
    pub fn validate(&self) -> Result<(), String> {
        if self.grid_interval_min == 0 {
            return Err("GRID_INTERVAL_MIN must be greater than zero".into());
        }
        if self.grid_closing <= self.grid_opening {
            return Err("GRID_CLOSING must be after GRID_OPENING".into());
        }
        if self.booking_code_prefix.trim().is_empty() {
            return Err("BOOKING_CODE_PREFIX must not be empty".into());
        }
        if self.pending_expiry_hours <= 0 || self.housekeeping_interval_secs == 0 {
            return Err("PENDING_EXPIRY_HOURS and HOUSEKEEPING_INTERVAL_SECS must be positive".into());
        }
        Ok(())
    }

    pub fn time_grid(&self) -> TimeGrid {
        TimeGrid::new(self.grid_opening, self.grid_closing, self.grid_interval_min)
    }
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(parse_time("9am"), None);
    }

    fn config(opening: &str, closing: &str, interval: u32) -> Config {
        Config {
            database_url: "sqlite::memory:".into(),
            port: 3000,
            mail_service_url: "http://localhost".into(),
            mail_service_token: "token".into(),
            backup_sync_url: None,
            timezone: chrono_tz::UTC,
            booking_code_prefix: "BK".into(),
            grid_opening: parse_time(opening).unwrap(),
            grid_closing: parse_time(closing).unwrap(),
            grid_interval_min: interval,
            pending_expiry_hours: 48,
            housekeeping_interval_secs: 300,
        }
    }

    #[test]
    fn test_validate_rejects_empty_grid() {
        assert!(config("09:00", "18:00", 30).validate().is_ok());
        assert!(config("09:00", "18:00", 0).validate().is_err());
        assert!(config("18:00", "09:00", 30).validate().is_err());
        assert!(config("09:00", "09:00", 30).validate().is_err());
    }
}
