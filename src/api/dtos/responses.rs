use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::models::slot::Slot;

#[derive(Serialize)]
pub struct AvailableSlotsResponse {
    pub provider_id: String,
    pub required_slots: usize,
    pub slots: Vec<Slot>,
}

#[derive(Serialize)]
pub struct EligibleDatesResponse {
    pub provider_id: String,
    pub dates: Vec<NaiveDate>,
}
