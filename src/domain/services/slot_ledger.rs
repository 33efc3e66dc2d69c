use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::models::slot::{NewSlotParams, Slot, SlotStatus, SlotType};
use crate::domain::models::time_grid::TimeGrid;
use crate::domain::ports::SlotRepository;
use crate::domain::services::slot_resolver::{day_has_room, eligible_starts};
use crate::error::AppError;

/// Longest date range a single availability query may span.
pub const MAX_RANGE_DAYS: i64 = 92;

pub struct CreateSlotsCommand {
    pub provider_id: String,
    pub dates: Vec<NaiveDate>,
    pub times: Vec<NaiveTime>,
    pub status: SlotStatus,
    pub slot_type: SlotType,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SkippedSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct SlotBatchOutcome {
    pub created: Vec<Slot>,
    pub skipped: Vec<SkippedSlot>,
}

#[derive(Debug, Default)]
pub struct SlotUpdate {
    pub slot_type: Option<SlotType>,
    pub notes: Option<String>,
    pub hidden: Option<bool>,
    pub status: Option<SlotStatus>,
}

/// Single source of truth for slot availability.
pub struct SlotLedger {
    repo: Arc<dyn SlotRepository>,
    grid: TimeGrid,
}

impl SlotLedger {
    pub fn new(repo: Arc<dyn SlotRepository>, grid: TimeGrid) -> Self {
        Self { repo, grid }
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub async fn find(&self, slot_id: &str) -> Result<Slot, AppError> {
        self.repo.find_by_id(slot_id).await?
            .ok_or_else(|| AppError::NotFound(format!("Slot {} not found", slot_id)))
    }

    pub async fn day_slots(&self, provider_id: &str, date: NaiveDate) -> Result<Vec<Slot>, AppError> {
        self.repo.list_by_day(provider_id, date).await
    }

    /// Creates one slot per date x time combination; existing or off-grid combinations are skipped and reported.
    pub async fn create_slots(&self, cmd: CreateSlotsCommand) -> Result<SlotBatchOutcome, AppError> {
        if cmd.provider_id.trim().is_empty() {
            return Err(AppError::Validation("provider_id is required".into()));
        }
        if cmd.dates.is_empty() || cmd.times.is_empty() {
            return Err(AppError::Validation("At least one date and one time are required".into()));
        }
        if cmd.status.is_reserved() {
            return Err(AppError::Validation("Slots can only be created as available or blocked".into()));
        }

        let mut outcome = SlotBatchOutcome { created: Vec::new(), skipped: Vec::new() };
        let mut seen = HashSet::new();

        for date in &cmd.dates {
            for time in &cmd.times {
                if !seen.insert((*date, *time)) {
                    continue;
                }
                if !self.grid.contains(*time) {
                    outcome.skipped.push(SkippedSlot { date: *date, time: *time, reason: "not on the time grid".into() });
                    continue;
                }

                let slot = Slot::new(NewSlotParams {
                    provider_id: cmd.provider_id.clone(),
                    date: *date,
                    time: *time,
                    status: cmd.status,
                    slot_type: cmd.slot_type,
                    notes: cmd.notes.clone(),
                });

                match self.repo.create(&slot).await? {
                    Some(created) => outcome.created.push(created),
                    None => outcome.skipped.push(SkippedSlot { date: *date, time: *time, reason: "slot already exists".into() }),
                }
            }
        }

        info!(
            provider_id = %cmd.provider_id,
            created = outcome.created.len(),
            skipped = outcome.skipped.len(),
            "Slot batch created"
        );
        Ok(outcome)
    }

    /// Moves every slot to pending, or none of them.
    pub async fn validate_and_reserve(&self, slot_ids: &[String], provider_id: &str) -> Result<(), AppError> {
        ensure_distinct(slot_ids)?;
        match self.repo.reserve(provider_id, slot_ids).await {
            Ok(()) => {
                info!(provider_id, slots = ?slot_ids, "Slots reserved");
                Ok(())
            }
            Err(e) => {
                warn!(provider_id, slots = ?slot_ids, "Slot reservation refused: {}", e);
                Err(e)
            }
        }
    }

    pub async fn release(&self, slot_ids: &[String]) -> Result<(), AppError> {
        self.repo.release(slot_ids).await?;
        info!(slots = ?slot_ids, "Slots released");
        Ok(())
    }

    /// Public availability: visible, available slots from which a `required_slots` service fits.
    pub async fn list_available(&self, provider_id: &str, start: NaiveDate, end: NaiveDate, required_slots: usize) -> Result<Vec<Slot>, AppError> {
        let by_day = self.slots_by_day(provider_id, start, end).await?;

        let mut available = Vec::new();
        for day_slots in by_day.values() {
            available.extend(
                eligible_starts(day_slots, required_slots.max(1), &self.grid)
                    .into_iter()
                    .filter(|s| !s.hidden)
                    .cloned(),
            );
        }
        Ok(available)
    }

    pub async fn eligible_dates(&self, provider_id: &str, start: NaiveDate, end: NaiveDate, required_slots: usize) -> Result<Vec<NaiveDate>, AppError> {
        let by_day = self.slots_by_day(provider_id, start, end).await?;
        Ok(by_day
            .into_iter()
            .filter(|(_, day_slots)| day_has_room(day_slots, required_slots.max(1), &self.grid))
            .map(|(date, _)| date)
            .collect())
    }

    /// Staff edit. Refused while the slot is held by an active booking; the check
    /// is repeated by the conditional write itself.
    pub async fn update_slot(&self, slot_id: &str, update: SlotUpdate) -> Result<Slot, AppError> {
        let mut slot = self.find(slot_id).await?;
        if slot.status.is_reserved() {
            return Err(AppError::Conflict("Slot is held by an active booking".into()));
        }
        if let Some(status) = update.status {
            if status.is_reserved() {
                return Err(AppError::Validation("Staff may only set a slot to available or blocked".into()));
            }
            slot.status = status;
        }
        if let Some(slot_type) = update.slot_type { slot.slot_type = slot_type; }
        if let Some(hidden) = update.hidden { slot.hidden = hidden; }
        if let Some(notes) = update.notes {
            slot.notes = if notes.is_empty() { None } else { Some(notes) };
        }

        let updated = self.repo.update_unreserved(&slot).await?
            .ok_or_else(|| AppError::Conflict("Slot was reserved while being edited".into()))?;
        info!(slot_id, status = updated.status.as_str(), "Slot updated");
        Ok(updated)
    }

    pub async fn delete_slot(&self, slot_id: &str) -> Result<(), AppError> {
        self.find(slot_id).await?;
        if !self.repo.delete_unreserved(slot_id).await? {
            return Err(AppError::Conflict("Slot is held by an active booking".into()));
        }
        info!(slot_id, "Slot deleted");
        Ok(())
    }

    pub async fn purge_before(&self, date: NaiveDate) -> Result<u64, AppError> {
        self.repo.delete_past_unreserved(date).await
    }

    async fn slots_by_day(&self, provider_id: &str, start: NaiveDate, end: NaiveDate) -> Result<BTreeMap<NaiveDate, Vec<Slot>>, AppError> {
        if end < start {
            return Err(AppError::Validation("Range end must not be before its start".into()));
        }
        if (end - start).num_days() > MAX_RANGE_DAYS {
            return Err(AppError::Validation(format!("Range may span at most {} days", MAX_RANGE_DAYS)));
        }

        let mut by_day: BTreeMap<NaiveDate, Vec<Slot>> = BTreeMap::new();
        for slot in self.repo.list_by_range(provider_id, start, end).await? {
            by_day.entry(slot.date).or_default().push(slot);
        }
        Ok(by_day)
    }
}

fn ensure_distinct(slot_ids: &[String]) -> Result<(), AppError> {
    if slot_ids.is_empty() {
        return Err(AppError::Validation("At least one slot is required".into()));
    }
    let unique: HashSet<&String> = slot_ids.iter().collect();
    if unique.len() != slot_ids.len() {
        return Err(AppError::Validation("Slot ids must be unique".into()));
    }
    Ok(())
}
