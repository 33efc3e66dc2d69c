use std::collections::HashMap;

use chrono::NaiveTime;
use thiserror::Error;

use crate::domain::models::slot::{Slot, SlotStatus};
use crate::domain::models::time_grid::TimeGrid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("not enough time left after {after} to fit {required} slots")]
    InsufficientGrid { after: NaiveTime, required: usize },
    #[error("slot at {at} is {status} and breaks the sequence")]
    GapInSequence { at: NaiveTime, status: String },
    #[error("start time {time} is not on the time grid")]
    NotOnGrid { time: NaiveTime },
}

/// Finds the ordered run of slots a `required`-slot service starting at `start` consumes.
///
/// Walks the grid forward from `start.time`. A grid point with no slot record is
/// skipped; a record that is not `available` ends the search with `GapInSequence`.
/// Only records of the same provider and date as `start` are considered.
pub fn resolve(start: &Slot, required: usize, day_slots: &[Slot], grid: &TimeGrid) -> Result<Vec<Slot>, ResolveError> {
    if required <= 1 {
        return Ok(vec![start.clone()]);
    }
    if !grid.contains(start.time) {
        return Err(ResolveError::NotOnGrid { time: start.time });
    }

    let by_time: HashMap<NaiveTime, &Slot> = day_slots
        .iter()
        .filter(|s| s.provider_id == start.provider_id && s.date == start.date)
        .map(|s| (s.time, s))
        .collect();

    let mut run = Vec::with_capacity(required);
    run.push(start.clone());
    let mut cursor = start.time;

    while run.len() < required {
        let Some(next) = grid.successor(cursor) else {
            return Err(ResolveError::InsufficientGrid { after: cursor, required });
        };
        cursor = next;

        match by_time.get(&next) {
            Some(slot) if slot.status == SlotStatus::Available => run.push((*slot).clone()),
            Some(slot) => {
                return Err(ResolveError::GapInSequence {
                    at: next,
                    status: slot.status.as_str().to_string(),
                });
            }
            None => continue,
        }
    }

    Ok(run)
}

/// Available slots of one provider-day from which a `required`-slot service fits.
pub fn eligible_starts<'a>(day_slots: &'a [Slot], required: usize, grid: &TimeGrid) -> Vec<&'a Slot> {
    day_slots
        .iter()
        .filter(|s| s.status == SlotStatus::Available)
        .filter(|s| resolve(s, required, day_slots, grid).is_ok())
        .collect()
}

pub fn day_has_room(day_slots: &[Slot], required: usize, grid: &TimeGrid) -> bool {
    day_slots
        .iter()
        .filter(|s| s.status == SlotStatus::Available && !s.hidden)
        .any(|s| resolve(s, required, day_slots, grid).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::slot::{NewSlotParams, SlotType};
    use chrono::NaiveDate;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn grid() -> TimeGrid {
        TimeGrid::new(t(9, 0), t(12, 0), 30)
    }

    fn slot(time: NaiveTime, status: SlotStatus) -> Slot {
        Slot::new(NewSlotParams {
            provider_id: "p1".into(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            time,
            status,
            slot_type: SlotType::Regular,
            notes: None,
        })
    }

    #[test]
    fn test_single_slot_is_trivial() {
        let start = slot(t(11, 30), SlotStatus::Available);
        let run = resolve(&start, 1, &[start.clone()], &grid()).unwrap();
        assert_eq!(run.len(), 1);
        assert_eq!(run[0].id, start.id);
    }

    #[test]
    fn test_missing_record_is_skipped() {
        let nine = slot(t(9, 0), SlotStatus::Available);
        let ten = slot(t(10, 0), SlotStatus::Available);
        let day = vec![nine.clone(), ten.clone()];

        let run = resolve(&nine, 2, &day, &grid()).unwrap();
        let times: Vec<_> = run.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![t(9, 0), t(10, 0)]);
    }

    #[test]
    fn test_occupied_slot_is_a_gap() {
        let nine = slot(t(9, 0), SlotStatus::Available);
        let half = slot(t(9, 30), SlotStatus::Confirmed);
        let ten = slot(t(10, 0), SlotStatus::Available);
        let day = vec![nine.clone(), half, ten];

        let err = resolve(&nine, 2, &day, &grid()).unwrap_err();
        assert_eq!(err, ResolveError::GapInSequence { at: t(9, 30), status: "confirmed".into() });
    }

    #[test]
    fn test_blocked_slot_is_a_gap() {
        let nine = slot(t(9, 0), SlotStatus::Available);
        let half = slot(t(9, 30), SlotStatus::Blocked);
        let err = resolve(&nine, 2, &[nine.clone(), half], &grid()).unwrap_err();
        assert!(matches!(err, ResolveError::GapInSequence { .. }));
    }

    #[test]
    fn test_end_of_grid_is_insufficient() {
        let last = slot(t(11, 30), SlotStatus::Available);
        let err = resolve(&last, 2, &[last.clone()], &grid()).unwrap_err();
        assert_eq!(err, ResolveError::InsufficientGrid { after: t(11, 30), required: 2 });

        let eleven = slot(t(11, 0), SlotStatus::Available);
        let err = resolve(&eleven, 2, &[eleven.clone()], &grid()).unwrap_err();
        assert!(matches!(err, ResolveError::InsufficientGrid { .. }), "no record left before closing");
    }

    #[test]
    fn test_off_grid_start_is_rejected() {
        let odd = slot(t(9, 15), SlotStatus::Available);
        let err = resolve(&odd, 2, &[odd.clone()], &grid()).unwrap_err();
        assert_eq!(err, ResolveError::NotOnGrid { time: t(9, 15) });
    }

    #[test]
    fn test_other_dates_are_ignored() {
        let nine = slot(t(9, 0), SlotStatus::Available);
        let mut other_day = slot(t(9, 30), SlotStatus::Confirmed);
        other_day.date = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let ten = slot(t(10, 0), SlotStatus::Available);

        let run = resolve(&nine, 2, &[nine.clone(), other_day, ten], &grid()).unwrap();
        assert_eq!(run[1].time, t(10, 0));
    }

    #[test]
    fn test_eligibility_scans_every_available_start() {
        let day = vec![
            slot(t(9, 0), SlotStatus::Available),
            slot(t(9, 30), SlotStatus::Pending),
            slot(t(10, 0), SlotStatus::Available),
            slot(t(10, 30), SlotStatus::Available),
        ];
        let starts: Vec<_> = eligible_starts(&day, 2, &grid()).iter().map(|s| s.time).collect();
        assert_eq!(starts, vec![t(10, 0)]);
        assert!(day_has_room(&day, 2, &grid()));
        assert!(!day_has_room(&day, 3, &grid()));
    }
}
