use chrono::{Duration, NaiveTime};
use serde::Serialize;

/// The provider-wide ordered sequence of bookable times of day.
///
/// Every slot's `time` is expected to be one of these points. Both the
/// consecutive-slot resolver and calendar eligibility step through the grid
/// with [`TimeGrid::successor`] so they share the same stepping semantics.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TimeGrid {
    points: Vec<NaiveTime>,
}

impl TimeGrid {
    /// Builds a grid from `opening` (inclusive) to `closing` (exclusive) in steps of `interval_min`.
    pub fn new(opening: NaiveTime, closing: NaiveTime, interval_min: u32) -> Self {
        let mut points = Vec::new();
        if interval_min > 0 {
            let step = Duration::minutes(interval_min as i64);
            let mut cursor = opening;
            while cursor < closing {
                points.push(cursor);
                let (next, wrapped) = cursor.overflowing_add_signed(step);
                if wrapped != 0 {
                    break;
                }
                cursor = next;
            }
        }
        Self { points }
    }

    pub fn points(&self) -> &[NaiveTime] {
        &self.points
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.points.binary_search(&time).is_ok()
    }

    /// The grid point immediately after `time`, or `None` at the end of the day.
    pub fn successor(&self, time: NaiveTime) -> Option<NaiveTime> {
        let idx = self.points.binary_search(&time).ok()?;
        self.points.get(idx + 1).copied()
    }
}
