use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{Calendar, Component, Event as IcalEvent, EventLike};

use crate::domain::models::{booking::Booking, slot::Slot};

/// Start and end of the appointment covered by `slots`, in UTC.
pub fn booking_window(slots: &[Slot], interval_min: u32, tz: Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = slots.iter().min_by_key(|s| (s.date, s.time))?;
    let last = slots.iter().max_by_key(|s| (s.date, s.time))?;

    let start = tz.from_local_datetime(&first.date.and_time(first.time)).single()?;
    let last_start = tz.from_local_datetime(&last.date.and_time(last.time)).single()?;
    let end = last_start + Duration::minutes(interval_min as i64);

    Some((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}

/// Generates an iCalendar (.ics) string for a booking
pub fn generate_ics(booking: &Booking, slots: &[Slot], interval_min: u32, tz: Tz) -> Option<String> {
    let (start, end) = booking_window(slots, interval_min, tz)?;
    let service = booking.service();

    let mut calendar = Calendar::new();
    let ical_event = IcalEvent::new()
        .summary(&format!("{} ({})", service.service_type, booking.booking_code))
        .location(&service.service_location)
        .starts(start)
        .ends(end)
        .uid(&booking.id)
        .done();

    calendar.push(ical_event);
    Some(calendar.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::slot::{NewSlotParams, SlotStatus, SlotType};
    use chrono::{NaiveDate, NaiveTime};

    fn slot(h: u32, m: u32) -> Slot {
        Slot::new(NewSlotParams {
            provider_id: "p1".into(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            time: NaiveTime::from_hms_opt(h, m, 0).unwrap(),
            status: SlotStatus::Pending,
            slot_type: SlotType::Regular,
            notes: None,
        })
    }

    #[test]
    fn test_window_spans_first_to_last_slot() {
        let slots = vec![slot(10, 0), slot(9, 0)];
        let (start, end) = booking_window(&slots, 30, chrono_tz::UTC).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 6, 1, 10, 30, 0).unwrap());
        assert!(booking_window(&[], 30, chrono_tz::UTC).is_none());
    }
}
