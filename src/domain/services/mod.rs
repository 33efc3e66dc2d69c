pub mod booking_code;
pub mod booking_lifecycle;
pub mod calendar;
pub mod notification;
pub mod payment;
pub mod slot_ledger;
pub mod slot_resolver;
