pub mod sqlite_slot_repo;
pub mod sqlite_booking_repo;
pub mod sqlite_counter_repo;
pub mod sqlite_customer_repo;

pub mod postgres_slot_repo;
pub mod postgres_booking_repo;
pub mod postgres_counter_repo;
pub mod postgres_customer_repo;
