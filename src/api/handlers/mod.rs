pub mod booking;
pub mod customer;
pub mod health;
pub mod slot;
