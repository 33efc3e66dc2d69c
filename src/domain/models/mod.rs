pub mod booking;
pub mod customer;
pub mod slot;
pub mod time_grid;

use thiserror::Error;

/// A stored enum column held a value this build does not know.
#[derive(Error, Debug)]
#[error("Unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: String) -> Self {
        Self { kind, value }
    }
}
