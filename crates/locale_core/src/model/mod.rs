//! Geography domain model.
//!
//! # Responsibility
//! - Define the `Country`/`Region` value objects persisted by storage.
//! - Define read-only composite projections over them.
//!
//! # Invariants
//! - Identity is the location code; there is no other key in the domain.
//! - A region belongs to the country given by its code prefix. The link is
//!   implicit and never enforced here.
//! - Values are immutable; updating means replacing the stored row.

pub mod composite;
pub mod country;
pub mod region;

use crate::code::LocationCode;

/// Anything addressable by a location code.
pub trait Location {
    fn location_code(&self) -> LocationCode;
    fn name(&self) -> Option<&str>;
}
