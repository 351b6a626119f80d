//! Read-only projections combining a country with its regions.
//!
//! These are assembled from repository reads and never persisted.

use super::country::Country;
use super::region::Region;
use serde::{Deserialize, Serialize};

/// One country and zero or more of its regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryAndRegions {
    pub country: Country,
    #[serde(default)]
    pub regions: Vec<Region>,
}

/// One country and at most one of its regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryWithRegion {
    pub country: Country,
    #[serde(default)]
    pub region: Option<Region>,
}
