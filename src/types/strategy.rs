//! Packing strategy selection.

use serde::{Deserialize, Serialize};

/// Objective driving item ordering, candidate scoring, and ranking.
///
/// The strategy is threaded from the request through the allocator into the
/// scorer; no component may substitute a fixed strategy of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackStrategy {
    /// Maximize volume utilization of the chosen trucks.
    Space,
    /// Minimize total operational cost of the trip.
    Cost,
    /// Weighted blend of utilization and cost.
    Balanced,
    /// Minimize the number of trucks used, then cost.
    MinTrucks,
}

impl PackStrategy {
    /// Stable identifier used in fingerprints and persisted plans.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Space => "space",
            Self::Cost => "cost",
            Self::Balanced => "balanced",
            Self::MinTrucks => "min_trucks",
        }
    }
}

impl std::fmt::Display for PackStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
