//! Packing results: placements, per-container results, multi-container plans.

use serde::{Deserialize, Serialize};

use super::catalog::ContainerSnapshot;
use super::route::RouteDescriptor;
use super::strategy::PackStrategy;

/// One carton placed inside one container.
///
/// `(x, y, z)` is the carton's min-corner relative to the container
/// min-corner; x spans the container length, y the height (up), z the
/// width. `length`/`width`/`height` are the oriented extents along x/z/y.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Index into the request's expanded item arena.
    pub item_index: usize,
    /// Catalog id of the carton type.
    pub item_id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Orientation index, 0..=5; 0 is the original orientation.
    pub orientation: u8,
    /// Oriented extent along x.
    pub length: f64,
    /// Oriented extent along z.
    pub width: f64,
    /// Oriented extent along y.
    pub height: f64,
}

impl Placement {
    /// Top face height.
    pub fn y_max(&self) -> f64 {
        self.y + self.height
    }

    /// Oriented volume of the placed carton.
    pub fn volume_cm3(&self) -> f64 {
        self.length * self.width * self.height
    }
}

/// Result of packing one container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContainerPacking {
    pub placements: Vec<Placement>,
    /// Number of cartons placed.
    pub fitted_count: usize,
    /// Catalog ids of cartons that did not fit, in attempt order.
    pub unfitted: Vec<String>,
    /// Σ placed volume / container volume, in [0, 1].
    pub volume_utilization: f64,
    /// Σ placed weight / payload, in [0, 1].
    pub weight_utilization: f64,
    /// Minimum support ratio across placements; floor placements count 1.0.
    pub stability: f64,
    /// Total placed weight in kilograms.
    pub total_weight_kg: f64,
    /// Trip cost of this container under the request route.
    pub estimated_cost: f64,
    /// Objective value under the request strategy.
    pub objective: f64,
    /// Structured problems with the input (empty for valid inputs).
    pub errors: Vec<String>,
}

/// One container instance used by a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedContainer {
    pub container: ContainerSnapshot,
    pub packing: ContainerPacking,
}

/// Plan-level aggregate metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlanMetrics {
    pub total_cost: f64,
    /// Mean volume utilization over used containers.
    pub avg_volume_utilization: f64,
    /// Containers with at least one placed carton.
    pub truck_count: usize,
    /// Objective value under the request strategy.
    pub objective: f64,
}

/// A packing plan across one or more containers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackingPlan {
    pub strategy: PackStrategy,
    pub route: RouteDescriptor,
    /// Used containers in packing order.
    pub containers: Vec<PlannedContainer>,
    /// Catalog ids of cartons no container could take.
    pub unfitted: Vec<String>,
    pub metrics: PlanMetrics,
}

impl PackingPlan {
    /// Total cartons placed across all containers.
    pub fn fitted_count(&self) -> usize {
        self.containers.iter().map(|c| c.packing.fitted_count).sum()
    }

    /// True when every requested carton was placed.
    pub fn fits_all(&self) -> bool {
        self.unfitted.is_empty()
    }

    /// Container type ids with instance counts, sorted by id — the
    /// "combination" identity used for ranking tie-breaks.
    pub fn combination(&self) -> Vec<(String, u32)> {
        let mut counts: Vec<(String, u32)> = Vec::new();
        for planned in &self.containers {
            match counts.iter_mut().find(|(id, _)| *id == planned.container.id) {
                Some((_, n)) => *n += 1,
                None => counts.push((planned.container.id.clone(), 1)),
            }
        }
        counts.sort_by(|a, b| a.0.cmp(&b.0));
        counts
    }
}
