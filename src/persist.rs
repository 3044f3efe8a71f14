//! Persisted packing plan, wire version `pp/1`.
//!
//! The engine does not persist anything itself; it defines the stable
//! shape the surrounding application stores and exchanges. Rounding is
//! applied here, at the boundary: positions and dimensions to 6 decimal
//! places, monetary values to 2, ratios to 4. Once rounded, serialization
//! round-trips byte-identically.

use serde::{Deserialize, Serialize};

use crate::error::{PackError, PackResult};
use crate::types::{PackingPlan, RouteDescriptor};

/// Wire version tag.
pub const PLAN_VERSION: &str = "pp/1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRoute {
    pub distance_km: f64,
    pub route_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedPlacement {
    pub item_id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub orientation: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedContainerMetrics {
    /// Volume utilization, 4 decimal places.
    pub vol_util: f64,
    /// Weight utilization, 4 decimal places.
    pub wt_util: f64,
    /// Minimum support ratio, 4 decimal places.
    pub stability: f64,
    /// Trip cost, 2 decimal places.
    pub cost: f64,
    pub objective: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedContainer {
    pub type_id: String,
    pub placements: Vec<PersistedPlacement>,
    pub unfitted: Vec<String>,
    pub metrics: PersistedContainerMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedGlobalMetrics {
    pub avg_vol_util: f64,
    pub total_cost: f64,
    pub truck_count: usize,
    pub objective: f64,
}

/// Root record of wire version `pp/1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedPlan {
    pub version: String,
    pub strategy: String,
    pub route: PersistedRoute,
    pub containers: Vec<PersistedContainer>,
    pub global_unfitted: Vec<String>,
    pub global_metrics: PersistedGlobalMetrics,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn round6(value: f64) -> f64 {
    round_to(value, 6)
}

fn round4(value: f64) -> f64 {
    round_to(value, 4)
}

fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

impl PersistedPlan {
    /// Snapshot a plan into the wire shape, applying boundary rounding.
    pub fn from_plan(plan: &PackingPlan) -> Self {
        Self {
            version: PLAN_VERSION.to_string(),
            strategy: plan.strategy.as_str().to_string(),
            route: persist_route(&plan.route),
            containers: plan
                .containers
                .iter()
                .map(|planned| PersistedContainer {
                    type_id: planned.container.id.clone(),
                    placements: planned
                        .packing
                        .placements
                        .iter()
                        .map(|p| PersistedPlacement {
                            item_id: p.item_id.clone(),
                            x: round6(p.x),
                            y: round6(p.y),
                            z: round6(p.z),
                            orientation: p.orientation,
                        })
                        .collect(),
                    unfitted: planned.packing.unfitted.clone(),
                    metrics: PersistedContainerMetrics {
                        vol_util: round4(planned.packing.volume_utilization),
                        wt_util: round4(planned.packing.weight_utilization),
                        stability: round4(planned.packing.stability),
                        cost: round2(planned.packing.estimated_cost),
                        objective: round2(planned.packing.objective),
                    },
                })
                .collect(),
            global_unfitted: plan.unfitted.clone(),
            global_metrics: PersistedGlobalMetrics {
                avg_vol_util: round4(plan.metrics.avg_volume_utilization),
                total_cost: round2(plan.metrics.total_cost),
                truck_count: plan.metrics.truck_count,
                objective: round2(plan.metrics.objective),
            },
        }
    }

    /// Serialize to the canonical JSON blob.
    pub fn to_json(&self) -> PackResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| PackError::internal(format!("failed to serialize plan: {e}")))
    }

    /// Parse a `pp/1` blob, rejecting unknown versions.
    pub fn from_json(bytes: &[u8]) -> PackResult<Self> {
        let plan: Self = serde_json::from_slice(bytes)
            .map_err(|e| PackError::invalid_input(format!("malformed persisted plan: {e}")))?;
        if plan.version != PLAN_VERSION {
            return Err(PackError::invalid_input(format!(
                "unsupported persisted plan version {:?} (expected {PLAN_VERSION:?})",
                plan.version
            )));
        }
        Ok(plan)
    }
}

fn persist_route(route: &RouteDescriptor) -> PersistedRoute {
    PersistedRoute {
        distance_km: round6(route.distance_km),
        route_type: route.route_type.as_str().to_string(),
        region: route.region.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ContainerPacking, ContainerSnapshot, PackStrategy, PlanMetrics, Placement,
        PlannedContainer, RouteType, TruckCategory,
    };

    fn make_plan() -> PackingPlan {
        let container = ContainerSnapshot {
            id: "T-MID".into(),
            name: "Tata 407".into(),
            length_cm: 430.0,
            width_cm: 200.0,
            height_cm: 190.0,
            max_payload_kg: 10_000.0,
            category: TruckCategory::Medium,
            cost_per_km: None,
            fuel_per_km: None,
            driver_cost_per_day: None,
            maintenance_per_km: None,
            age_factor: None,
            depreciation_per_km: None,
        };
        PackingPlan {
            strategy: PackStrategy::Balanced,
            route: RouteDescriptor {
                distance_km: 250.123456789,
                route_type: RouteType::Highway,
                region: Some("North".into()),
            },
            containers: vec![PlannedContainer {
                container,
                packing: ContainerPacking {
                    placements: vec![Placement {
                        item_index: 0,
                        item_id: "CRT-1".into(),
                        x: 0.000000123,
                        y: 0.0,
                        z: 10.5,
                        orientation: 3,
                        length: 100.0,
                        width: 80.0,
                        height: 80.0,
                    }],
                    fitted_count: 1,
                    unfitted: vec!["CRT-2".into()],
                    volume_utilization: 0.391_727_9,
                    weight_utilization: 0.003,
                    stability: 1.0,
                    total_weight_kg: 30.0,
                    estimated_cost: 10_736.987,
                    objective: -391.727_9,
                    errors: vec![],
                },
            }],
            unfitted: vec!["CRT-2".into()],
            metrics: PlanMetrics {
                total_cost: 10_736.987,
                avg_volume_utilization: 0.391_727_9,
                truck_count: 1,
                objective: 10_346.123_456,
            },
        }
    }

    #[test]
    fn rounding_applied_at_the_boundary() {
        let persisted = PersistedPlan::from_plan(&make_plan());
        assert_eq!(persisted.version, "pp/1");
        assert_eq!(persisted.strategy, "balanced");
        let c = &persisted.containers[0];
        assert!((c.metrics.vol_util - 0.3917).abs() < 1e-12);
        assert!((c.metrics.cost - 10_736.99).abs() < 1e-9);
        assert!((c.placements[0].x - 0.0).abs() < 1e-12);
        assert!((persisted.global_metrics.objective - 10_346.12).abs() < 1e-9);
    }

    #[test]
    fn round_trip_is_byte_identical() {
        let persisted = PersistedPlan::from_plan(&make_plan());
        let first = persisted.to_json().unwrap();
        let reparsed = PersistedPlan::from_json(&first).unwrap();
        let second = reparsed.to_json().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut persisted = PersistedPlan::from_plan(&make_plan());
        persisted.version = "pp/2".into();
        let bytes = persisted.to_json().unwrap();
        assert!(PersistedPlan::from_json(&bytes).is_err());
    }

    #[test]
    fn region_is_omitted_when_absent() {
        let mut plan = make_plan();
        plan.route.region = None;
        let bytes = PersistedPlan::from_plan(&plan).to_json().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains("region"));
    }
}
