//! Multi-container allocation.
//!
//! Packs the residual carton pool sequentially into the supplied container
//! instances. Containers that take nothing are skipped and never counted.
//! For the MinTrucks strategy the supply is re-sorted largest-first; every
//! other strategy preserves caller order so cost-based preselection from
//! the recommendation layer stays in charge.

use std::cmp::Ordering;

use tracing::debug;

use crate::config::BalancedWeights;
use crate::cost::{trip_cost, CostTables};
use crate::error::PackResult;
use crate::packer::{pack_single, PackItem, PackerParams};
use crate::recommend::scoring::{objective_value, ScoreInputs};
use crate::types::{
    ContainerSlot, PackStrategy, PackingPlan, PlanMetrics, PlannedContainer, RouteDescriptor,
};

/// An allocation run's plan plus its deadline status.
#[derive(Debug, Clone)]
pub struct AllocationOutcome {
    pub plan: PackingPlan,
    /// True when the deadline cut the run short.
    pub truncated: bool,
}

/// Distribute the arena across the supplied container instances.
///
/// Deterministic: identical inputs produce identical plans. The only error
/// path is an invalid route handed to the cost model; infeasible cartons
/// end up on the plan's `unfitted` list.
pub fn allocate(
    slots: &[ContainerSlot],
    arena: &[PackItem],
    strategy: PackStrategy,
    route: &RouteDescriptor,
    params: &PackerParams,
    weights: &BalancedWeights,
    tables: &CostTables,
) -> PackResult<AllocationOutcome> {
    let mut supply: Vec<ContainerSlot> = slots.to_vec();
    if strategy == PackStrategy::MinTrucks {
        supply.sort_by(|a, b| {
            b.container
                .volume_cm3()
                .partial_cmp(&a.container.volume_cm3())
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    b.container
                        .max_payload_kg
                        .partial_cmp(&a.container.max_payload_kg)
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.container.id.cmp(&b.container.id))
        });
    }

    let mut residual: Vec<PackItem> = arena.to_vec();
    let mut containers: Vec<PlannedContainer> = Vec::new();
    let mut truncated = false;

    'supply: for slot in &supply {
        let mut used: u32 = 0;
        loop {
            if residual.is_empty() {
                break 'supply;
            }
            if params.deadline_expired() {
                truncated = true;
                break 'supply;
            }
            if slot.count.is_some_and(|cap| used >= cap) {
                break;
            }

            let cost = trip_cost(tables, &slot.container, route)?.total;
            let outcome = pack_single(&slot.container, &residual, strategy, params, weights, cost);
            if outcome.truncated {
                truncated = true;
            }
            if outcome.fitted_indices.is_empty() {
                // Nothing fits this container type; move on.
                break;
            }

            residual.retain(|entry| !outcome.fitted_indices.contains(&entry.arena_index));
            containers.push(PlannedContainer {
                container: slot.container.clone(),
                packing: outcome.packing,
            });
            used += 1;

            if truncated {
                break 'supply;
            }
        }
    }

    let unfitted: Vec<String> = residual.iter().map(|e| e.item.id.clone()).collect();
    let truck_count = containers.len();
    let total_cost: f64 = containers.iter().map(|c| c.packing.estimated_cost).sum();
    let avg_volume_utilization = if truck_count == 0 {
        0.0
    } else {
        containers
            .iter()
            .map(|c| c.packing.volume_utilization)
            .sum::<f64>()
            / truck_count as f64
    };
    let objective = objective_value(
        strategy,
        weights,
        &ScoreInputs {
            utilization: avg_volume_utilization,
            cost: total_cost,
            truck_count,
            unfitted: unfitted.len(),
        },
    );

    debug!(
        strategy = %strategy,
        trucks = truck_count,
        unfitted = unfitted.len(),
        total_cost,
        "allocation complete"
    );

    Ok(AllocationOutcome {
        plan: PackingPlan {
            strategy,
            route: route.clone(),
            containers,
            unfitted,
            metrics: PlanMetrics {
                total_cost,
                avg_volume_utilization,
                truck_count,
                objective,
            },
        },
        truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::packer::build_arena;
    use crate::types::{ContainerSnapshot, ItemSnapshot, PackOptions, RouteType, TruckCategory};

    fn make_container(id: &str, l: f64, w: f64, h: f64, payload: f64) -> ContainerSnapshot {
        ContainerSnapshot {
            id: id.into(),
            name: id.into(),
            length_cm: l,
            width_cm: w,
            height_cm: h,
            max_payload_kg: payload,
            category: TruckCategory::Medium,
            cost_per_km: None,
            fuel_per_km: None,
            driver_cost_per_day: None,
            maintenance_per_km: None,
            age_factor: None,
            depreciation_per_km: None,
        }
    }

    fn make_item(id: &str, l: f64, w: f64, h: f64, weight: f64) -> ItemSnapshot {
        ItemSnapshot {
            id: id.into(),
            name: id.into(),
            length_cm: l,
            width_cm: w,
            height_cm: h,
            weight_kg: weight,
            can_rotate: true,
            fragile: false,
            stackable: true,
            max_stack_height: None,
            priority: 0,
            value: 0.0,
        }
    }

    fn run(
        slots: &[ContainerSlot],
        items: &[(ItemSnapshot, u32)],
        strategy: PackStrategy,
    ) -> AllocationOutcome {
        let config = EngineConfig::default();
        let params = PackerParams::resolve(&config, &PackOptions::default(), None);
        let arena = build_arena(items);
        allocate(
            slots,
            &arena,
            strategy,
            &RouteDescriptor::new(100.0, RouteType::Highway),
            &params,
            &config.weights,
            &config.cost_tables,
        )
        .unwrap()
    }

    #[test]
    fn overflow_spills_into_second_container() {
        // Each truck column holds exactly two cartons.
        let truck = make_container("T-COL", 100.0, 100.0, 200.0, 10_000.0);
        let mut item = make_item("BOX", 100.0, 100.0, 100.0, 10.0);
        item.can_rotate = false;
        let outcome = run(
            &[ContainerSlot::bounded(truck, 2)],
            &[(item, 3)],
            PackStrategy::Space,
        );
        assert_eq!(outcome.plan.metrics.truck_count, 2);
        assert_eq!(outcome.plan.fitted_count(), 3);
        assert!(outcome.plan.unfitted.is_empty());
    }

    #[test]
    fn exhausted_supply_leaves_global_unfitted() {
        let truck = make_container("T-COL", 100.0, 100.0, 100.0, 10_000.0);
        let mut item = make_item("BOX", 100.0, 100.0, 100.0, 10.0);
        item.can_rotate = false;
        let outcome = run(
            &[ContainerSlot::bounded(truck, 1)],
            &[(item, 3)],
            PackStrategy::Space,
        );
        assert_eq!(outcome.plan.metrics.truck_count, 1);
        assert_eq!(outcome.plan.unfitted.len(), 2);
    }

    #[test]
    fn unbounded_slot_computes_requirements() {
        let truck = make_container("T-COL", 100.0, 100.0, 100.0, 10_000.0);
        let mut item = make_item("BOX", 100.0, 100.0, 100.0, 10.0);
        item.can_rotate = false;
        let outcome = run(
            &[ContainerSlot::unbounded(truck)],
            &[(item, 5)],
            PackStrategy::Space,
        );
        assert_eq!(outcome.plan.metrics.truck_count, 5);
        assert!(outcome.plan.unfitted.is_empty());
    }

    #[test]
    fn useless_container_is_skipped_not_counted() {
        // The tiny truck cannot take the carton at all.
        let tiny = make_container("T-TINY", 10.0, 10.0, 10.0, 10_000.0);
        let big = make_container("T-BIG", 200.0, 200.0, 200.0, 10_000.0);
        let item = make_item("BOX", 100.0, 100.0, 100.0, 10.0);
        let outcome = run(
            &[
                ContainerSlot::bounded(tiny, 5),
                ContainerSlot::bounded(big, 1),
            ],
            &[(item, 1)],
            PackStrategy::Space,
        );
        assert_eq!(outcome.plan.metrics.truck_count, 1);
        assert_eq!(outcome.plan.containers[0].container.id, "T-BIG");
    }

    #[test]
    fn min_trucks_reorders_supply_largest_first() {
        let small = make_container("T-SMALL", 100.0, 100.0, 100.0, 10_000.0);
        let big = make_container("T-BIG", 300.0, 200.0, 200.0, 10_000.0);
        let item = make_item("BOX", 100.0, 100.0, 100.0, 10.0);
        // Caller lists the small truck first; MinTrucks must still start
        // with the big one and fit everything into it.
        let outcome = run(
            &[
                ContainerSlot::bounded(small, 10),
                ContainerSlot::bounded(big, 1),
            ],
            &[(item, 6)],
            PackStrategy::MinTrucks,
        );
        assert_eq!(outcome.plan.metrics.truck_count, 1);
        assert_eq!(outcome.plan.containers[0].container.id, "T-BIG");
    }

    #[test]
    fn caller_order_preserved_for_cost_strategy() {
        let small = make_container("T-SMALL", 100.0, 100.0, 100.0, 10_000.0);
        let big = make_container("T-BIG", 300.0, 200.0, 200.0, 10_000.0);
        let item = make_item("BOX", 100.0, 100.0, 100.0, 10.0);
        let outcome = run(
            &[
                ContainerSlot::bounded(small, 1),
                ContainerSlot::bounded(big, 1),
            ],
            &[(item, 1)],
            PackStrategy::Cost,
        );
        assert_eq!(outcome.plan.containers[0].container.id, "T-SMALL");
    }

    #[test]
    fn plan_total_cost_sums_used_containers() {
        let truck = make_container("T-COL", 100.0, 100.0, 200.0, 10_000.0);
        let mut item = make_item("BOX", 100.0, 100.0, 100.0, 10.0);
        item.can_rotate = false;
        let outcome = run(
            &[ContainerSlot::bounded(truck, 2)],
            &[(item, 4)],
            PackStrategy::Space,
        );
        let per_container: f64 = outcome
            .plan
            .containers
            .iter()
            .map(|c| c.packing.estimated_cost)
            .sum();
        assert!((outcome.plan.metrics.total_cost - per_container).abs() < 1e-9);
        assert!(outcome.plan.metrics.total_cost > 0.0);
    }
}
