//! First-fit-decreasing placement into one container.

use std::cmp::Ordering;

use tracing::{debug, trace};

use super::anchors::AnchorSet;
use super::{compaction, PackItem, PackerParams};
use crate::config::BalancedWeights;
use crate::geometry::{
    aabb_overlap, fits_inside, is_above_footprint, orientations, rests_on, support_ratio, Aabb,
};
use crate::recommend::scoring::{objective_value, ScoreInputs};
use crate::types::{ContainerPacking, ContainerSnapshot, PackStrategy, Placement};

/// A carton fixed inside the container, with the bookkeeping the
/// constraint chain needs.
#[derive(Debug, Clone)]
pub(crate) struct PlacedBox {
    pub arena_index: usize,
    pub item_id: String,
    pub aabb: Aabb,
    pub orientation: u8,
    pub weight: f64,
    /// Fragile or non-stackable: nothing may sit above its footprint.
    pub protected: bool,
    /// Cartons in the vertical chain up to and including this one.
    pub stack_depth: u32,
    /// Tightest `max_stack_height` along the chain (`None` = unlimited).
    pub chain_cap: Option<u32>,
    /// Supported footprint fraction at placement time (1.0 on the floor).
    pub support: f64,
}

/// Outcome of one single-container run.
#[derive(Debug, Clone)]
pub struct SingleRunOutcome {
    pub packing: ContainerPacking,
    /// Arena indices of placed cartons, in placement order.
    pub fitted_indices: Vec<usize>,
    /// Arena indices of unplaced cartons, in attempt order.
    pub unfitted_indices: Vec<usize>,
    /// True when the deadline cut the run short.
    pub truncated: bool,
}

/// Pack a slice of arena items into one container.
///
/// Never fails: infeasible cartons land on the unfitted list, invalid
/// inputs produce an empty result with `errors` populated. For a fixed
/// input the output is bit-identical across runs.
pub fn pack_single(
    container: &ContainerSnapshot,
    items: &[PackItem],
    strategy: PackStrategy,
    params: &PackerParams,
    weights: &BalancedWeights,
    estimated_cost: f64,
) -> SingleRunOutcome {
    let mut errors = Vec::new();
    if let Err(e) = container.validate() {
        errors.push(e.to_string());
    }
    for entry in items {
        if let Err(e) = entry.item.validate() {
            errors.push(e.to_string());
        }
    }
    if !errors.is_empty() {
        return SingleRunOutcome {
            packing: ContainerPacking {
                unfitted: items.iter().map(|i| i.item.id.clone()).collect(),
                stability: 1.0,
                errors,
                ..ContainerPacking::default()
            },
            fitted_indices: Vec::new(),
            unfitted_indices: items.iter().map(|i| i.arena_index).collect(),
            truncated: false,
        };
    }

    let eps = params.tolerance;
    let order = sort_order(items, strategy);

    let mut placed: Vec<PlacedBox> = Vec::new();
    let mut boxes: Vec<Aabb> = Vec::new();
    let mut anchor_set = AnchorSet::new(eps);
    let mut total_weight = 0.0_f64;
    let mut fitted_indices = Vec::new();
    let mut unfitted_indices = Vec::new();
    let mut truncated = false;

    for (pass, &pos) in order.iter().enumerate() {
        if params.deadline_expired() {
            truncated = true;
            unfitted_indices.extend(order[pass..].iter().map(|&p| items[p].arena_index));
            break;
        }
        let entry = &items[pos];
        let item = &entry.item;

        if total_weight + item.weight_kg > container.max_payload_kg + eps {
            unfitted_indices.push(entry.arena_index);
            continue;
        }

        match try_place(container, item, &placed, &boxes, &anchor_set, params) {
            Some(candidate) => {
                trace!(
                    item = %item.id,
                    x = candidate.aabb.x,
                    y = candidate.aabb.y,
                    z = candidate.aabb.z,
                    orientation = candidate.orientation,
                    "placed carton"
                );
                total_weight += candidate.weight;
                boxes.push(candidate.aabb);
                anchor_set.on_placement(
                    &candidate.aabb,
                    container.length_cm,
                    container.width_cm,
                    container.height_cm,
                    &boxes,
                );
                fitted_indices.push(entry.arena_index);
                let mut placed_box = candidate;
                placed_box.arena_index = entry.arena_index;
                placed_box.item_id = item.id.clone();
                placed.push(placed_box);
            }
            None => unfitted_indices.push(entry.arena_index),
        }
    }

    if params.compaction
        && matches!(strategy, PackStrategy::Space | PackStrategy::Balanced)
        && !placed.is_empty()
    {
        compaction::gravity_pass(&mut placed, eps, params.support_ratio_min);
        boxes.clear();
        boxes.extend(placed.iter().map(|p| p.aabb));
    }

    let outcome = finalize(
        container,
        items,
        placed,
        fitted_indices,
        unfitted_indices,
        total_weight,
        truncated,
        strategy,
        weights,
        estimated_cost,
    );
    debug!(
        container = %container.id,
        fitted = outcome.packing.fitted_count,
        unfitted = outcome.packing.unfitted.len(),
        vol_util = outcome.packing.volume_utilization,
        "single-container pack complete"
    );
    outcome
}

/// Strategy-keyed item ordering (first-fit *decreasing*).
fn sort_order(items: &[PackItem], strategy: PackStrategy) -> Vec<usize> {
    let n = items.len();
    let mut order: Vec<usize> = (0..n).collect();
    match strategy {
        PackStrategy::Space => {
            order.sort_by(|&a, &b| {
                desc(items[a].item.volume_cm3(), items[b].item.volume_cm3())
                    .then_with(|| {
                        desc(
                            items[a].item.max_dimension_cm(),
                            items[b].item.max_dimension_cm(),
                        )
                    })
                    .then_with(|| tie_chain(&items[a], &items[b]))
            });
        }
        PackStrategy::Cost => {
            // Volume × unit value density collapses to the carton's value;
            // volume breaks the tie for unvalued cartons.
            order.sort_by(|&a, &b| {
                desc(items[a].item.value, items[b].item.value)
                    .then_with(|| desc(items[a].item.volume_cm3(), items[b].item.volume_cm3()))
                    .then_with(|| tie_chain(&items[a], &items[b]))
            });
        }
        PackStrategy::MinTrucks => {
            order.sort_by(|&a, &b| {
                desc(items[a].item.volume_cm3(), items[b].item.volume_cm3())
                    .then_with(|| tie_chain(&items[a], &items[b]))
            });
        }
        PackStrategy::Balanced => {
            let scores = balanced_scores(items);
            order.sort_by(|&a, &b| {
                desc(scores[a], scores[b]).then_with(|| tie_chain(&items[a], &items[b]))
            });
        }
    }
    order
}

/// Blend of normalized volume and priority ranks (0.6 / 0.4).
fn balanced_scores(items: &[PackItem]) -> Vec<f64> {
    let n = items.len();
    let denom = (n.saturating_sub(1)).max(1) as f64;

    let mut by_volume: Vec<usize> = (0..n).collect();
    by_volume.sort_by(|&a, &b| {
        items[a]
            .item
            .volume_cm3()
            .partial_cmp(&items[b].item.volume_cm3())
            .unwrap_or(Ordering::Equal)
            .then_with(|| items[a].arena_index.cmp(&items[b].arena_index))
    });
    let mut by_priority: Vec<usize> = (0..n).collect();
    by_priority.sort_by(|&a, &b| {
        items[a]
            .item
            .priority
            .cmp(&items[b].item.priority)
            .then_with(|| items[a].arena_index.cmp(&items[b].arena_index))
    });

    let mut scores = vec![0.0; n];
    for (rank, &i) in by_volume.iter().enumerate() {
        scores[i] += 0.6 * rank as f64 / denom;
    }
    for (rank, &i) in by_priority.iter().enumerate() {
        scores[i] += 0.4 * rank as f64 / denom;
    }
    scores
}

/// Shared tie-breaks: priority desc, non-fragile first, mass desc, then
/// arena index for stability.
fn tie_chain(a: &PackItem, b: &PackItem) -> Ordering {
    b.item
        .priority
        .cmp(&a.item.priority)
        .then_with(|| a.item.fragile.cmp(&b.item.fragile))
        .then_with(|| desc(a.item.weight_kg, b.item.weight_kg))
        .then_with(|| a.arena_index.cmp(&b.arena_index))
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// First (orientation, anchor) pair satisfying the whole constraint chain.
fn try_place(
    container: &ContainerSnapshot,
    item: &crate::types::ItemSnapshot,
    placed: &[PlacedBox],
    boxes: &[Aabb],
    anchor_set: &AnchorSet,
    params: &PackerParams,
) -> Option<PlacedBox> {
    let eps = params.tolerance;
    let candidate_protected = item.fragile || !item.stackable;

    for (orientation, dims) in orientations(item) {
        for (x, y, z) in anchor_set.iter() {
            let aabb = Aabb::new(x, y, z, dims);

            if !fits_inside(
                container.length_cm,
                container.width_cm,
                container.height_cm,
                &aabb,
                eps,
            ) {
                continue;
            }
            if boxes.iter().any(|b| aabb_overlap(&aabb, b, eps)) {
                continue;
            }

            let on_floor = y <= eps;
            let support = if on_floor {
                1.0
            } else {
                support_ratio(&aabb, boxes, eps)
            };
            if !on_floor && support + eps < params.support_ratio_min {
                continue;
            }

            let fragility_violation = placed.iter().any(|p| {
                (p.protected && is_above_footprint(&aabb, &p.aabb, eps))
                    || (candidate_protected && is_above_footprint(&p.aabb, &aabb, eps))
            });
            if fragility_violation {
                continue;
            }

            let (stack_depth, chain_cap) = if on_floor {
                (1, item.stack_cap())
            } else {
                let mut depth = 1;
                let mut cap = item.stack_cap();
                for p in placed.iter().filter(|p| rests_on(&aabb, &p.aabb, eps)) {
                    depth = depth.max(p.stack_depth + 1);
                    cap = tighter_cap(cap, p.chain_cap);
                }
                (depth, cap)
            };
            if chain_cap.is_some_and(|cap| stack_depth > cap) {
                continue;
            }

            return Some(PlacedBox {
                arena_index: 0, // caller fills in
                item_id: String::new(),
                aabb,
                orientation,
                weight: item.weight_kg,
                protected: candidate_protected,
                stack_depth,
                chain_cap,
                support,
            });
        }
    }
    None
}

/// Tightest of two optional stack caps.
pub(crate) fn tighter_cap(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

#[allow(clippy::too_many_arguments)]
fn finalize(
    container: &ContainerSnapshot,
    items: &[PackItem],
    placed: Vec<PlacedBox>,
    fitted_indices: Vec<usize>,
    unfitted_indices: Vec<usize>,
    total_weight: f64,
    truncated: bool,
    strategy: PackStrategy,
    weights: &BalancedWeights,
    estimated_cost: f64,
) -> SingleRunOutcome {
    let fitted_volume: f64 = placed.iter().map(|p| p.aabb.footprint_area() * p.aabb.height).sum();
    let volume_utilization = (fitted_volume / container.volume_cm3()).clamp(0.0, 1.0);
    let weight_utilization = (total_weight / container.max_payload_kg).clamp(0.0, 1.0);
    let stability = placed
        .iter()
        .map(|p| p.support)
        .fold(1.0_f64, f64::min)
        .clamp(0.0, 1.0);

    let objective = objective_value(
        strategy,
        weights,
        &ScoreInputs {
            utilization: volume_utilization,
            cost: estimated_cost,
            truck_count: 1,
            unfitted: 0,
        },
    );

    let placements: Vec<Placement> = placed
        .iter()
        .map(|p| Placement {
            item_index: p.arena_index,
            item_id: p.item_id.clone(),
            x: p.aabb.x,
            y: p.aabb.y,
            z: p.aabb.z,
            orientation: p.orientation,
            length: p.aabb.length,
            width: p.aabb.width,
            height: p.aabb.height,
        })
        .collect();

    let index_to_id = |arena_index: usize| {
        items
            .iter()
            .find(|i| i.arena_index == arena_index)
            .map_or_else(String::new, |i| i.item.id.clone())
    };
    let unfitted: Vec<String> = unfitted_indices.iter().map(|&i| index_to_id(i)).collect();

    SingleRunOutcome {
        packing: ContainerPacking {
            fitted_count: placements.len(),
            placements,
            unfitted,
            volume_utilization,
            weight_utilization,
            stability,
            total_weight_kg: total_weight,
            estimated_cost,
            objective,
            errors: Vec::new(),
        },
        fitted_indices,
        unfitted_indices,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::build_arena;
    use crate::types::{ItemSnapshot, TruckCategory};
    use std::time::{Duration, Instant};

    fn make_container(l: f64, w: f64, h: f64, payload: f64) -> ContainerSnapshot {
        ContainerSnapshot {
            id: "T-TEST".into(),
            name: "Test Truck".into(),
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

    fn params() -> PackerParams {
        PackerParams {
            tolerance: 1e-6,
            support_ratio_min: 0.80,
            compaction: true,
            deadline: None,
        }
    }

    fn run(
        container: &ContainerSnapshot,
        items: &[(ItemSnapshot, u32)],
        strategy: PackStrategy,
    ) -> SingleRunOutcome {
        let arena = build_arena(items);
        pack_single(
            container,
            &arena,
            strategy,
            &params(),
            &BalancedWeights::default(),
            0.0,
        )
    }

    #[test]
    fn fragile_cartons_stay_on_the_floor() {
        let container = make_container(300.0, 200.0, 200.0, 10_000.0);
        let mut fragile = make_item("FRG", 100.0, 100.0, 100.0, 100.0);
        fragile.fragile = true;
        fragile.can_rotate = false;

        let outcome = run(&container, &[(fragile, 2)], PackStrategy::Space);
        assert_eq!(outcome.packing.fitted_count, 2);
        for p in &outcome.packing.placements {
            assert!(p.y.abs() < 1e-6, "fragile carton must rest on the floor");
        }
        assert!((outcome.packing.volume_utilization - 2_000_000.0 / 12_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn stacking_allowed_on_sturdy_base() {
        // Column container: the second carton can only go on top.
        let container = make_container(100.0, 100.0, 300.0, 10_000.0);
        let mut item = make_item("BOX", 100.0, 100.0, 100.0, 50.0);
        item.can_rotate = false;

        let outcome = run(&container, &[(item, 2)], PackStrategy::Space);
        assert_eq!(outcome.packing.fitted_count, 2);
        let ys: Vec<f64> = outcome.packing.placements.iter().map(|p| p.y).collect();
        assert!(ys.contains(&0.0));
        assert!(ys.iter().any(|&y| (y - 100.0).abs() < 1e-6));
    }

    #[test]
    fn nothing_rests_on_non_stackable() {
        let container = make_container(100.0, 100.0, 300.0, 10_000.0);
        let mut base = make_item("BASE", 100.0, 100.0, 100.0, 50.0);
        base.stackable = false;
        base.can_rotate = false;
        let mut top = make_item("TOP", 100.0, 100.0, 100.0, 10.0);
        top.can_rotate = false;

        let outcome = run(&container, &[(base, 1), (top, 1)], PackStrategy::Space);
        assert_eq!(outcome.packing.fitted_count, 1);
        assert_eq!(outcome.packing.unfitted, vec!["TOP".to_string()]);
    }

    #[test]
    fn insufficient_support_goes_unfitted() {
        // A fills x 0..100 of a 150-long floor; B (150 long) can neither
        // sit beside A nor get 80% support on top of it.
        let container = make_container(150.0, 200.0, 300.0, 10_000.0);
        let mut a = make_item("A", 100.0, 200.0, 100.0, 50.0);
        a.can_rotate = false;
        let mut b = make_item("B", 150.0, 200.0, 50.0, 10.0);
        b.can_rotate = false;

        let outcome = run(&container, &[(a, 1), (b, 1)], PackStrategy::Space);
        assert_eq!(outcome.packing.fitted_count, 1);
        assert_eq!(outcome.packing.unfitted, vec!["B".to_string()]);
    }

    #[test]
    fn rotation_disallowed_keeps_orientation_zero() {
        let mut item = make_item("RIGID", 80.0, 60.0, 40.0, 5.0);
        item.can_rotate = false;
        // Only a rotated orientation would fit this container.
        let container = make_container(60.0, 80.0, 40.0, 1_000.0);
        let outcome = run(&container, &[(item.clone(), 1)], PackStrategy::Space);
        assert_eq!(outcome.packing.fitted_count, 0);

        item.can_rotate = true;
        let outcome = run(&container, &[(item, 1)], PackStrategy::Space);
        assert_eq!(outcome.packing.fitted_count, 1);
        assert_ne!(outcome.packing.placements[0].orientation, 0);
    }

    #[test]
    fn payload_limit_is_enforced() {
        let container = make_container(300.0, 200.0, 200.0, 1_000.0);
        let item = make_item("HVY", 50.0, 50.0, 50.0, 600.0);
        let outcome = run(&container, &[(item, 2)], PackStrategy::Space);
        assert_eq!(outcome.packing.fitted_count, 1);
        assert_eq!(outcome.packing.unfitted.len(), 1);
        assert!(outcome.packing.total_weight_kg <= 1_000.0);
    }

    #[test]
    fn stack_height_cap_limits_column() {
        let container = make_container(100.0, 100.0, 400.0, 10_000.0);
        let mut item = make_item("CAP2", 100.0, 100.0, 100.0, 10.0);
        item.can_rotate = false;
        item.max_stack_height = Some(2);

        let outcome = run(&container, &[(item, 3)], PackStrategy::Space);
        assert_eq!(outcome.packing.fitted_count, 2);
        assert_eq!(outcome.packing.unfitted.len(), 1);
    }

    #[test]
    fn invalid_container_yields_structured_errors() {
        let container = make_container(0.0, 200.0, 200.0, 1_000.0);
        let item = make_item("X", 10.0, 10.0, 10.0, 1.0);
        let outcome = run(&container, &[(item, 1)], PackStrategy::Space);
        assert!(outcome.packing.placements.is_empty());
        assert!(!outcome.packing.errors.is_empty());
        assert_eq!(outcome.packing.unfitted.len(), 1);
    }

    #[test]
    fn expired_deadline_returns_best_so_far() {
        let container = make_container(300.0, 200.0, 200.0, 10_000.0);
        let item = make_item("X", 10.0, 10.0, 10.0, 1.0);
        let arena = build_arena(&[(item, 50)]);
        let expired = PackerParams {
            deadline: Some(Instant::now() - Duration::from_millis(1)),
            ..params()
        };
        let outcome = pack_single(
            &container,
            &arena,
            PackStrategy::Space,
            &expired,
            &BalancedWeights::default(),
            0.0,
        );
        assert!(outcome.truncated);
        assert_eq!(outcome.packing.fitted_count, 0);
        assert_eq!(outcome.unfitted_indices.len(), 50);
    }

    #[test]
    fn identical_inputs_produce_identical_placements() {
        let container = make_container(220.0, 150.0, 120.0, 750.0);
        let items = vec![
            (make_item("A", 80.0, 60.0, 40.0, 30.0), 5),
            (make_item("B", 50.0, 40.0, 30.0, 10.0), 5),
        ];
        let first = run(&container, &items, PackStrategy::Balanced);
        let second = run(&container, &items, PackStrategy::Balanced);
        assert_eq!(first.packing, second.packing);
    }

    #[test]
    fn priority_breaks_volume_ties() {
        let container = make_container(100.0, 100.0, 100.0, 1_000.0);
        let mut urgent = make_item("URGENT", 100.0, 100.0, 100.0, 10.0);
        urgent.priority = 5;
        urgent.can_rotate = false;
        let mut routine = make_item("ROUTINE", 100.0, 100.0, 100.0, 10.0);
        routine.can_rotate = false;

        // Only one fits; the higher-priority carton must win the slot.
        let outcome = run(&container, &[(routine, 1), (urgent, 1)], PackStrategy::Space);
        assert_eq!(outcome.packing.fitted_count, 1);
        assert_eq!(outcome.packing.placements[0].item_id, "URGENT");
    }

    #[test]
    fn ten_cartons_fill_small_truck() {
        // Smoke: 10 × (80,60,40) cartons in a 220×150×120 truck.
        let container = make_container(220.0, 150.0, 120.0, 750.0);
        let item = make_item("CRT", 80.0, 60.0, 40.0, 30.0);
        let outcome = run(&container, &[(item, 10)], PackStrategy::Space);
        assert_eq!(outcome.packing.fitted_count, 10);
        assert!(outcome.packing.unfitted.is_empty());
    }
}
