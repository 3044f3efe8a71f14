//! Gravity compaction post-pass.
//!
//! One pass over the placements in ascending (y, x, z) order, sliding each
//! box down to the lowest plane where every invariant still holds. A box
//! that anything rests on is never moved, so the pass cannot strand a
//! placement it already visited — feasibility never decreases.

use std::cmp::Ordering;

use super::single::{tighter_cap, PlacedBox};
use crate::geometry::{aabb_overlap, is_above_footprint, rests_on, support_ratio, Aabb};

pub(crate) fn gravity_pass(placed: &mut [PlacedBox], eps: f64, sigma_min: f64) {
    let mut order: Vec<usize> = (0..placed.len()).collect();
    order.sort_by(|&a, &b| compare_positions(&placed[a].aabb, &placed[b].aabb));

    for &i in &order {
        if placed[i].aabb.y <= eps {
            continue;
        }
        // Never slide a box out from under another.
        let carries_load = placed
            .iter()
            .enumerate()
            .any(|(j, p)| j != i && rests_on(&p.aabb, &placed[i].aabb, eps));
        if carries_load {
            continue;
        }

        let mut levels: Vec<f64> = placed
            .iter()
            .enumerate()
            .filter(|(j, p)| *j != i && p.aabb.y_max() < placed[i].aabb.y - eps)
            .map(|(_, p)| p.aabb.y_max())
            .collect();
        levels.push(0.0);
        levels.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        levels.dedup_by(|a, b| (*a - *b).abs() <= eps);

        for level in levels {
            let candidate = Aabb {
                y: level,
                ..placed[i].aabb
            };
            if let Some(update) = admissible_at(&candidate, i, placed, eps, sigma_min) {
                placed[i].aabb = candidate;
                placed[i].support = update.support;
                placed[i].stack_depth = update.stack_depth;
                placed[i].chain_cap = update.chain_cap;
                break;
            }
        }
    }
}

struct LevelUpdate {
    support: f64,
    stack_depth: u32,
    chain_cap: Option<u32>,
}

/// Re-validate the full constraint chain for `candidate` replacing box `i`.
fn admissible_at(
    candidate: &Aabb,
    i: usize,
    placed: &[PlacedBox],
    eps: f64,
    sigma_min: f64,
) -> Option<LevelUpdate> {
    let others = || placed.iter().enumerate().filter(move |(j, _)| *j != i);

    if others().any(|(_, p)| aabb_overlap(candidate, &p.aabb, eps)) {
        return None;
    }

    let on_floor = candidate.y <= eps;
    let support = if on_floor {
        1.0
    } else {
        let boxes: Vec<Aabb> = others().map(|(_, p)| p.aabb).collect();
        support_ratio(candidate, &boxes, eps)
    };
    if !on_floor && support + eps < sigma_min {
        return None;
    }

    let this = &placed[i];
    let fragility_violation = others().any(|(_, p)| {
        (p.protected && is_above_footprint(candidate, &p.aabb, eps))
            || (this.protected && is_above_footprint(&p.aabb, candidate, eps))
    });
    if fragility_violation {
        return None;
    }

    // chain_cap already folds the old supporters' caps in; it is never
    // looser than the box's own cap, so reusing it stays conservative.
    let own_cap = this.chain_cap;
    let (stack_depth, chain_cap) = if on_floor {
        (1, own_cap)
    } else {
        let mut depth = 1;
        let mut cap = own_cap;
        for (_, p) in others().filter(|(_, p)| rests_on(candidate, &p.aabb, eps)) {
            depth = depth.max(p.stack_depth + 1);
            cap = tighter_cap(cap, p.chain_cap);
        }
        (depth, cap)
    };
    if chain_cap.is_some_and(|cap| stack_depth > cap) {
        return None;
    }

    Some(LevelUpdate {
        support,
        stack_depth,
        chain_cap,
    })
}

fn compare_positions(a: &Aabb, b: &Aabb) -> Ordering {
    a.y.partial_cmp(&b.y)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
        .then_with(|| a.z.partial_cmp(&b.z).unwrap_or(Ordering::Equal))
}
