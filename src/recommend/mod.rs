//! Truck recommendation: candidate enumeration, scoring, ranking.
//!
//! Enumeration is deliberately bounded to stay tractable on wide catalogs:
//! single-truck candidates first (a full fit in the smallest single truck
//! is the "perfect fit"), then up to `max_combos` pair combinations chosen
//! by best volume fit, then a greedy extension that keeps adding the truck
//! type that shrinks the residual volume the most, up to the combination
//! size cap. Candidate evaluations run in parallel chunks capped at the
//! configured fan-out, with cooperative deadline checks between chunks.

pub mod scoring;

use std::cmp::Ordering;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::allocator::{allocate, AllocationOutcome};
use crate::config::BalancedWeights;
use crate::cost::CostTables;
use crate::error::PackResult;
use crate::packer::{PackItem, PackerParams};
use crate::types::{ContainerSlot, DiagnosticCode, PackStrategy, PackingPlan, RouteDescriptor};

use scoring::{rank_key, ScoreInputs};

/// One evaluated container combination.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    /// Container type ids with instance counts actually used, sorted by id.
    pub combination: Vec<(String, u32)>,
    pub plan: PackingPlan,
    /// Lower-is-better ranking scalar (strategy objective + bonuses).
    pub rank_score: f64,
    /// Human-readable reason for the surrounding UI.
    pub reason: String,
    /// This is the smallest single truck fitting every carton.
    pub perfect_fit: bool,
}

/// Ranked output of the recommendation layer.
#[derive(Debug, Clone)]
pub struct Recommendation {
    /// Candidates best-first, already truncated to the alternatives limit.
    pub candidates: Vec<RankedCandidate>,
    pub diagnostics: Vec<DiagnosticCode>,
    /// True when the deadline truncated enumeration or packing.
    pub partial: bool,
}

impl Recommendation {
    /// The top-ranked plan, if any candidate placed at least one carton.
    pub fn best(&self) -> Option<&RankedCandidate> {
        self.candidates.first()
    }
}

/// Everything a recommendation run needs, resolved by the engine.
pub struct RecommendContext<'a> {
    pub slots: &'a [ContainerSlot],
    pub arena: &'a [PackItem],
    pub strategy: PackStrategy,
    pub route: &'a RouteDescriptor,
    pub params: PackerParams,
    pub weights: BalancedWeights,
    pub tables: &'a CostTables,
    /// Pair combination cap.
    pub max_combos: usize,
    /// Greedy extension cap on combination size.
    pub combination_size_cap: usize,
    /// Candidates kept after ranking (recommendation + alternatives).
    pub alternatives_limit: usize,
    /// Parallel evaluations per chunk.
    pub fan_out: usize,
}

/// A combination under evaluation: (slot index, instance count) pairs.
type Combo = Vec<(usize, u32)>;

/// Enumerate, evaluate and rank candidate container combinations.
pub fn recommend(ctx: &RecommendContext<'_>) -> PackResult<Recommendation> {
    let items_volume: f64 = ctx.arena.iter().map(|e| e.item.volume_cm3()).sum();
    let mut partial = false;
    let mut evaluated: Vec<(Combo, AllocationOutcome)> = Vec::new();

    // Phase 1: single-truck candidates.
    let singles: Vec<Combo> = (0..ctx.slots.len())
        .filter(|&i| slot_available(ctx.slots, i, 1))
        .map(|i| vec![(i, 1)])
        .collect();
    let (mut results, truncated) = evaluate_batch(ctx, &singles)?;
    partial |= truncated;
    evaluated.append(&mut results);

    let perfect_combo: Option<Combo> = evaluated
        .iter()
        .filter(|(combo, outcome)| combo.len() == 1 && outcome.plan.fits_all())
        .min_by(|(a, _), (b, _)| {
            let va = ctx.slots[a[0].0].container.volume_cm3();
            let vb = ctx.slots[b[0].0].container.volume_cm3();
            va.partial_cmp(&vb)
                .unwrap_or(Ordering::Equal)
                .then_with(|| ctx.slots[a[0].0].container.id.cmp(&ctx.slots[b[0].0].container.id))
        })
        .map(|(combo, _)| combo.clone());

    // Phase 2: pair combinations. A perfect fit settles the Space
    // objective outright; cost-led strategies still probe pairs because a
    // cheap pair can undercut a single big truck.
    let pairs_worthwhile = perfect_combo.is_none() || ctx.strategy != PackStrategy::Space;
    if pairs_worthwhile && !partial {
        let pairs = enumerate_pairs(ctx, items_volume);
        let (mut results, truncated) = evaluate_batch(ctx, &pairs)?;
        partial |= truncated;
        evaluated.append(&mut results);
    }

    // Phase 3: greedy extension towards larger combinations.
    let have_full_fit = evaluated.iter().any(|(_, o)| o.plan.fits_all());
    if !have_full_fit && !partial {
        partial |= extend_greedily(ctx, &mut evaluated)?;
    }

    let recommendation = rank(ctx, evaluated, perfect_combo.as_ref(), partial);
    if let Some(best) = recommendation.best() {
        info!(
            strategy = %ctx.strategy,
            trucks = best.plan.metrics.truck_count,
            avg_util = best.plan.metrics.avg_volume_utilization,
            cost = best.plan.metrics.total_cost,
            unfitted = best.plan.unfitted.len(),
            partial = recommendation.partial,
            "recommendation ready"
        );
    } else {
        debug!(strategy = %ctx.strategy, "no feasible candidate");
    }
    Ok(recommendation)
}

fn slot_available(slots: &[ContainerSlot], index: usize, needed: u32) -> bool {
    slots[index].count.map_or(true, |c| c >= needed)
}

/// Instantiate a combo as allocator supply, biggest container first so the
/// sequential pass fills large volumes before toppers.
fn combo_slots(ctx: &RecommendContext<'_>, combo: &Combo) -> Vec<ContainerSlot> {
    let mut slots: Vec<ContainerSlot> = combo
        .iter()
        .map(|&(index, count)| ContainerSlot::bounded(ctx.slots[index].container.clone(), count))
        .collect();
    slots.sort_by(|a, b| {
        b.container
            .volume_cm3()
            .partial_cmp(&a.container.volume_cm3())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.container.id.cmp(&b.container.id))
    });
    slots
}

fn evaluate_one(ctx: &RecommendContext<'_>, combo: &Combo) -> PackResult<AllocationOutcome> {
    let slots = combo_slots(ctx, combo);
    allocate(
        &slots,
        ctx.arena,
        ctx.strategy,
        ctx.route,
        &ctx.params,
        &ctx.weights,
        ctx.tables,
    )
}

/// Evaluate combos in parallel chunks of `fan_out`, checking the deadline
/// between chunks. Returns the outcomes plus a truncation flag.
fn evaluate_batch(
    ctx: &RecommendContext<'_>,
    combos: &[Combo],
) -> PackResult<(Vec<(Combo, AllocationOutcome)>, bool)> {
    let mut out = Vec::with_capacity(combos.len());
    let mut truncated = false;
    for chunk in combos.chunks(ctx.fan_out.max(1)) {
        if ctx.params.deadline_expired() {
            truncated = true;
            break;
        }
        let results: PackResult<Vec<(Combo, AllocationOutcome)>> = chunk
            .par_iter()
            .map(|combo| evaluate_one(ctx, combo).map(|o| (combo.clone(), o)))
            .collect();
        for (combo, outcome) in results? {
            truncated |= outcome.truncated;
            out.push((combo, outcome));
        }
    }
    Ok((out, truncated))
}

/// Pair combinations (with repetition) ordered by best volume fit:
/// combinations covering the demand come first, closest total volume wins,
/// capped at `max_combos`.
fn enumerate_pairs(ctx: &RecommendContext<'_>, items_volume: f64) -> Vec<Combo> {
    let n = ctx.slots.len();
    let mut scored: Vec<(bool, f64, Combo)> = Vec::new();
    for i in 0..n {
        for j in i..n {
            let needed = if i == j { 2 } else { 1 };
            if !slot_available(ctx.slots, i, needed) || !slot_available(ctx.slots, j, needed) {
                continue;
            }
            let combined = ctx.slots[i].container.volume_cm3() + ctx.slots[j].container.volume_cm3();
            let combo: Combo = if i == j {
                vec![(i, 2)]
            } else {
                vec![(i, 1), (j, 1)]
            };
            scored.push((combined >= items_volume, (combined - items_volume).abs(), combo));
        }
    }
    scored.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
            .then_with(|| combo_ids(ctx, &a.2).cmp(&combo_ids(ctx, &b.2)))
    });
    scored
        .into_iter()
        .take(ctx.max_combos)
        .map(|(_, _, combo)| combo)
        .collect()
}

fn combo_ids(ctx: &RecommendContext<'_>, combo: &Combo) -> Vec<(String, u32)> {
    let mut ids: Vec<(String, u32)> = combo
        .iter()
        .map(|&(index, count)| (ctx.slots[index].container.id.clone(), count))
        .collect();
    ids.sort();
    ids
}

fn combo_size(combo: &Combo) -> u32 {
    combo.iter().map(|&(_, c)| c).sum()
}

fn residual_volume(ctx: &RecommendContext<'_>, outcome: &AllocationOutcome) -> f64 {
    // Unfitted ids map back to arena volumes; duplicate ids share a type,
    // so summing by id occurrence is exact.
    let mut remaining = outcome.plan.unfitted.clone();
    let mut volume = 0.0;
    for entry in ctx.arena {
        if let Some(pos) = remaining.iter().position(|id| *id == entry.item.id) {
            remaining.swap_remove(pos);
            volume += entry.item.volume_cm3();
        }
    }
    volume
}

/// Grow the best combination so far one truck at a time, always adding the
/// type that shrinks the residual volume the most. Returns the truncation
/// flag.
fn extend_greedily(
    ctx: &RecommendContext<'_>,
    evaluated: &mut Vec<(Combo, AllocationOutcome)>,
) -> PackResult<bool> {
    let Some((mut combo, mut outcome)) = evaluated
        .iter()
        .filter(|(_, o)| !o.plan.containers.is_empty())
        .min_by(|(_, a), (_, b)| {
            plan_rank_key(ctx, &a.plan, false)
                .partial_cmp(&plan_rank_key(ctx, &b.plan, false))
                .unwrap_or(Ordering::Equal)
        })
        .map(|(c, o)| (c.clone(), o.clone()))
    else {
        return Ok(false);
    };

    let mut truncated = false;
    while combo_size(&combo) < ctx.combination_size_cap as u32 && !outcome.plan.fits_all() {
        if ctx.params.deadline_expired() {
            truncated = true;
            break;
        }
        let current_residual = residual_volume(ctx, &outcome);

        let extensions: Vec<Combo> = (0..ctx.slots.len())
            .filter_map(|i| {
                let used = combo
                    .iter()
                    .find(|&&(index, _)| index == i)
                    .map_or(0, |&(_, c)| c);
                if !slot_available(ctx.slots, i, used + 1) {
                    return None;
                }
                let mut extended = combo.clone();
                match extended.iter_mut().find(|(index, _)| *index == i) {
                    Some((_, c)) => *c += 1,
                    None => extended.push((i, 1)),
                }
                Some(extended)
            })
            .collect();
        if extensions.is_empty() {
            break;
        }

        let (results, batch_truncated) = evaluate_batch(ctx, &extensions)?;
        truncated |= batch_truncated;
        let best_extension = results.into_iter().min_by(|(ca, a), (cb, b)| {
            residual_volume(ctx, a)
                .partial_cmp(&residual_volume(ctx, b))
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.plan.unfitted.len().cmp(&b.plan.unfitted.len()))
                .then_with(|| combo_ids(ctx, ca).cmp(&combo_ids(ctx, cb)))
        });

        match best_extension {
            Some((next_combo, next_outcome))
                if residual_volume(ctx, &next_outcome) < current_residual =>
            {
                combo = next_combo;
                outcome = next_outcome;
            }
            _ => break,
        }
    }

    evaluated.push((combo, outcome));
    Ok(truncated)
}

fn plan_rank_key(ctx: &RecommendContext<'_>, plan: &PackingPlan, perfect_fit: bool) -> f64 {
    rank_key(
        ctx.strategy,
        &ctx.weights,
        &ScoreInputs {
            utilization: plan.metrics.avg_volume_utilization,
            cost: plan.metrics.total_cost,
            truck_count: plan.metrics.truck_count,
            unfitted: plan.unfitted.len(),
        },
        perfect_fit,
    )
}

/// Score, order, dedupe and truncate the evaluated combinations.
fn rank(
    ctx: &RecommendContext<'_>,
    evaluated: Vec<(Combo, AllocationOutcome)>,
    perfect_combo: Option<&Combo>,
    partial: bool,
) -> Recommendation {
    let mut candidates: Vec<RankedCandidate> = evaluated
        .into_iter()
        .filter(|(_, outcome)| !outcome.plan.containers.is_empty())
        .map(|(combo, outcome)| {
            let perfect_fit = perfect_combo.is_some_and(|p| *p == combo);
            let reason = describe(ctx, &combo, &outcome, perfect_fit);
            RankedCandidate {
                combination: outcome.plan.combination(),
                rank_score: plan_rank_key(ctx, &outcome.plan, perfect_fit),
                reason,
                perfect_fit,
                plan: outcome.plan,
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.rank_score
            .partial_cmp(&b.rank_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.plan.metrics.truck_count.cmp(&b.plan.metrics.truck_count))
            .then_with(|| {
                b.plan
                    .metrics
                    .avg_volume_utilization
                    .partial_cmp(&a.plan.metrics.avg_volume_utilization)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| {
                a.plan
                    .metrics
                    .total_cost
                    .partial_cmp(&b.plan.metrics.total_cost)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.combination.cmp(&b.combination))
    });

    // A pair whose second truck went unused collapses to its single-truck
    // twin; keep only the best-ranked instance of each combination.
    let mut seen: Vec<Vec<(String, u32)>> = Vec::new();
    candidates.retain(|c| {
        if seen.contains(&c.combination) {
            false
        } else {
            seen.push(c.combination.clone());
            true
        }
    });
    candidates.truncate(ctx.alternatives_limit + 1);

    let mut diagnostics = Vec::new();
    if candidates.is_empty() {
        diagnostics.push(DiagnosticCode::NoFeasibleCandidate);
    } else if candidates[0].perfect_fit {
        diagnostics.push(DiagnosticCode::PerfectFit);
    }
    if partial {
        diagnostics.push(DiagnosticCode::DeadlineTruncated);
    }

    Recommendation {
        candidates,
        diagnostics,
        partial,
    }
}

fn describe(
    ctx: &RecommendContext<'_>,
    combo: &Combo,
    outcome: &AllocationOutcome,
    perfect_fit: bool,
) -> String {
    let trucks = outcome.plan.metrics.truck_count;
    if perfect_fit {
        "smallest single truck fitting all cartons".to_string()
    } else if combo.len() == 1 && combo[0].1 == 1 {
        let id = &ctx.slots[combo[0].0].container.id;
        if outcome.plan.fits_all() {
            format!("single truck {id} fits all cartons")
        } else {
            format!(
                "single truck {id} fits {} of {} cartons",
                outcome.plan.fitted_count(),
                ctx.arena.len()
            )
        }
    } else if combo_size(combo) == 2 {
        "pair combination chosen by best volume fit".to_string()
    } else {
        format!("greedy extension to {trucks} trucks")
    }
}
