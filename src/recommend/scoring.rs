//! Objective functions per strategy.
//!
//! Two views of the same plan: `objective_value` is the raw objective in
//! the strategy's natural direction (Space maximizes, the rest minimize);
//! `rank_key` folds everything into a lower-is-better scalar the ranking
//! sorts on, including the perfect-fit bonus.

use crate::config::defaults;
use crate::config::BalancedWeights;
use crate::types::PackStrategy;

/// Aggregates a scorer needs from a plan or single-container result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    /// Volume utilization in [0, 1] (plan level: mean over used trucks).
    pub utilization: f64,
    /// Total trip cost.
    pub cost: f64,
    /// Containers with at least one placed carton.
    pub truck_count: usize,
    /// Cartons no container took.
    pub unfitted: usize,
}

/// Dominant penalty keeping infeasible plans below feasible ones.
fn unfitted_penalty(unfitted: usize) -> f64 {
    defaults::UNFITTED_PENALTY * unfitted as f64
}

/// Raw objective under the strategy's natural direction.
///
/// Space is a maximization (higher is better); Cost, Balanced and
/// MinTrucks are minimizations.
pub fn objective_value(
    strategy: PackStrategy,
    weights: &BalancedWeights,
    inputs: &ScoreInputs,
) -> f64 {
    let penalty = unfitted_penalty(inputs.unfitted);
    match strategy {
        PackStrategy::Space => inputs.utilization - penalty,
        PackStrategy::Cost => inputs.cost + penalty,
        PackStrategy::MinTrucks => {
            inputs.truck_count as f64 * defaults::MIN_TRUCKS_TRUCK_WEIGHT + inputs.cost + penalty
        }
        PackStrategy::Balanced => {
            -inputs.utilization * weights.utilization + inputs.cost * weights.cost + penalty
        }
    }
}

/// Lower-is-better ranking scalar.
///
/// The perfect-fit bonus applies on the utilization-scaled strategies;
/// cost-led strategies keep their raw objective so a perfect fit never
/// outranks a strictly cheaper plan (ranking tie-breaks cover equality).
pub fn rank_key(
    strategy: PackStrategy,
    weights: &BalancedWeights,
    inputs: &ScoreInputs,
    perfect_fit: bool,
) -> f64 {
    let objective = objective_value(strategy, weights, inputs);
    let mut key = match strategy {
        PackStrategy::Space => -objective,
        _ => objective,
    };
    if perfect_fit {
        key -= match strategy {
            PackStrategy::Space => defaults::PERFECT_FIT_BONUS,
            PackStrategy::Balanced => defaults::PERFECT_FIT_BONUS * weights.utilization,
            PackStrategy::Cost | PackStrategy::MinTrucks => 0.0,
        };
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(utilization: f64, cost: f64, trucks: usize, unfitted: usize) -> ScoreInputs {
        ScoreInputs {
            utilization,
            cost,
            truck_count: trucks,
            unfitted,
        }
    }

    #[test]
    fn unfitted_penalty_dominates_every_strategy() {
        let w = BalancedWeights::default();
        for strategy in [
            PackStrategy::Space,
            PackStrategy::Cost,
            PackStrategy::Balanced,
            PackStrategy::MinTrucks,
        ] {
            let full = rank_key(strategy, &w, &inputs(0.1, 50_000.0, 4, 0), false);
            let partial = rank_key(strategy, &w, &inputs(0.95, 100.0, 1, 1), false);
            assert!(
                full < partial,
                "{strategy}: feasible plan must outrank infeasible one"
            );
        }
    }

    #[test]
    fn space_prefers_higher_utilization() {
        let w = BalancedWeights::default();
        let tight = rank_key(PackStrategy::Space, &w, &inputs(0.9, 500.0, 1, 0), false);
        let loose = rank_key(PackStrategy::Space, &w, &inputs(0.3, 100.0, 1, 0), false);
        assert!(tight < loose);
    }

    #[test]
    fn cost_prefers_cheaper_plans_over_perfect_fit() {
        let w = BalancedWeights::default();
        let cheap_pair = rank_key(PackStrategy::Cost, &w, &inputs(0.5, 900.0, 2, 0), false);
        let pricey_single = rank_key(PackStrategy::Cost, &w, &inputs(0.9, 1_400.0, 1, 0), true);
        assert!(cheap_pair < pricey_single);
    }

    #[test]
    fn min_trucks_weighs_truck_count_over_cost() {
        let w = BalancedWeights::default();
        let one_big = rank_key(PackStrategy::MinTrucks, &w, &inputs(0.9, 1_400.0, 1, 0), false);
        let three_small = rank_key(PackStrategy::MinTrucks, &w, &inputs(0.8, 900.0, 3, 0), false);
        assert!(one_big < three_small);
    }

    #[test]
    fn perfect_fit_bonus_tips_space_ranking() {
        let w = BalancedWeights::default();
        let single = rank_key(PackStrategy::Space, &w, &inputs(0.6, 1_400.0, 1, 0), true);
        let pair = rank_key(PackStrategy::Space, &w, &inputs(0.7, 900.0, 2, 0), false);
        assert!(single < pair);
    }

    #[test]
    fn balanced_trades_cost_against_utilization() {
        let w = BalancedWeights::default();
        // 0.1 utilization gain is worth 100 cost units at W_u=1000, W_c=1.
        let better = rank_key(PackStrategy::Balanced, &w, &inputs(0.8, 1_050.0, 1, 0), false);
        let worse = rank_key(PackStrategy::Balanced, &w, &inputs(0.7, 1_000.0, 1, 0), false);
        assert!(better < worse);
    }
}
