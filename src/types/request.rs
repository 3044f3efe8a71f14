//! Pack request / response records — Interface A of the engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::catalog::{ContainerSlot, ItemSnapshot};
use super::placement::PackingPlan;
use super::route::RouteDescriptor;
use super::strategy::PackStrategy;
use crate::error::{PackError, PackResult};

/// Per-request overrides of engine configuration. Any field left `None`
/// falls back to the `EngineConfig` the engine was constructed with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackOptions {
    /// Minimum supported fraction of a carton's footprint (σ_min).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_ratio_min: Option<f64>,
    /// Geometric tolerance ε in centimetres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    /// Run the post-pass gravity compaction (Space/Balanced only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compaction: Option<bool>,
    /// Parallel candidate evaluations inside one request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_out: Option<usize>,
}

/// A packing request: cartons, candidate trucks, strategy, route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackRequest {
    /// Carton multiset as (type snapshot, count) pairs.
    pub items: Vec<(ItemSnapshot, u32)>,
    /// Candidate truck types with availability.
    pub containers: Vec<ContainerSlot>,
    pub strategy: PackStrategy,
    pub route: RouteDescriptor,
    /// Cap on pair combinations explored by the recommendation search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_combos: Option<usize>,
    /// Wall-clock budget; on expiry the best-so-far response is returned
    /// with `partial = true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Duration>,
    #[serde(default)]
    pub options: PackOptions,
}

impl PackRequest {
    /// Validate the whole request surface: multiset, snapshots, route,
    /// option ranges.
    pub fn validate(&self) -> PackResult<()> {
        if self.items.is_empty() {
            return Err(PackError::invalid_input("request contains no items"));
        }
        if self.containers.is_empty() {
            return Err(PackError::invalid_input(
                "request contains no candidate containers",
            ));
        }
        for (item, count) in &self.items {
            item.validate()?;
            if *count == 0 {
                return Err(PackError::invalid_input(format!(
                    "item {}: count must be >= 1",
                    item.id
                )));
            }
        }
        for slot in &self.containers {
            slot.container.validate()?;
        }
        self.route.validate()?;
        if let Some(sigma) = self.options.support_ratio_min {
            if !(0.0..=1.0).contains(&sigma) {
                return Err(PackError::invalid_input(format!(
                    "support_ratio_min must be in [0, 1], got {sigma}"
                )));
            }
        }
        if let Some(eps) = self.options.tolerance {
            if !eps.is_finite() || eps < 0.0 {
                return Err(PackError::invalid_input(format!(
                    "tolerance must be finite and >= 0, got {eps}"
                )));
            }
        }
        if self.options.fan_out == Some(0) {
            return Err(PackError::invalid_input("fan_out must be >= 1"));
        }
        if self.max_combos == Some(0) {
            return Err(PackError::invalid_input("max_combos must be >= 1"));
        }
        Ok(())
    }

    /// Total carton count across the multiset.
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|(_, n)| u64::from(*n)).sum()
    }
}

/// Machine-readable diagnostics attached to a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// The recommendation is the smallest single truck fitting every carton.
    PerfectFit,
    /// No candidate placed even one carton.
    NoFeasibleCandidate,
    /// The deadline expired; the response is best-so-far.
    DeadlineTruncated,
    /// The response was served from the result cache.
    CacheHit,
    /// Consolidated packing beat the per-order plans.
    ConsolidationAccepted,
    /// Consolidated packing did not beat the per-order plans.
    ConsolidationRejected,
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PerfectFit => "perfect_fit",
            Self::NoFeasibleCandidate => "no_feasible_candidate",
            Self::DeadlineTruncated => "deadline_truncated",
            Self::CacheHit => "cache_hit",
            Self::ConsolidationAccepted => "consolidation_accepted",
            Self::ConsolidationRejected => "consolidation_rejected",
        };
        f.write_str(s)
    }
}

/// Engine response: recommendation plus ranked alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackResponse {
    /// Best plan, absent when no candidate fit even one carton.
    pub recommendation: Option<PackingPlan>,
    /// Runner-up plans, best first.
    pub alternatives: Vec<PackingPlan>,
    pub diagnostics: Vec<DiagnosticCode>,
    /// True when the deadline truncated the search.
    pub partial: bool,
}
