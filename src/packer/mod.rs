//! Single-container packing.
//!
//! The packer is a first-fit-decreasing heuristic over an anchor-point set
//! with a constraint chain: bounds, overlap, payload, support, fragility,
//! stack height. It never fails — cartons that cannot be placed land on
//! the result's `unfitted` list, and invalid inputs yield an empty result
//! with a structured `errors` field.

mod anchors;
mod compaction;
mod single;

pub use single::{pack_single, SingleRunOutcome};

use std::time::Instant;

use crate::config::EngineConfig;
use crate::types::{ItemSnapshot, PackOptions};

/// One expanded carton unit awaiting placement. A request multiset of
/// `(type, count)` pairs expands into `count` arena entries per type,
/// addressed by `arena_index` everywhere downstream.
#[derive(Debug, Clone)]
pub struct PackItem {
    pub arena_index: usize,
    pub item: ItemSnapshot,
}

/// Expand a carton multiset into the per-unit arena.
pub fn build_arena(items: &[(ItemSnapshot, u32)]) -> Vec<PackItem> {
    let mut arena = Vec::new();
    for (item, count) in items {
        for _ in 0..*count {
            arena.push(PackItem {
                arena_index: arena.len(),
                item: item.clone(),
            });
        }
    }
    arena
}

/// Resolved per-run packer parameters.
#[derive(Debug, Clone, Copy)]
pub struct PackerParams {
    /// Geometric tolerance ε in centimetres.
    pub tolerance: f64,
    /// Minimum supported footprint fraction σ_min.
    pub support_ratio_min: f64,
    /// Run the gravity compaction post-pass (Space/Balanced only).
    pub compaction: bool,
    /// Cooperative wall-clock budget; checked at each item's outer
    /// iteration.
    pub deadline: Option<Instant>,
}

impl PackerParams {
    /// Merge engine configuration with per-request option overrides.
    pub fn resolve(config: &EngineConfig, options: &PackOptions, deadline: Option<Instant>) -> Self {
        Self {
            tolerance: options.tolerance.unwrap_or(config.packing.tolerance),
            support_ratio_min: options
                .support_ratio_min
                .unwrap_or(config.packing.support_ratio_min),
            compaction: options.compaction.unwrap_or(config.packing.compaction),
            deadline,
        }
    }

    /// True once the wall-clock budget is spent.
    pub fn deadline_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}
