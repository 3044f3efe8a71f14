//! Engine facade.
//!
//! `PackEngine` owns the process-scoped moving parts — configuration,
//! hot-swappable cost tables, the result cache, the worker pool — and is
//! the entry point the surrounding application calls. It is re-entrant and
//! thread-safe; catalog snapshots pass through untouched.

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use tracing::info;

use crate::cache::{fingerprint_request, CacheKind, CacheStats, PlanCache};
use crate::config::EngineConfig;
use crate::consolidation::{
    group_orders, merge_accepted, merged_arena, ConsolidationKey, ItemProvenance, OrderSnapshot,
};
use crate::cost::CostTables;
use crate::error::{PackError, PackResult};
use crate::packer::{build_arena, PackerParams};
use crate::recommend::{recommend, Recommendation, RecommendContext};
use crate::types::{
    ContainerSlot, DiagnosticCode, ItemSnapshot, PackOptions, PackRequest, PackResponse,
    PackStrategy, RouteDescriptor,
};
use crate::worker::WorkerPool;

/// Consolidated packing request: several sale-orders against one truck
/// catalog slice.
#[derive(Debug, Clone)]
pub struct ConsolidationRequest {
    pub orders: Vec<OrderSnapshot>,
    pub containers: Vec<ContainerSlot>,
    pub strategy: PackStrategy,
    pub route: RouteDescriptor,
    pub max_combos: Option<usize>,
    pub deadline: Option<std::time::Duration>,
    pub options: PackOptions,
}

/// Merge decision for one consolidation group.
#[derive(Debug, Clone)]
pub struct ConsolidationOutcome {
    pub key: ConsolidationKey,
    /// Orders in the group, id-sorted.
    pub order_ids: Vec<String>,
    /// True when the joint plan beat the per-order plans.
    pub accepted: bool,
    /// Joint recommendation over the merged carton pool.
    pub merged: Arc<Recommendation>,
    /// Per-order recommendations, aligned with `order_ids`.
    pub individual: Vec<(String, Arc<Recommendation>)>,
    /// Maps merged-plan placements back to source orders.
    pub provenance: Vec<ItemProvenance>,
    pub diagnostics: Vec<DiagnosticCode>,
}

/// The container-loading engine.
pub struct PackEngine {
    config: EngineConfig,
    cost_tables: ArcSwap<CostTables>,
    cache: PlanCache,
    pool: WorkerPool,
}

impl PackEngine {
    /// Build an engine from validated configuration.
    pub fn new(config: EngineConfig) -> PackResult<Self> {
        config.validate()?;
        let pool = WorkerPool::new(&config.worker)?;
        let cache = PlanCache::new(&config.cache);
        let cost_tables = ArcSwap::from_pointee(config.cost_tables.clone());
        info!(
            threads = pool.threads(),
            cache_capacity = config.cache.capacity,
            "pack engine ready"
        );
        Ok(Self {
            config,
            cost_tables,
            cache,
            pool,
        })
    }

    /// Engine with built-in default configuration.
    pub fn with_defaults() -> PackResult<Self> {
        Self::new(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current cost tables.
    pub fn cost_tables(&self) -> Arc<CostTables> {
        self.cost_tables.load_full()
    }

    /// Swap the cost tables without restarting. Cached plans priced with
    /// the old tables are dropped.
    pub fn swap_cost_tables(&self, tables: CostTables) {
        self.cost_tables.store(Arc::new(tables));
        self.cache.clear();
        info!("cost tables swapped, plan cache cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Interface A: full request → response with recommendation and
    /// alternatives.
    pub fn pack(&self, request: &PackRequest) -> PackResult<PackResponse> {
        let (recommendation, from_cache) = self.recommend_cached(request)?;
        let mut diagnostics = recommendation.diagnostics.clone();
        if from_cache {
            diagnostics.push(DiagnosticCode::CacheHit);
        }
        Ok(PackResponse {
            recommendation: recommendation.best().map(|c| c.plan.clone()),
            alternatives: recommendation
                .candidates
                .iter()
                .skip(1)
                .map(|c| c.plan.clone())
                .collect(),
            diagnostics,
            partial: recommendation.partial,
        })
    }

    /// Ranked candidate list for a request, served from cache when
    /// fingerprints match.
    pub fn recommend(&self, request: &PackRequest) -> PackResult<Arc<Recommendation>> {
        self.recommend_cached(request).map(|(r, _)| r)
    }

    fn recommend_cached(&self, request: &PackRequest) -> PackResult<(Arc<Recommendation>, bool)> {
        request.validate()?;
        let deadline = request.deadline.map(|d| Instant::now() + d);
        let params = PackerParams::resolve(&self.config, &request.options, deadline);
        let max_combos = request.max_combos.unwrap_or(self.config.search.max_combos);
        let fingerprint = fingerprint_request(
            &request.items,
            &request.containers,
            request.strategy,
            &request.route,
            &params,
            max_combos,
        );
        let kind = if request.containers.len() == 1 && request.containers[0].count == Some(1) {
            CacheKind::SingleResult
        } else {
            CacheKind::Recommendation
        };
        let tables = self.cost_tables.load_full();
        let fan_out = request
            .options
            .fan_out
            .unwrap_or(self.config.search.fan_out)
            .clamp(1, self.pool.threads().max(1));

        self.cache.get_or_build(&fingerprint, kind, || {
            self.pool.run(|| {
                let arena = build_arena(&request.items);
                let ctx = RecommendContext {
                    slots: &request.containers,
                    arena: &arena,
                    strategy: request.strategy,
                    route: &request.route,
                    params,
                    weights: self.config.weights,
                    tables: &tables,
                    max_combos,
                    combination_size_cap: self.config.search.combination_size_cap,
                    alternatives_limit: self.config.search.alternatives_limit,
                    fan_out,
                };
                recommend(&ctx)
            })?
        })
    }

    /// Interface A, consolidation entry point: group orders by delivery
    /// region and date, pack each group jointly, and keep the merge only
    /// when it strictly beats the per-order plans.
    pub fn pack_consolidated(
        &self,
        request: &ConsolidationRequest,
    ) -> PackResult<Vec<ConsolidationOutcome>> {
        if request.orders.is_empty() {
            return Err(PackError::invalid_input("no orders to consolidate"));
        }
        let deadline = request.deadline.map(|d| Instant::now() + d);
        let mut outcomes = Vec::new();

        for group in group_orders(&request.orders) {
            let mut individual = Vec::with_capacity(group.orders.len());
            let mut individual_scores = Vec::with_capacity(group.orders.len());
            for order in &group.orders {
                let rec = self.recommend(&self.sub_request(request, deadline, &order.items))?;
                individual_scores.push(rec.best().map(|c| c.rank_score));
                individual.push((order.order_id.clone(), rec));
            }

            let merged_items: Vec<(ItemSnapshot, u32)> = group
                .orders
                .iter()
                .flat_map(|o| o.items.iter().cloned())
                .collect();
            let merged = self.recommend(&self.sub_request(request, deadline, &merged_items))?;
            let merged_score = merged.best().map(|c| c.rank_score);

            let mergeable = group.orders.len() > 1;
            let accepted = mergeable && merge_accepted(merged_score, &individual_scores);
            let mut diagnostics = Vec::new();
            if mergeable {
                diagnostics.push(if accepted {
                    DiagnosticCode::ConsolidationAccepted
                } else {
                    DiagnosticCode::ConsolidationRejected
                });
            }
            info!(
                region = %group.key.region,
                date = %group.key.date,
                orders = group.orders.len(),
                accepted,
                "consolidation decision"
            );

            let (_, provenance) = merged_arena(&group);
            outcomes.push(ConsolidationOutcome {
                order_ids: group.orders.iter().map(|o| o.order_id.clone()).collect(),
                key: group.key,
                accepted,
                merged,
                individual,
                provenance,
                diagnostics,
            });
        }
        Ok(outcomes)
    }

    fn sub_request(
        &self,
        request: &ConsolidationRequest,
        deadline: Option<Instant>,
        items: &[(ItemSnapshot, u32)],
    ) -> PackRequest {
        PackRequest {
            items: items.to_vec(),
            containers: request.containers.clone(),
            strategy: request.strategy,
            route: request.route.clone(),
            max_combos: request.max_combos,
            deadline: deadline.map(|d| d.saturating_duration_since(Instant::now())),
            options: request.options.clone(),
        }
    }
}
