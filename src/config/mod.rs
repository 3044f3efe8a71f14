//! Engine configuration.
//!
//! `EngineConfig` is a plain value object handed to `PackEngine::new` — the
//! engine holds no global state. Configuration is loadable from TOML with
//! the standard search order:
//!
//! 1. `$FLEETPACK_CONFIG` environment variable (path to TOML file)
//! 2. `fleetpack.toml` in the current working directory
//! 3. Built-in defaults (`config::defaults`)
//!
//! Every struct implements `Default` with values from `defaults.rs`, so a
//! partial TOML file overrides only the keys it names.

pub mod defaults;

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cost::CostTables;
use crate::error::{PackError, PackResult};

/// Geometric and stability tunables of the single-container packer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackingConfig {
    /// Geometric tolerance ε in centimetres.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Minimum supported footprint fraction σ_min for off-floor placements.
    #[serde(default = "default_support_ratio_min")]
    pub support_ratio_min: f64,
    /// Run the gravity compaction post-pass for Space/Balanced plans.
    #[serde(default = "default_compaction")]
    pub compaction: bool,
}

fn default_tolerance() -> f64 {
    defaults::TOLERANCE_CM
}
fn default_support_ratio_min() -> f64 {
    defaults::SUPPORT_RATIO_MIN
}
fn default_compaction() -> bool {
    defaults::COMPACTION_ENABLED
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            tolerance: defaults::TOLERANCE_CM,
            support_ratio_min: defaults::SUPPORT_RATIO_MIN,
            compaction: defaults::COMPACTION_ENABLED,
        }
    }
}

/// Candidate enumeration limits of the recommendation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Cap on pair combinations explored.
    #[serde(default = "default_max_combos")]
    pub max_combos: usize,
    /// Cap on containers reached by greedy extension.
    #[serde(default = "default_combination_cap")]
    pub combination_size_cap: usize,
    /// Maximum alternatives returned alongside the recommendation.
    #[serde(default = "default_alternatives")]
    pub alternatives_limit: usize,
    /// Parallel candidate evaluations inside one request; capped by the
    /// worker pool's thread count at runtime.
    #[serde(default = "default_fan_out")]
    pub fan_out: usize,
}

fn default_max_combos() -> usize {
    defaults::PAIR_COMBO_CAP
}
fn default_combination_cap() -> usize {
    defaults::COMBINATION_SIZE_CAP
}
fn default_alternatives() -> usize {
    defaults::ALTERNATIVES_LIMIT
}
fn default_fan_out() -> usize {
    defaults::FAN_OUT_CAP
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_combos: defaults::PAIR_COMBO_CAP,
            combination_size_cap: defaults::COMBINATION_SIZE_CAP,
            alternatives_limit: defaults::ALTERNATIVES_LIMIT,
            fan_out: defaults::FAN_OUT_CAP,
        }
    }
}

/// Worker pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Worker threads; 0 means one per available hardware thread.
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// Maximum concurrently admitted computations before `Overloaded`.
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

fn default_threads() -> usize {
    defaults::WORKER_THREADS
}
fn default_queue_depth() -> usize {
    defaults::WORKER_QUEUE_DEPTH
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: defaults::WORKER_THREADS,
            queue_depth: defaults::WORKER_QUEUE_DEPTH,
        }
    }
}

/// Result cache sizing and lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum cached results before LRU eviction.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    /// TTL for recommendation (multi-candidate) entries, seconds.
    #[serde(default = "default_recommendation_ttl")]
    pub recommendation_ttl_secs: u64,
    /// TTL for single-container entries, seconds.
    #[serde(default = "default_single_ttl")]
    pub single_result_ttl_secs: u64,
}

fn default_cache_capacity() -> usize {
    defaults::CACHE_CAPACITY
}
fn default_recommendation_ttl() -> u64 {
    defaults::RECOMMENDATION_TTL_SECS
}
fn default_single_ttl() -> u64 {
    defaults::SINGLE_RESULT_TTL_SECS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::CACHE_CAPACITY,
            recommendation_ttl_secs: defaults::RECOMMENDATION_TTL_SECS,
            single_result_ttl_secs: defaults::SINGLE_RESULT_TTL_SECS,
        }
    }
}

/// Balanced-strategy objective weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalancedWeights {
    /// Weight on volume utilization (W_u).
    #[serde(default = "default_w_u")]
    pub utilization: f64,
    /// Weight on trip cost (W_c).
    #[serde(default = "default_w_c")]
    pub cost: f64,
}

fn default_w_u() -> f64 {
    defaults::BALANCED_UTILIZATION_WEIGHT
}
fn default_w_c() -> f64 {
    defaults::BALANCED_COST_WEIGHT
}

impl Default for BalancedWeights {
    fn default() -> Self {
        Self {
            utilization: defaults::BALANCED_UTILIZATION_WEIGHT,
            cost: defaults::BALANCED_COST_WEIGHT,
        }
    }
}

/// Root engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub packing: PackingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub weights: BalancedWeights,
    #[serde(default)]
    pub cost_tables: CostTables,
}

impl EngineConfig {
    /// Load configuration using the standard search order:
    /// 1. `$FLEETPACK_CONFIG` environment variable
    /// 2. `./fleetpack.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("FLEETPACK_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_path(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded engine config from FLEETPACK_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from FLEETPACK_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "FLEETPACK_CONFIG points to non-existent file, falling back");
            }
        }

        let local = Path::new("fleetpack.toml");
        if local.exists() {
            match Self::load_from_path(local) {
                Ok(config) => {
                    info!(path = %local.display(), "Loaded engine config from working directory");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./fleetpack.toml, using defaults");
                }
            }
        }

        Self::default()
    }

    /// Load and parse a TOML config file.
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Reject out-of-range values before the engine starts.
    pub fn validate(&self) -> PackResult<()> {
        if !(0.0 < self.packing.support_ratio_min && self.packing.support_ratio_min <= 1.0) {
            return Err(PackError::invalid_input(format!(
                "support_ratio_min must be in (0, 1], got {}",
                self.packing.support_ratio_min
            )));
        }
        if !self.packing.tolerance.is_finite() || self.packing.tolerance < 0.0 {
            return Err(PackError::invalid_input(format!(
                "tolerance must be finite and >= 0, got {}",
                self.packing.tolerance
            )));
        }
        if self.search.max_combos == 0 {
            return Err(PackError::invalid_input("search.max_combos must be >= 1"));
        }
        if self.search.combination_size_cap == 0 {
            return Err(PackError::invalid_input(
                "search.combination_size_cap must be >= 1",
            ));
        }
        if self.search.fan_out == 0 {
            return Err(PackError::invalid_input("search.fan_out must be >= 1"));
        }
        if self.worker.queue_depth == 0 {
            return Err(PackError::invalid_input("worker.queue_depth must be >= 1"));
        }
        if self.cache.capacity == 0 {
            return Err(PackError::invalid_input("cache.capacity must be >= 1"));
        }
        if self.weights.utilization < 0.0 || self.weights.cost < 0.0 {
            return Err(PackError::invalid_input(
                "balanced weights must be non-negative",
            ));
        }
        Ok(())
    }
}
