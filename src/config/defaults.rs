//! System-wide default constants.
//!
//! Centralises every tunable the engine consumes. Grouped by subsystem for
//! easy discovery; `EngineConfig` and `CostTables` build their `Default`
//! impls from these values.

// ============================================================================
// Geometry
// ============================================================================

/// Geometric tolerance ε in centimetres.
pub const TOLERANCE_CM: f64 = 1e-6;

/// Minimum supported fraction of a carton's footprint (σ_min) for any
/// placement not on the container floor.
pub const SUPPORT_RATIO_MIN: f64 = 0.80;

/// Whether the gravity compaction post-pass runs for Space/Balanced plans.
pub const COMPACTION_ENABLED: bool = true;

// ============================================================================
// Recommendation Search
// ============================================================================

/// Cap on pair combinations explored when no single truck fits everything.
pub const PAIR_COMBO_CAP: usize = 5;

/// Cap on containers reached by greedy combination extension.
pub const COMBINATION_SIZE_CAP: usize = 4;

/// Maximum alternatives returned alongside the recommendation.
pub const ALTERNATIVES_LIMIT: usize = 5;

/// Penalty per unfitted carton — the dominant objective term.
pub const UNFITTED_PENALTY: f64 = 1e6;

/// Per-truck term of the MinTrucks objective.
pub const MIN_TRUCKS_TRUCK_WEIGHT: f64 = 1000.0;

/// Balanced objective: weight on volume utilization.
pub const BALANCED_UTILIZATION_WEIGHT: f64 = 1000.0;

/// Balanced objective: weight on trip cost.
pub const BALANCED_COST_WEIGHT: f64 = 1.0;

/// Bonus (in utilization units) granted to the smallest single truck that
/// fits every carton. Applied under Space/Balanced, where the objective is
/// utilization-scaled; cost-led strategies rely on ranking tie-breaks
/// instead so a perfect fit never overrides a cheaper plan.
pub const PERFECT_FIT_BONUS: f64 = 0.25;

// ============================================================================
// Worker Pool
// ============================================================================

/// Worker threads; 0 means one per available hardware thread.
pub const WORKER_THREADS: usize = 0;

/// Maximum concurrently admitted heavy computations. Submissions beyond
/// this fail fast with `Overloaded`.
pub const WORKER_QUEUE_DEPTH: usize = 64;

/// Default intra-request candidate evaluation fan-out cap.
pub const FAN_OUT_CAP: usize = 4;

// ============================================================================
// Result Cache
// ============================================================================

/// Maximum cached plans before LRU eviction.
pub const CACHE_CAPACITY: usize = 128;

/// TTL for cached recommendation (multi-candidate) results. 1 800 = 30 min.
pub const RECOMMENDATION_TTL_SECS: u64 = 1_800;

/// TTL for cached single-container results. 3 600 = 60 min.
pub const SINGLE_RESULT_TTL_SECS: u64 = 3_600;

// ============================================================================
// Cost Model — route tables
// ============================================================================

/// Fuel price per litre.
pub const FUEL_PRICE_PER_LITRE: f64 = 96.0;

/// Toll per kilometre by route type.
pub const TOLL_PER_KM_CITY: f64 = 0.0;
pub const TOLL_PER_KM_HIGHWAY: f64 = 2.5;
pub const TOLL_PER_KM_EXPRESSWAY: f64 = 4.0;
pub const TOLL_PER_KM_MIXED: f64 = 1.2;

/// Average speed (km/h) by route type, used for driver-hour estimation.
pub const AVG_SPEED_CITY_KMH: f64 = 30.0;
pub const AVG_SPEED_HIGHWAY_KMH: f64 = 60.0;
pub const AVG_SPEED_EXPRESSWAY_KMH: f64 = 80.0;
pub const AVG_SPEED_MIXED_KMH: f64 = 45.0;

/// Hours in one paid driver day; trips at or beyond this are billed at
/// least one full day.
pub const DRIVER_DAY_HOURS: f64 = 8.0;

// ============================================================================
// Cost Model — category default operational parameters
// ============================================================================

// Light trucks (e.g. pickup / LCV class)
pub const LIGHT_COST_PER_KM: f64 = 18.0;
pub const LIGHT_FUEL_PER_KM: f64 = 0.10;
pub const LIGHT_DRIVER_COST_PER_DAY: f64 = 800.0;
pub const LIGHT_MAINTENANCE_PER_KM: f64 = 2.0;
pub const LIGHT_AGE_FACTOR: f64 = 1.0;
pub const LIGHT_DEPRECIATION_PER_KM: f64 = 1.5;

// Medium trucks (e.g. 14-17 ft class)
pub const MEDIUM_COST_PER_KM: f64 = 25.0;
pub const MEDIUM_FUEL_PER_KM: f64 = 0.16;
pub const MEDIUM_DRIVER_COST_PER_DAY: f64 = 1_000.0;
pub const MEDIUM_MAINTENANCE_PER_KM: f64 = 3.5;
pub const MEDIUM_AGE_FACTOR: f64 = 1.0;
pub const MEDIUM_DEPRECIATION_PER_KM: f64 = 2.5;

// Heavy trucks (e.g. 32 ft multi-axle class)
pub const HEAVY_COST_PER_KM: f64 = 35.0;
pub const HEAVY_FUEL_PER_KM: f64 = 0.25;
pub const HEAVY_DRIVER_COST_PER_DAY: f64 = 1_400.0;
pub const HEAVY_MAINTENANCE_PER_KM: f64 = 5.0;
pub const HEAVY_AGE_FACTOR: f64 = 1.0;
pub const HEAVY_DEPRECIATION_PER_KM: f64 = 4.0;
