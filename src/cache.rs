//! Result cache with single-flight build coordination.
//!
//! Maps request fingerprints to immutable recommendation results. Capacity
//! is bounded with least-recently-used eviction; entries expire after a
//! per-kind TTL. A per-fingerprint latch guarantees at most one concurrent
//! build: the first requester computes, everyone else waits and consumes
//! the same `Arc`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::CacheConfig;
use crate::error::PackResult;
use crate::packer::PackerParams;
use crate::recommend::Recommendation;
use crate::types::{ContainerSlot, ItemSnapshot, PackStrategy, RouteDescriptor};

/// Deterministic, order-independent digest of a pack request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Digest a canonical request rendering.
    fn digest(canonical: &str) -> Self {
        Self(format!("{:x}", md5::compute(canonical.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn bits(value: f64) -> String {
    format!("{:016x}", value.to_bits())
}

/// Fingerprint a request from its semantics-affecting parts: the sorted
/// carton multiset, sorted container slots, strategy, route, and the
/// resolved packing options. Execution details (deadline, fan-out) are
/// excluded — they change how fast an answer arrives, not the answer.
pub fn fingerprint_request(
    items: &[(ItemSnapshot, u32)],
    slots: &[ContainerSlot],
    strategy: PackStrategy,
    route: &RouteDescriptor,
    params: &PackerParams,
    max_combos: usize,
) -> Fingerprint {
    let mut item_keys: Vec<String> = items
        .iter()
        .map(|(item, count)| {
            format!(
                "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{count}",
                item.id,
                bits(item.length_cm),
                bits(item.width_cm),
                bits(item.height_cm),
                bits(item.weight_kg),
                item.can_rotate,
                item.fragile,
                item.stackable,
                item.max_stack_height.map_or(0, |c| c),
                item.priority,
                bits(item.value),
            )
        })
        .collect();
    item_keys.sort();

    let mut slot_keys: Vec<String> = slots
        .iter()
        .map(|slot| {
            let c = &slot.container;
            format!(
                "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
                c.id,
                bits(c.length_cm),
                bits(c.width_cm),
                bits(c.height_cm),
                bits(c.max_payload_kg),
                c.category,
                c.cost_per_km.map_or_else(|| "-".into(), bits),
                c.fuel_per_km.map_or_else(|| "-".into(), bits),
                c.driver_cost_per_day.map_or_else(|| "-".into(), bits),
                c.maintenance_per_km.map_or_else(|| "-".into(), bits),
                c.age_factor.map_or_else(|| "-".into(), bits),
                c.depreciation_per_km.map_or_else(|| "-".into(), bits),
            ) + &slot.count.map_or_else(|| "|inf".into(), |n| format!("|{n}"))
        })
        .collect();
    slot_keys.sort();

    let canonical = format!(
        "v1;items={};slots={};strategy={};route={}|{}|{};sigma={};eps={};compaction={};combos={max_combos}",
        item_keys.join(";"),
        slot_keys.join(";"),
        strategy,
        bits(route.distance_km),
        route.route_type,
        route.region.as_deref().unwrap_or("-"),
        bits(params.support_ratio_min),
        bits(params.tolerance),
        params.compaction,
    );
    Fingerprint::digest(&canonical)
}

/// Entry class: recommendation searches live shorter than single-container
/// results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Recommendation,
    SingleResult,
}

struct CacheEntry {
    value: Arc<Recommendation>,
    kind: CacheKind,
    inserted: Instant,
    inserted_utc: DateTime<Utc>,
    /// Nanoseconds since the cache epoch, for LRU ordering.
    last_access: AtomicU64,
}

enum FlightState {
    Pending,
    Done(Arc<Recommendation>),
    Failed,
}

/// Per-fingerprint single-flight latch.
struct Flight {
    state: Mutex<FlightState>,
    cv: Condvar,
}

impl Flight {
    fn new() -> Self {
        Self {
            state: Mutex::new(FlightState::Pending),
            cv: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FlightState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn complete(&self, state: FlightState) {
        *self.lock() = state;
        self.cv.notify_all();
    }

    /// Block until the leader finishes; `None` means the build failed and
    /// the waiter should retry.
    fn wait(&self) -> Option<Arc<Recommendation>> {
        let mut guard = self.lock();
        loop {
            match &*guard {
                FlightState::Pending => {
                    guard = self
                        .cv
                        .wait(guard)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                FlightState::Done(value) => return Some(Arc::clone(value)),
                FlightState::Failed => return None,
            }
        }
    }
}

/// Observability counters, also consumed by the single-flight tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Completed result computations (at most one per fingerprint at a time).
    pub builds: u64,
    pub entries: usize,
}

/// Bounded, TTL'd, single-flight result cache.
pub struct PlanCache {
    entries: DashMap<Fingerprint, Arc<CacheEntry>>,
    flights: DashMap<Fingerprint, Arc<Flight>>,
    epoch: Instant,
    capacity: usize,
    recommendation_ttl: Duration,
    single_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    builds: AtomicU64,
}

impl PlanCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            flights: DashMap::new(),
            epoch: Instant::now(),
            capacity: config.capacity,
            recommendation_ttl: Duration::from_secs(config.recommendation_ttl_secs),
            single_ttl: Duration::from_secs(config.single_result_ttl_secs),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            builds: AtomicU64::new(0),
        }
    }

    fn ttl_for(&self, kind: CacheKind) -> Duration {
        match kind {
            CacheKind::Recommendation => self.recommendation_ttl,
            CacheKind::SingleResult => self.single_ttl,
        }
    }

    fn now_nanos(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    /// Fresh entry lookup; expired entries are dropped on the way.
    fn lookup(&self, fingerprint: &Fingerprint) -> Option<Arc<Recommendation>> {
        let expired = match self.entries.get(fingerprint) {
            None => return None,
            Some(entry) => {
                if entry.inserted.elapsed() <= self.ttl_for(entry.kind) {
                    entry.last_access.store(self.now_nanos(), Ordering::Relaxed);
                    return Some(Arc::clone(&entry.value));
                }
                true
            }
        };
        if expired {
            self.entries.remove(fingerprint);
            debug!(fingerprint = %fingerprint, "cache entry expired");
        }
        None
    }

    fn insert(&self, fingerprint: Fingerprint, kind: CacheKind, value: Arc<Recommendation>) {
        while self.entries.len() >= self.capacity {
            let victim = self
                .entries
                .iter()
                .min_by_key(|e| e.value().last_access.load(Ordering::Relaxed))
                .map(|e| e.key().clone());
            match victim {
                Some(key) => {
                    self.entries.remove(&key);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                    debug!(fingerprint = %key, "evicted least-recently-used cache entry");
                }
                None => break,
            }
        }
        let entry = CacheEntry {
            value,
            kind,
            inserted: Instant::now(),
            inserted_utc: Utc::now(),
            last_access: AtomicU64::new(self.now_nanos()),
        };
        self.entries.insert(fingerprint, Arc::new(entry));
    }

    /// Return a cached result, or build it with at-most-one concurrent
    /// build per fingerprint. The boolean is true when the result came
    /// from cache (or from another thread's in-flight build).
    pub fn get_or_build<F>(
        &self,
        fingerprint: &Fingerprint,
        kind: CacheKind,
        build: F,
    ) -> PackResult<(Arc<Recommendation>, bool)>
    where
        F: FnOnce() -> PackResult<Recommendation>,
    {
        let mut build = Some(build);
        loop {
            if let Some(value) = self.lookup(fingerprint) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(fingerprint = %fingerprint, "cache hit");
                return Ok((value, true));
            }

            enum Role {
                Leader(Arc<Flight>),
                Waiter(Arc<Flight>),
            }
            let role = match self.flights.entry(fingerprint.clone()) {
                dashmap::mapref::entry::Entry::Occupied(o) => Role::Waiter(Arc::clone(o.get())),
                dashmap::mapref::entry::Entry::Vacant(v) => {
                    let flight = Arc::new(Flight::new());
                    v.insert(Arc::clone(&flight));
                    Role::Leader(flight)
                }
            };

            match role {
                Role::Leader(flight) => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    let Some(build) = build.take() else {
                        // A waiter can only become leader after its first
                        // pass; the closure is still unspent then. Getting
                        // here twice is a logic bug, not a user error.
                        self.flights.remove(fingerprint);
                        flight.complete(FlightState::Failed);
                        return Err(crate::error::PackError::internal(
                            "single-flight leader attempted a second build",
                        ));
                    };
                    let result = build();
                    match result {
                        Ok(value) => {
                            let value = Arc::new(value);
                            self.builds.fetch_add(1, Ordering::Relaxed);
                            self.insert(fingerprint.clone(), kind, Arc::clone(&value));
                            flight.complete(FlightState::Done(Arc::clone(&value)));
                            self.flights.remove(fingerprint);
                            return Ok((value, false));
                        }
                        Err(e) => {
                            flight.complete(FlightState::Failed);
                            self.flights.remove(fingerprint);
                            return Err(e);
                        }
                    }
                }
                Role::Waiter(flight) => match flight.wait() {
                    Some(value) => {
                        self.hits.fetch_add(1, Ordering::Relaxed);
                        debug!(fingerprint = %fingerprint, "joined in-flight build");
                        return Ok((value, true));
                    }
                    // Leader failed; retry (and possibly lead) ourselves.
                    None => continue,
                },
            }
        }
    }

    /// Drop every entry (cost-table swaps invalidate cached plans).
    pub fn clear(&self) {
        let dropped = self.entries.len();
        self.entries.clear();
        if dropped > 0 {
            info!(dropped, "cleared plan cache");
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    /// Insertion time of the oldest live entry, for operator dashboards.
    pub fn oldest_entry(&self) -> Option<DateTime<Utc>> {
        self.entries
            .iter()
            .map(|e| e.value().inserted_utc)
            .min()
    }
}
