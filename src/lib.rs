//! FLEETPACK: 3D container loading and fleet assignment
//!
//! A packing engine for heterogeneous cartons and trucks: feasible 3D
//! placements (no overlap, in bounds, payload-limited, support-respecting)
//! ranked under a selectable objective.
//!
//! ## Architecture
//!
//! - **Geometry Kernel**: AABB tests, rotation enumeration, support ratios
//! - **Cost Model**: per-truck trip cost from distance, fuel, tolls, driver
//! - **Packer**: first-fit-decreasing anchor-point placement per container
//! - **Allocator**: residual packing across a fleet of containers
//! - **Recommendation**: candidate combinations scored per strategy
//! - **Consolidation**: joint packing of orders sharing region and date
//! - **Cache & Pool**: fingerprinted results, single-flight, bounded workers

pub mod allocator;
pub mod cache;
pub mod config;
pub mod consolidation;
pub mod cost;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod packer;
pub mod persist;
pub mod recommend;
pub mod types;
pub mod worker;

// Re-export the engine surface
pub use engine::{ConsolidationOutcome, ConsolidationRequest, PackEngine};

// Re-export commonly used types
pub use types::{
    ContainerSlot, ContainerSnapshot, DiagnosticCode, ItemSnapshot, PackOptions, PackRequest,
    PackResponse, PackStrategy, PackingPlan, Placement, RouteDescriptor, RouteType, TruckCategory,
};

// Re-export configuration and errors
pub use config::EngineConfig;
pub use error::{ErrorContext, PackError, PackResult};

// Re-export persistence and cache surfaces
pub use cache::{CacheStats, Fingerprint};
pub use persist::PersistedPlan;

// Re-export consolidation inputs
pub use consolidation::{ConsolidationKey, OrderSnapshot};

// Re-export recommendation output records
pub use recommend::{RankedCandidate, Recommendation};
