//! Catalog value snapshots: trucks and cartons.
//!
//! The engine never reads catalog storage. The embedder captures read-only
//! snapshots at request entry; optional operational parameters left `None`
//! are filled from per-category default tables inside the cost model.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorContext, PackError, PackResult};

/// Advisory truck size class; selects the default operational-cost table
/// when a snapshot omits optional parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruckCategory {
    Light,
    Medium,
    Heavy,
}

impl TruckCategory {
    /// Stable identifier used in fingerprints.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Heavy => "heavy",
        }
    }
}

impl std::fmt::Display for TruckCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only snapshot of one truck type.
///
/// Dimensions in centimetres, payload in kilograms. The interior is an
/// axis-aligned box: x spans `length_cm`, y (up) spans `height_cm`,
/// z spans `width_cm`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    pub id: String,
    pub name: String,
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
    pub max_payload_kg: f64,
    pub category: TruckCategory,

    // Optional operational parameters; category defaults apply when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_km: Option<f64>,
    /// Fuel consumption in litres per kilometre.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_per_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_cost_per_day: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_per_km: Option<f64>,
    /// Multiplier on maintenance cost for vehicle age (1.0 = new).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depreciation_per_km: Option<f64>,
}

impl ContainerSnapshot {
    /// Interior volume in cubic centimetres.
    pub fn volume_cm3(&self) -> f64 {
        self.length_cm * self.width_cm * self.height_cm
    }

    /// Reject incomplete snapshots and non-positive dimensions or payload.
    pub fn validate(&self) -> PackResult<()> {
        if self.id.is_empty() {
            return Err(PackError::catalog_missing(
                "container snapshot has no id",
                ErrorContext::default().with_invariant("identity"),
            ));
        }
        let dims = [
            ("length_cm", self.length_cm),
            ("width_cm", self.width_cm),
            ("height_cm", self.height_cm),
            ("max_payload_kg", self.max_payload_kg),
        ];
        for (field, value) in dims {
            if !value.is_finite() || value <= 0.0 {
                return Err(PackError::invalid_input_ctx(
                    format!("container {}: {field} must be finite and > 0, got {value}", self.id),
                    ErrorContext::container(self.id.clone()).with_invariant("dimensions"),
                ));
            }
        }
        Ok(())
    }
}

/// A truck type together with how many instances are available.
///
/// `count: None` means unbounded supply ("requirements calculator" mode:
/// how many trucks of this type does the demand need).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSlot {
    pub container: ContainerSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl ContainerSlot {
    /// Bounded slot with a fixed instance count.
    pub fn bounded(container: ContainerSnapshot, count: u32) -> Self {
        Self {
            container,
            count: Some(count),
        }
    }

    /// Unbounded slot for requirements-calculator mode.
    pub fn unbounded(container: ContainerSnapshot) -> Self {
        Self {
            container,
            count: None,
        }
    }
}

/// Read-only snapshot of one carton type.
///
/// Dimensions in centimetres, weight in kilograms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub id: String,
    pub name: String,
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
    pub weight_kg: f64,
    /// When false only the original orientation is legal.
    pub can_rotate: bool,
    /// Nothing may rest on a fragile carton.
    pub fragile: bool,
    /// When false, same rule as fragile: nothing may rest on it.
    pub stackable: bool,
    /// Cap on the number of cartons in any vertical chain containing this
    /// one. `None` or `Some(0)` means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stack_height: Option<u32>,
    /// Higher priority packs first under sort ties.
    #[serde(default)]
    pub priority: i32,
    /// Monetary value; influences cost-aware tie-breaks, never feasibility.
    #[serde(default)]
    pub value: f64,
}

impl ItemSnapshot {
    /// Carton volume in cubic centimetres.
    pub fn volume_cm3(&self) -> f64 {
        self.length_cm * self.width_cm * self.height_cm
    }

    /// Longest edge, used as a secondary sort key.
    pub fn max_dimension_cm(&self) -> f64 {
        self.length_cm.max(self.width_cm).max(self.height_cm)
    }

    /// Effective stack cap: `None`/`Some(0)` normalize to unlimited.
    pub fn stack_cap(&self) -> Option<u32> {
        match self.max_stack_height {
            None | Some(0) => None,
            Some(n) => Some(n),
        }
    }

    /// Reject incomplete snapshots, non-positive dimensions, negative
    /// weight.
    pub fn validate(&self) -> PackResult<()> {
        if self.id.is_empty() {
            return Err(PackError::catalog_missing(
                "item snapshot has no id",
                ErrorContext::default().with_invariant("identity"),
            ));
        }
        let dims = [
            ("length_cm", self.length_cm),
            ("width_cm", self.width_cm),
            ("height_cm", self.height_cm),
        ];
        for (field, value) in dims {
            if !value.is_finite() || value <= 0.0 {
                return Err(PackError::invalid_input_ctx(
                    format!("item {}: {field} must be finite and > 0, got {value}", self.id),
                    ErrorContext::item(self.id.clone()).with_invariant("dimensions"),
                ));
            }
        }
        if !self.weight_kg.is_finite() || self.weight_kg < 0.0 {
            return Err(PackError::invalid_input_ctx(
                format!(
                    "item {}: weight_kg must be finite and >= 0, got {}",
                    self.id, self.weight_kg
                ),
                ErrorContext::item(self.id.clone()).with_invariant("weight"),
            ));
        }
        Ok(())
    }
}
