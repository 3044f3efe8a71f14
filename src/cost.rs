//! Operational cost model.
//!
//! Deterministic, side-effect-free trip cost from a container snapshot and
//! a route descriptor. Rates are configuration (`CostTables`), not runtime
//! inputs; a snapshot that omits optional parameters falls back to its
//! category's default table, so cost computation never fails on missing
//! data — only on negative distance.

use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::error::{PackError, PackResult};
use crate::types::{ContainerSnapshot, RouteDescriptor, RouteType, TruckCategory};

/// Per-route-type rate row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteRates {
    pub city: f64,
    pub highway: f64,
    pub expressway: f64,
    pub mixed: f64,
}

impl RouteRates {
    /// Rate for the given route type.
    pub fn for_route(&self, route_type: RouteType) -> f64 {
        match route_type {
            RouteType::City => self.city,
            RouteType::Highway => self.highway,
            RouteType::Expressway => self.expressway,
            RouteType::Mixed => self.mixed,
        }
    }
}

/// Fully resolved operational parameters of one truck.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperationalParams {
    pub cost_per_km: f64,
    pub fuel_per_km: f64,
    pub driver_cost_per_day: f64,
    pub maintenance_per_km: f64,
    pub age_factor: f64,
    pub depreciation_per_km: f64,
}

/// Rate tables the cost model reads. Hot-swappable on the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostTables {
    /// Fuel price per litre.
    #[serde(default = "default_fuel_price")]
    pub fuel_price_per_litre: f64,
    /// Toll per kilometre by route type.
    #[serde(default = "default_tolls")]
    pub toll_per_km: RouteRates,
    /// Average speed (km/h) by route type.
    #[serde(default = "default_speeds")]
    pub avg_speed_kmh: RouteRates,
    /// Defaults for trucks that omit operational parameters.
    #[serde(default = "default_light")]
    pub light_defaults: OperationalParams,
    #[serde(default = "default_medium")]
    pub medium_defaults: OperationalParams,
    #[serde(default = "default_heavy")]
    pub heavy_defaults: OperationalParams,
}

fn default_fuel_price() -> f64 {
    defaults::FUEL_PRICE_PER_LITRE
}

fn default_tolls() -> RouteRates {
    RouteRates {
        city: defaults::TOLL_PER_KM_CITY,
        highway: defaults::TOLL_PER_KM_HIGHWAY,
        expressway: defaults::TOLL_PER_KM_EXPRESSWAY,
        mixed: defaults::TOLL_PER_KM_MIXED,
    }
}

fn default_speeds() -> RouteRates {
    RouteRates {
        city: defaults::AVG_SPEED_CITY_KMH,
        highway: defaults::AVG_SPEED_HIGHWAY_KMH,
        expressway: defaults::AVG_SPEED_EXPRESSWAY_KMH,
        mixed: defaults::AVG_SPEED_MIXED_KMH,
    }
}

fn default_light() -> OperationalParams {
    OperationalParams {
        cost_per_km: defaults::LIGHT_COST_PER_KM,
        fuel_per_km: defaults::LIGHT_FUEL_PER_KM,
        driver_cost_per_day: defaults::LIGHT_DRIVER_COST_PER_DAY,
        maintenance_per_km: defaults::LIGHT_MAINTENANCE_PER_KM,
        age_factor: defaults::LIGHT_AGE_FACTOR,
        depreciation_per_km: defaults::LIGHT_DEPRECIATION_PER_KM,
    }
}

fn default_medium() -> OperationalParams {
    OperationalParams {
        cost_per_km: defaults::MEDIUM_COST_PER_KM,
        fuel_per_km: defaults::MEDIUM_FUEL_PER_KM,
        driver_cost_per_day: defaults::MEDIUM_DRIVER_COST_PER_DAY,
        maintenance_per_km: defaults::MEDIUM_MAINTENANCE_PER_KM,
        age_factor: defaults::MEDIUM_AGE_FACTOR,
        depreciation_per_km: defaults::MEDIUM_DEPRECIATION_PER_KM,
    }
}

fn default_heavy() -> OperationalParams {
    OperationalParams {
        cost_per_km: defaults::HEAVY_COST_PER_KM,
        fuel_per_km: defaults::HEAVY_FUEL_PER_KM,
        driver_cost_per_day: defaults::HEAVY_DRIVER_COST_PER_DAY,
        maintenance_per_km: defaults::HEAVY_MAINTENANCE_PER_KM,
        age_factor: defaults::HEAVY_AGE_FACTOR,
        depreciation_per_km: defaults::HEAVY_DEPRECIATION_PER_KM,
    }
}

impl Default for CostTables {
    fn default() -> Self {
        Self {
            fuel_price_per_litre: default_fuel_price(),
            toll_per_km: default_tolls(),
            avg_speed_kmh: default_speeds(),
            light_defaults: default_light(),
            medium_defaults: default_medium(),
            heavy_defaults: default_heavy(),
        }
    }
}

impl CostTables {
    /// Default operational parameters for a truck category.
    pub fn category_defaults(&self, category: TruckCategory) -> OperationalParams {
        match category {
            TruckCategory::Light => self.light_defaults,
            TruckCategory::Medium => self.medium_defaults,
            TruckCategory::Heavy => self.heavy_defaults,
        }
    }

    /// Resolve a snapshot's operational parameters, filling gaps from the
    /// category default table. Always succeeds: defaults exist for every
    /// category.
    pub fn resolve_params(&self, container: &ContainerSnapshot) -> OperationalParams {
        let d = self.category_defaults(container.category);
        OperationalParams {
            cost_per_km: container.cost_per_km.unwrap_or(d.cost_per_km),
            fuel_per_km: container.fuel_per_km.unwrap_or(d.fuel_per_km),
            driver_cost_per_day: container
                .driver_cost_per_day
                .unwrap_or(d.driver_cost_per_day),
            maintenance_per_km: container
                .maintenance_per_km
                .unwrap_or(d.maintenance_per_km),
            age_factor: container.age_factor.unwrap_or(d.age_factor),
            depreciation_per_km: container
                .depreciation_per_km
                .unwrap_or(d.depreciation_per_km),
        }
    }
}

/// Itemised trip cost for one truck over one route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CostBreakdown {
    /// Flat running cost: distance × cost_per_km.
    pub base: f64,
    pub fuel: f64,
    pub tolls: f64,
    pub maintenance: f64,
    pub driver: f64,
    pub depreciation: f64,
    pub total: f64,
}

/// Compute the itemised trip cost for one truck over one route.
///
/// Driver cost bills whole hours (`ceil(distance / avg_speed)`) at one
/// eighth of the daily rate, floored at a full day once the trip reaches a
/// working day's length.
pub fn trip_cost(
    tables: &CostTables,
    container: &ContainerSnapshot,
    route: &RouteDescriptor,
) -> PackResult<CostBreakdown> {
    if !route.distance_km.is_finite() || route.distance_km < 0.0 {
        return Err(PackError::invalid_input(format!(
            "distance_km must be finite and >= 0, got {}",
            route.distance_km
        )));
    }
    let params = tables.resolve_params(container);
    let distance = route.distance_km;

    let base = distance * params.cost_per_km;
    let fuel = distance * params.fuel_per_km * tables.fuel_price_per_litre;
    let tolls = distance * tables.toll_per_km.for_route(route.route_type);
    let maintenance = distance * params.maintenance_per_km * params.age_factor;
    let depreciation = distance * params.depreciation_per_km;

    let speed = tables.avg_speed_kmh.for_route(route.route_type).max(1.0);
    let hours = (distance / speed).ceil();
    let hourly_rate = params.driver_cost_per_day / defaults::DRIVER_DAY_HOURS;
    let mut driver = hours * hourly_rate;
    if hours >= defaults::DRIVER_DAY_HOURS {
        driver = driver.max(params.driver_cost_per_day);
    }

    let total = base + fuel + tolls + maintenance + driver + depreciation;
    Ok(CostBreakdown {
        base,
        fuel,
        tolls,
        maintenance,
        driver,
        depreciation,
        total,
    })
}
