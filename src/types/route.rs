//! Route descriptor consumed by the cost model.

use serde::{Deserialize, Serialize};

use crate::error::{PackError, PackResult};

/// Road class of the trip; selects toll and average-speed table rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteType {
    City,
    Highway,
    Expressway,
    Mixed,
}

impl RouteType {
    /// Stable identifier used in fingerprints and persisted plans.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::City => "city",
            Self::Highway => "highway",
            Self::Expressway => "expressway",
            Self::Mixed => "mixed",
        }
    }
}

impl std::fmt::Display for RouteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trip description supplied with every pack request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    /// One-way trip distance in kilometres.
    pub distance_km: f64,
    /// Road class driving toll and speed assumptions.
    pub route_type: RouteType,
    /// Optional delivery region tag (consolidation key component).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl RouteDescriptor {
    /// Route with no region tag.
    pub fn new(distance_km: f64, route_type: RouteType) -> Self {
        Self {
            distance_km,
            route_type,
            region: None,
        }
    }

    /// Reject negative distances.
    pub fn validate(&self) -> PackResult<()> {
        if !self.distance_km.is_finite() || self.distance_km < 0.0 {
            return Err(PackError::invalid_input(format!(
                "distance_km must be finite and >= 0, got {}",
                self.distance_km
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_distance_rejected() {
        let route = RouteDescriptor::new(-1.0, RouteType::Highway);
        assert!(route.validate().is_err());
    }

    #[test]
    fn zero_distance_accepted() {
        let route = RouteDescriptor::new(0.0, RouteType::City);
        assert!(route.validate().is_ok());
    }
}
