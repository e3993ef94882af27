//! Optimization preferences and the economic cost model.

use serde::{Deserialize, Serialize};

/// Cost metric and tie-break strategy for the ordering stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationType {
    /// Order by pairwise distance (kilometers).
    Distance,
    /// Order by pairwise travel time (minutes).
    Time,
    /// Travel time scaled by per-stop priority weights.
    Balanced,
    /// Reserved; rejected with [`crate::error::RoutingError::CustomNotSupported`].
    Custom,
}

/// Transport mode passed through to the routing provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TravelMode {
    Driving,
    Walking,
    Transit,
    Bicycling,
}

/// Per-call optimization preferences.
///
/// `max_route_distance` / `max_route_duration` are advisory: the heuristics
/// do not enforce them, but a result exceeding a cap carries a
/// [`crate::optimizer::RouteWarning`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSettings {
    pub optimization_type: OptimizationType,
    pub avoid_tolls: bool,
    pub avoid_highways: bool,
    /// Accepted for parity with provider options; adapters without an
    /// equivalent flag ignore it.
    pub prefer_main_roads: bool,
    /// Advisory cap in kilometers.
    #[serde(default)]
    pub max_route_distance: Option<f64>,
    /// Advisory cap in minutes.
    #[serde(default)]
    pub max_route_duration: Option<f64>,
    pub travel_mode: TravelMode,
    /// When the number of freely orderable stops is at most this value, an
    /// exact branch-and-bound search replaces the greedy pass. Zero disables
    /// the exact path. Search cost grows factorially; values above ~12 are
    /// impractical.
    #[serde(default)]
    pub exact_search_limit: usize,
}

impl Default for OptimizationSettings {
    fn default() -> Self {
        Self {
            optimization_type: OptimizationType::Balanced,
            avoid_tolls: false,
            avoid_highways: false,
            prefer_main_roads: false,
            max_route_distance: None,
            max_route_duration: None,
            travel_mode: TravelMode::Driving,
            exact_search_limit: 0,
        }
    }
}

impl OptimizationSettings {
    pub fn new(optimization_type: OptimizationType) -> Self {
        Self {
            optimization_type,
            ..Self::default()
        }
    }
}

/// Economic constants for fuel and monetary estimates.
///
/// The defaults reproduce the illustrative constants of the original design;
/// deployments needing real pricing inject their own calibrated values via
/// [`crate::optimizer::RouteOptimizer::with_cost_model`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Average fuel consumption, liters per 100 km.
    pub fuel_consumption_l_per_100km: f64,
    /// Fuel price per liter, in caller currency units.
    pub fuel_price_per_liter: f64,
    /// Value of one hour of route time, in caller currency units.
    pub hourly_time_value: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            fuel_consumption_l_per_100km: 8.5,
            fuel_price_per_liter: 1.5,
            hourly_time_value: 25.0,
        }
    }
}

impl CostModel {
    /// Fuel burned over `distance_km`, in liters.
    pub fn fuel_liters(&self, distance_km: f64) -> f64 {
        distance_km / 100.0 * self.fuel_consumption_l_per_100km
    }

    /// Monetary route cost: fuel plus time value.
    pub fn route_cost(&self, fuel_liters: f64, duration_minutes: f64) -> f64 {
        fuel_liters * self.fuel_price_per_liter + duration_minutes / 60.0 * self.hourly_time_value
    }
}
