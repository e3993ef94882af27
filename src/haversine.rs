//! Great-circle cost estimation (offline fallback when no routing service
//! is reachable).
//!
//! Straight-line costs ignore the road network, so routes seeded from them
//! are previews, not driving directions. Useful for exercising the ordering
//! heuristics without a provider round-trip and as a sanity reference in
//! tests.

use crate::matrix::{CostMatrix, CostMetric};

/// Average driving speed assumption for time estimation.
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two (lat, lng) points in kilometers.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Offline cost-matrix estimator based on great-circle distance.
///
/// Duration costs assume a constant average speed.
#[derive(Debug, Clone)]
pub struct HaversineMatrix {
    /// Assumed average speed in km/h for duration estimation.
    pub speed_kmh: f64,
}

impl Default for HaversineMatrix {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineMatrix {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Builds a pairwise cost matrix for `points` in the requested metric
    /// (kilometers, or minutes at the assumed speed).
    pub fn cost_matrix(&self, points: &[(f64, f64)], metric: CostMetric) -> CostMatrix {
        CostMatrix::from_fn(points.len(), metric, |from, to| {
            if from == to {
                return 0.0;
            }
            let km = haversine_km(points[from], points[to]);
            match metric {
                CostMetric::Distance => km,
                CostMetric::Duration => km / self.speed_kmh * 60.0,
            }
        })
    }
}
