//! Route optimization pipeline.
//!
//! One call runs a short sequential pipeline: validate stops, fetch the
//! pairwise cost matrix, compute a visitation order, materialize the order
//! into a real route via the provider, aggregate totals. Two network
//! round-trips at most; the ordering in between is pure computation.
//!
//! Ordering is two-pass by design: the nearest-neighbor heuristic produces
//! a usable order locally, and the provider's own optimizer may refine the
//! intermediate waypoint order during materialization. The final stop
//! sequence reflects the provider's refinement, not necessarily the raw
//! heuristic output.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::RoutingError;
use crate::heuristic;
use crate::matrix::CostMetric;
use crate::settings::{CostModel, OptimizationSettings, OptimizationType};
use crate::stop::{Stop, validate_stops};
use crate::traits::{Directions, DirectionsRequest, MatrixOptions, RoutingProvider};

/// Non-fatal conditions observed while building a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RouteWarning {
    /// The requested start stop id was not in the stop list; the first
    /// element anchors the route instead.
    StartFallback { requested_id: String },
    /// The requested end stop id was not in the stop list; the last
    /// element anchors the route instead.
    EndFallback { requested_id: String },
    /// The route is longer than the advisory distance cap.
    MaxDistanceExceeded { limit_km: f64, actual_km: f64 },
    /// The route takes longer than the advisory duration cap.
    MaxDurationExceeded {
        limit_minutes: f64,
        actual_minutes: f64,
    },
}

/// The optimized route returned to callers.
///
/// Fuel and cost figures are derived estimates, not authoritative pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedRoute {
    /// Input stops reordered for visitation.
    pub stops: Vec<Stop>,
    /// Kilometers over all legs.
    pub total_distance: f64,
    /// Minutes, travel plus per-stop dwell time.
    pub total_duration: f64,
    /// Liters, from the configured cost model.
    pub estimated_fuel: f64,
    /// Currency units, from the configured cost model.
    pub estimated_cost: f64,
    /// Opaque encoded path geometry for map rendering.
    pub polyline: String,
    /// Dense (lat, lng) path points, denser than `stops`.
    pub waypoints: Vec<(f64, f64)>,
    /// Anchor fallbacks and advisory-cap overruns observed on the way.
    pub warnings: Vec<RouteWarning>,
}

/// Turns an unordered set of stops into a visitable route.
///
/// The routing provider is injected; a shared `RouteOptimizer` serves
/// concurrent callers because every call owns its matrix and visited set.
#[derive(Debug, Clone)]
pub struct RouteOptimizer<P> {
    provider: P,
    cost_model: CostModel,
}

impl<P: RoutingProvider> RouteOptimizer<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cost_model: CostModel::default(),
        }
    }

    /// Builds an optimizer with deployment-calibrated economic constants.
    pub fn with_cost_model(provider: P, cost_model: CostModel) -> Self {
        Self {
            provider,
            cost_model,
        }
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    /// The injected routing provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Computes a visitation order for `stops` and materializes it into a
    /// renderable route.
    ///
    /// `start`/`end` are matched against `stops` by id; a miss falls back
    /// to the first/last element and is recorded as a [`RouteWarning`].
    /// Passing the same stop as both start and end requests a round trip.
    ///
    /// Provider failures abort the call: a route without real road
    /// geometry is not safe to present as driving directions, so there is
    /// no heuristic-only fallback result.
    pub fn optimize_route(
        &self,
        stops: &[Stop],
        start: Option<&Stop>,
        end: Option<&Stop>,
        settings: &OptimizationSettings,
    ) -> Result<OptimizedRoute, RoutingError> {
        validate_stops(stops)?;
        if settings.optimization_type == OptimizationType::Custom {
            return Err(RoutingError::CustomNotSupported);
        }

        let mut warnings = Vec::new();
        let n = stops.len();

        if n == 1 {
            return Ok(self.single_stop_route(&stops[0]));
        }

        let start_idx = resolve_anchor(stops, start, 0, &mut warnings, true);
        let end_idx = end.map(|e| resolve_anchor(stops, Some(e), n - 1, &mut warnings, false));

        // With two stops there is no ordering decision to make, so the
        // matrix round-trip is skipped entirely.
        let order = if n == 2 {
            vec![start_idx, 1 - start_idx]
        } else {
            let metric = match settings.optimization_type {
                OptimizationType::Distance => CostMetric::Distance,
                _ => CostMetric::Duration,
            };
            let points: Vec<(f64, f64)> = stops.iter().map(Stop::location).collect();
            let matrix = self.provider.travel_matrix(
                &points,
                &MatrixOptions {
                    metric,
                    travel_mode: settings.travel_mode,
                    avoid_tolls: settings.avoid_tolls,
                    avoid_highways: settings.avoid_highways,
                    prefer_main_roads: settings.prefer_main_roads,
                },
            )?;
            heuristic::plan_order(stops, &matrix, settings, start_idx, end_idx)?
        };

        let round_trip = end_idx == Some(start_idx);
        let request = build_directions_request(stops, &order, round_trip, settings, true);
        let directions = self.provider.directions(&request)?;
        let final_order = apply_waypoint_order(&order, &directions.waypoint_order, round_trip)?;
        debug!(stops = n, "route materialized");

        Ok(self.assemble_route(stops, &final_order, directions, settings, warnings))
    }

    /// Re-issues a directions request for an already-optimized route so a
    /// map widget can refresh its geometry. The stop order is preserved
    /// (no provider re-optimization); the optimization pipeline does not
    /// rerun.
    pub fn render_route(
        &self,
        route: &OptimizedRoute,
        settings: &OptimizationSettings,
    ) -> Result<Directions, RoutingError> {
        validate_stops(&route.stops)?;

        if route.stops.len() == 1 {
            return Ok(Directions {
                legs: Vec::new(),
                geometry: String::new(),
                path: vec![route.stops[0].location()],
                waypoint_order: Vec::new(),
            });
        }

        let order: Vec<usize> = (0..route.stops.len()).collect();
        let request = build_directions_request(&route.stops, &order, false, settings, false);
        self.provider.directions(&request)
    }

    fn single_stop_route(&self, stop: &Stop) -> OptimizedRoute {
        let dwell = f64::from(stop.dwell_minutes());
        let fuel = self.cost_model.fuel_liters(0.0);
        OptimizedRoute {
            stops: vec![stop.clone()],
            total_distance: 0.0,
            total_duration: dwell,
            estimated_fuel: fuel,
            estimated_cost: self.cost_model.route_cost(fuel, dwell),
            polyline: String::new(),
            waypoints: vec![stop.location()],
            warnings: Vec::new(),
        }
    }

    fn assemble_route(
        &self,
        stops: &[Stop],
        order: &[usize],
        directions: Directions,
        settings: &OptimizationSettings,
        mut warnings: Vec<RouteWarning>,
    ) -> OptimizedRoute {
        let travel_km: f64 = directions
            .legs
            .iter()
            .map(|leg| leg.distance_meters)
            .sum::<f64>()
            / 1000.0;
        let travel_minutes: f64 = directions
            .legs
            .iter()
            .map(|leg| leg.duration_seconds)
            .sum::<f64>()
            / 60.0;
        let dwell_minutes: f64 = stops.iter().map(|s| f64::from(s.dwell_minutes())).sum();
        let total_duration = travel_minutes + dwell_minutes;

        let estimated_fuel = self.cost_model.fuel_liters(travel_km);
        let estimated_cost = self.cost_model.route_cost(estimated_fuel, total_duration);

        if let Some(limit_km) = settings.max_route_distance {
            if travel_km > limit_km {
                warn!(limit_km, actual_km = travel_km, "route exceeds distance cap");
                warnings.push(RouteWarning::MaxDistanceExceeded {
                    limit_km,
                    actual_km: travel_km,
                });
            }
        }
        if let Some(limit_minutes) = settings.max_route_duration {
            if total_duration > limit_minutes {
                warn!(
                    limit_minutes,
                    actual_minutes = total_duration,
                    "route exceeds duration cap"
                );
                warnings.push(RouteWarning::MaxDurationExceeded {
                    limit_minutes,
                    actual_minutes: total_duration,
                });
            }
        }

        OptimizedRoute {
            stops: order.iter().map(|&i| stops[i].clone()).collect(),
            total_distance: travel_km,
            total_duration,
            estimated_fuel,
            estimated_cost,
            polyline: directions.geometry,
            waypoints: directions.path,
            warnings,
        }
    }
}

/// Finds the anchor stop by id, falling back to `fallback_idx` with a
/// recorded warning when the id is not present.
fn resolve_anchor(
    stops: &[Stop],
    anchor: Option<&Stop>,
    fallback_idx: usize,
    warnings: &mut Vec<RouteWarning>,
    is_start: bool,
) -> usize {
    let Some(anchor) = anchor else {
        return fallback_idx;
    };
    match stops.iter().position(|stop| stop.id == anchor.id) {
        Some(idx) => idx,
        None => {
            warn!(
                requested_id = %anchor.id,
                fallback_idx,
                "anchor stop not in stop list, using positional fallback"
            );
            warnings.push(if is_start {
                RouteWarning::StartFallback {
                    requested_id: anchor.id.clone(),
                }
            } else {
                RouteWarning::EndFallback {
                    requested_id: anchor.id.clone(),
                }
            });
            fallback_idx
        }
    }
}

/// Builds the materialization request for `order`.
///
/// For a round trip the destination returns to the origin and every other
/// stop rides as an intermediate waypoint.
fn build_directions_request(
    stops: &[Stop],
    order: &[usize],
    round_trip: bool,
    settings: &OptimizationSettings,
    optimize_waypoints: bool,
) -> DirectionsRequest {
    let origin = stops[order[0]].location();
    let (destination, middles) = if round_trip {
        (origin, &order[1..])
    } else {
        (stops[order[order.len() - 1]].location(), &order[1..order.len() - 1])
    };

    DirectionsRequest {
        origin,
        destination,
        waypoints: middles.iter().map(|&i| stops[i].location()).collect(),
        optimize_waypoints,
        travel_mode: settings.travel_mode,
        avoid_tolls: settings.avoid_tolls,
        avoid_highways: settings.avoid_highways,
        prefer_main_roads: settings.prefer_main_roads,
    }
}

/// Applies the provider's realized waypoint order to the heuristic order.
///
/// `waypoint_order[k]` is the index (into the submitted middles) of the
/// k-th visited waypoint; anything else is a malformed provider response.
fn apply_waypoint_order(
    order: &[usize],
    waypoint_order: &[usize],
    round_trip: bool,
) -> Result<Vec<usize>, RoutingError> {
    let middles: &[usize] = if round_trip {
        &order[1..]
    } else {
        &order[1..order.len() - 1]
    };

    if waypoint_order.len() != middles.len() {
        return Err(RoutingError::Parse(format!(
            "provider returned {} waypoint positions for {} waypoints",
            waypoint_order.len(),
            middles.len()
        )));
    }

    let mut seen = vec![false; middles.len()];
    let mut final_order = Vec::with_capacity(order.len());
    final_order.push(order[0]);
    for &submitted in waypoint_order {
        if submitted >= middles.len() || seen[submitted] {
            return Err(RoutingError::Parse(
                "provider waypoint order is not a permutation".to_string(),
            ));
        }
        seen[submitted] = true;
        final_order.push(middles[submitted]);
    }
    if !round_trip {
        final_order.push(order[order.len() - 1]);
    }
    Ok(final_order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waypoint_order_reorders_middles() {
        // Heuristic order 0,2,3,1 with fixed ends 0 and 1; provider visits
        // middle 3 before middle 2.
        let final_order = apply_waypoint_order(&[0, 2, 3, 1], &[1, 0], false).expect("valid");
        assert_eq!(final_order, vec![0, 3, 2, 1]);
    }

    #[test]
    fn identity_waypoint_order_preserves_heuristic_order() {
        let final_order = apply_waypoint_order(&[0, 2, 3, 1], &[0, 1], false).expect("valid");
        assert_eq!(final_order, vec![0, 2, 3, 1]);
    }

    #[test]
    fn round_trip_keeps_all_but_origin_as_middles() {
        let final_order = apply_waypoint_order(&[0, 1, 2], &[1, 0], true).expect("valid");
        assert_eq!(final_order, vec![0, 2, 1]);
    }

    #[test]
    fn non_permutation_waypoint_order_is_rejected() {
        assert!(apply_waypoint_order(&[0, 1, 2, 3], &[0, 0], false).is_err());
        assert!(apply_waypoint_order(&[0, 1, 2, 3], &[0], false).is_err());
        assert!(apply_waypoint_order(&[0, 1, 2, 3], &[0, 5], false).is_err());
    }
}
