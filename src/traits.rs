//! Routing-provider abstraction.
//!
//! The optimizer never talks to a mapping service directly: it goes through
//! [`RoutingProvider`], injected at construction. Tests substitute scripted
//! doubles; production wires in [`crate::osrm::OsrmProvider`]. No global or
//! lazily initialized client state exists anywhere in the crate, so
//! concurrent optimization calls cannot interfere with each other.

use serde::{Deserialize, Serialize};

use crate::error::RoutingError;
use crate::matrix::{CostMatrix, CostMetric};
use crate::settings::TravelMode;

/// Options for a pairwise travel-cost request.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixOptions {
    pub metric: CostMetric,
    pub travel_mode: TravelMode,
    pub avoid_tolls: bool,
    pub avoid_highways: bool,
    /// Not every provider has an equivalent; adapters may ignore it.
    pub prefer_main_roads: bool,
}

/// One leg between consecutive route points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

/// A multi-stop directions request.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsRequest {
    /// (lat, lng) of the first route point.
    pub origin: (f64, f64),
    /// (lat, lng) of the last route point.
    pub destination: (f64, f64),
    /// Intermediate waypoints visited between origin and destination,
    /// (lat, lng) each, in the requested order.
    pub waypoints: Vec<(f64, f64)>,
    /// Allow the provider's own optimizer to reorder the intermediate
    /// waypoints for a better route.
    pub optimize_waypoints: bool,
    pub travel_mode: TravelMode,
    pub avoid_tolls: bool,
    pub avoid_highways: bool,
    /// Not every provider has an equivalent; adapters may ignore it.
    pub prefer_main_roads: bool,
}

/// A materialized route returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directions {
    /// One leg per consecutive pair of route points, in visit order.
    pub legs: Vec<RouteLeg>,
    /// Opaque encoded path geometry, suitable for map widgets.
    pub geometry: String,
    /// Dense decoded path points, (lat, lng) each.
    pub path: Vec<(f64, f64)>,
    /// Realized visit order of the submitted intermediate waypoints:
    /// `waypoint_order[k]` is the index into
    /// [`DirectionsRequest::waypoints`] of the k-th visited waypoint.
    /// Identity when the provider did not reorder.
    pub waypoint_order: Vec<usize>,
}

/// External mapping/directions service.
///
/// Both operations report per-request status distinct from transport
/// failure: a single unreachable pair becomes an `+infinity` matrix cell and
/// the call succeeds, while a rejected or failed request surfaces as an
/// error and aborts the optimization.
pub trait RoutingProvider {
    /// Pairwise travel costs between all `points` (lat, lng), as an n×n
    /// matrix in the unit selected by [`MatrixOptions::metric`].
    fn travel_matrix(
        &self,
        points: &[(f64, f64)],
        options: &MatrixOptions,
    ) -> Result<CostMatrix, RoutingError>;

    /// Turn-by-turn route through origin, waypoints, and destination.
    fn directions(&self, request: &DirectionsRequest) -> Result<Directions, RoutingError>;
}
