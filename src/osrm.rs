//! OSRM HTTP adapter for the routing-provider interface.
//!
//! Talks to an `osrm-routed` instance over HTTP: `/table` for pairwise
//! cost matrices, `/trip` for multi-stop routes with provider-side waypoint
//! re-optimization, `/route` when the order is fixed. OSRM reports a
//! per-request `code` distinct from transport failures, which maps onto the
//! crate's provider/timeout/network error split.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::RoutingError;
use crate::matrix::{CostMatrix, CostMetric};
use crate::polyline::Polyline;
use crate::settings::TravelMode;
use crate::traits::{Directions, DirectionsRequest, MatrixOptions, RouteLeg, RoutingProvider};

/// OSRM profile names per travel mode.
///
/// Profiles are dataset-defined; these defaults match the stock
/// `osrm-backend` lua profiles. There is no stock transit profile, so
/// `transit` stays unset unless a deployment provides one.
#[derive(Debug, Clone)]
pub struct ModeProfiles {
    pub driving: String,
    pub walking: String,
    pub bicycling: String,
    pub transit: Option<String>,
}

impl Default for ModeProfiles {
    fn default() -> Self {
        Self {
            driving: "car".to_string(),
            walking: "foot".to_string(),
            bicycling: "bicycle".to_string(),
            transit: None,
        }
    }
}

/// Connection settings for an OSRM service.
///
/// `prefer_main_roads` from the optimization settings has no OSRM
/// equivalent and is ignored by this adapter.
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profiles: ModeProfiles,
    /// Connect and request deadline for every call.
    pub timeout: Duration,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profiles: ModeProfiles::default(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl OsrmConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_profiles(mut self, profiles: ModeProfiles) -> Self {
        self.profiles = profiles;
        self
    }
}

/// Routing provider backed by an OSRM HTTP service.
#[derive(Debug, Clone)]
pub struct OsrmProvider {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmProvider {
    /// Builds the provider, failing fast when the HTTP client cannot be
    /// constructed.
    pub fn new(config: OsrmConfig) -> Result<Self, RoutingError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|err| RoutingError::Configuration(err.to_string()))?;

        Ok(Self { config, client })
    }

    fn profile_for(&self, mode: TravelMode) -> Result<&str, RoutingError> {
        match mode {
            TravelMode::Driving => Ok(&self.config.profiles.driving),
            TravelMode::Walking => Ok(&self.config.profiles.walking),
            TravelMode::Bicycling => Ok(&self.config.profiles.bicycling),
            TravelMode::Transit => self
                .config
                .profiles
                .transit
                .as_deref()
                .ok_or(RoutingError::UnsupportedMode(TravelMode::Transit)),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, RoutingError> {
        debug!(url, "osrm request");
        let timeout_secs = self.config.timeout.as_secs();

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| transport_error(&err, url, timeout_secs))?
            .error_for_status()
            .map_err(|err| transport_error(&err, url, timeout_secs))?;

        response.json::<T>().map_err(|err| {
            if err.is_decode() {
                RoutingError::Parse(err.to_string())
            } else {
                transport_error(&err, url, timeout_secs)
            }
        })
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }
}

/// Formats (lat, lng) points as the `lng,lat;lng,lat` path segment OSRM
/// expects.
fn coords_path(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(lat, lng)| format!("{lng:.6},{lat:.6}"))
        .collect::<Vec<_>>()
        .join(";")
}

/// Builds the `exclude=` value for the avoidance flags, if any apply.
fn exclude_param(avoid_tolls: bool, avoid_highways: bool) -> Option<String> {
    let mut classes = Vec::new();
    if avoid_tolls {
        classes.push("toll");
    }
    if avoid_highways {
        classes.push("motorway");
    }
    if classes.is_empty() {
        None
    } else {
        Some(classes.join(","))
    }
}

fn transport_error(err: &reqwest::Error, url: &str, timeout_secs: u64) -> RoutingError {
    if err.is_timeout() {
        return RoutingError::Timeout {
            url: url.to_string(),
            timeout_secs,
        };
    }
    if let Some(status) = err.status() {
        return RoutingError::Provider {
            code: format!("HTTP {}", status.as_u16()),
            message: err.to_string(),
        };
    }
    RoutingError::Network {
        url: url.to_string(),
        message: err.to_string(),
    }
}

impl RoutingProvider for OsrmProvider {
    fn travel_matrix(
        &self,
        points: &[(f64, f64)],
        options: &MatrixOptions,
    ) -> Result<CostMatrix, RoutingError> {
        if points.is_empty() {
            return Err(RoutingError::InvalidStops(
                "at least one point is required".to_string(),
            ));
        }

        let profile = self.profile_for(options.travel_mode)?;
        let mut url = format!(
            "{}/table/v1/{}/{}?annotations=duration,distance",
            self.base(),
            profile,
            coords_path(points)
        );
        if let Some(exclude) = exclude_param(options.avoid_tolls, options.avoid_highways) {
            url.push_str("&exclude=");
            url.push_str(&exclude);
        }

        let body: TableResponse = self.get_json(&url)?;
        convert_table(body, options.metric, points.len())
    }

    fn directions(&self, request: &DirectionsRequest) -> Result<Directions, RoutingError> {
        let profile = self.profile_for(request.travel_mode)?;

        let mut points = Vec::with_capacity(request.waypoints.len() + 2);
        points.push(request.origin);
        points.extend_from_slice(&request.waypoints);
        points.push(request.destination);

        let exclude = exclude_param(request.avoid_tolls, request.avoid_highways);
        let geometry_args = "geometries=polyline&overview=full&steps=false";

        if request.optimize_waypoints && !request.waypoints.is_empty() {
            let mut url = format!(
                "{}/trip/v1/{}/{}?roundtrip=false&source=first&destination=last&{}",
                self.base(),
                profile,
                coords_path(&points),
                geometry_args
            );
            if let Some(exclude) = &exclude {
                url.push_str("&exclude=");
                url.push_str(exclude);
            }
            let body: TripResponse = self.get_json(&url)?;
            convert_trip(body, request.waypoints.len())
        } else {
            let mut url = format!(
                "{}/route/v1/{}/{}?{}",
                self.base(),
                profile,
                coords_path(&points),
                geometry_args
            );
            if let Some(exclude) = &exclude {
                url.push_str("&exclude=");
                url.push_str(exclude);
            }
            let body: RouteResponse = self.get_json(&url)?;
            convert_route(body, request.waypoints.len())
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types and conversions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TableResponse {
    code: String,
    message: Option<String>,
    durations: Option<Vec<Vec<Option<f64>>>>,
    distances: Option<Vec<Vec<Option<f64>>>>,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct TripResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    trips: Vec<OsrmRoute>,
    #[serde(default)]
    waypoints: Vec<TripWaypoint>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: String,
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    /// Meters.
    distance: f64,
    /// Seconds.
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct TripWaypoint {
    /// Position of this input coordinate in the optimized visit order.
    waypoint_index: usize,
}

fn check_status(code: &str, message: Option<String>) -> Result<(), RoutingError> {
    if code == "Ok" {
        Ok(())
    } else {
        Err(RoutingError::Provider {
            code: code.to_string(),
            message: message.unwrap_or_default(),
        })
    }
}

/// Converts a table response to a cost matrix in the requested metric.
///
/// Null, negative, or non-finite cells mean "no route between this pair"
/// and become `+infinity`; the whole request still succeeds.
fn convert_table(
    body: TableResponse,
    metric: CostMetric,
    expected: usize,
) -> Result<CostMatrix, RoutingError> {
    check_status(&body.code, body.message)?;

    let (cells, label) = match metric {
        CostMetric::Distance => (body.distances, "distances"),
        CostMetric::Duration => (body.durations, "durations"),
    };
    let cells = cells.ok_or_else(|| {
        RoutingError::Parse(format!("table response missing {label} annotation"))
    })?;

    if cells.len() != expected {
        return Err(RoutingError::Parse(format!(
            "table response has {} rows for {} points",
            cells.len(),
            expected
        )));
    }

    let rows: Vec<Vec<f64>> = cells
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| match cell {
                    Some(value) if value.is_finite() && value >= 0.0 => match metric {
                        CostMetric::Distance => value / 1000.0,
                        CostMetric::Duration => value / 60.0,
                    },
                    _ => f64::INFINITY,
                })
                .collect()
        })
        .collect();

    CostMatrix::from_rows(rows, metric)
        .ok_or_else(|| RoutingError::Parse("table response rows are not square".to_string()))
}

fn convert_legs(legs: Vec<OsrmLeg>) -> Vec<RouteLeg> {
    legs.into_iter()
        .map(|leg| RouteLeg {
            distance_meters: leg.distance,
            duration_seconds: leg.duration,
        })
        .collect()
}

fn decode_geometry(geometry: &str) -> Result<Vec<(f64, f64)>, RoutingError> {
    Polyline::from_encoded(geometry)
        .map(Polyline::into_points)
        .ok_or_else(|| RoutingError::Parse("undecodable route geometry".to_string()))
}

/// Converts a trip response, recovering the provider's realized order of
/// the submitted intermediate waypoints.
fn convert_trip(body: TripResponse, middle_count: usize) -> Result<Directions, RoutingError> {
    check_status(&body.code, body.message)?;

    let trip = body
        .trips
        .into_iter()
        .next()
        .ok_or_else(|| RoutingError::Parse("trip response contains no trips".to_string()))?;

    // The waypoints array parallels the input coordinates: origin, the
    // middles in submitted order, destination. `waypoint_index` is each
    // coordinate's position in the optimized tour.
    if body.waypoints.len() != middle_count + 2 {
        return Err(RoutingError::Parse(format!(
            "trip response has {} waypoints for {} input coordinates",
            body.waypoints.len(),
            middle_count + 2
        )));
    }

    let mut middles: Vec<(usize, usize)> = body
        .waypoints
        .iter()
        .enumerate()
        .skip(1)
        .take(middle_count)
        .map(|(input_pos, waypoint)| (waypoint.waypoint_index, input_pos - 1))
        .collect();
    middles.sort_unstable_by_key(|&(visit_pos, _)| visit_pos);
    let waypoint_order: Vec<usize> = middles.into_iter().map(|(_, middle)| middle).collect();

    let path = decode_geometry(&trip.geometry)?;
    Ok(Directions {
        legs: convert_legs(trip.legs),
        geometry: trip.geometry,
        path,
        waypoint_order,
    })
}

/// Converts a fixed-order route response; the waypoint order is identity.
fn convert_route(body: RouteResponse, middle_count: usize) -> Result<Directions, RoutingError> {
    check_status(&body.code, body.message)?;

    let route = body
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| RoutingError::Parse("route response contains no routes".to_string()))?;

    let path = decode_geometry(&route.geometry)?;
    Ok(Directions {
        legs: convert_legs(route.legs),
        geometry: route.geometry,
        path,
        waypoint_order: (0..middle_count).collect(),
    })
}
