//! Stop builders and a scripted routing-provider double.

use std::cell::RefCell;

use route_optimizer::error::RoutingError;
use route_optimizer::haversine::HaversineMatrix;
use route_optimizer::matrix::CostMatrix;
use route_optimizer::stop::{Priority, Stop};
use route_optimizer::traits::{
    Directions, DirectionsRequest, MatrixOptions, RouteLeg, RoutingProvider,
};

/// Builder for test stops with sensible defaults.
pub fn stop(id: &str, latitude: f64, longitude: f64) -> Stop {
    Stop::new(id, format!("Stop {id}"), format!("{id} street"), latitude, longitude)
}

pub fn stop_with_priority(id: &str, latitude: f64, longitude: f64, priority: Priority) -> Stop {
    let mut stop = stop(id, latitude, longitude);
    stop.priority = Some(priority);
    stop
}

/// Four stops on the corners of a 1°×1° square near the equator, listed
/// in perimeter order: a(0,0), b(0,1), c(1,1), d(1,0).
pub fn square_stops() -> Vec<Stop> {
    vec![
        stop("a", 0.0, 0.0),
        stop("b", 0.0, 1.0),
        stop("c", 1.0, 1.0),
        stop("d", 1.0, 0.0),
    ]
}

enum MatrixBehavior {
    /// Great-circle costs computed from the requested points.
    Euclidean,
    /// A pre-scripted matrix, returned verbatim.
    Fixed(CostMatrix),
    /// Whole-request provider failure.
    Fail,
}

/// Scripted [`RoutingProvider`] double.
///
/// Counts calls so tests can assert which network round-trips happened,
/// and captures the last directions request for inspection.
pub struct FakeProvider {
    matrix: MatrixBehavior,
    fail_directions: bool,
    reorder: Option<Vec<usize>>,
    leg_km: f64,
    leg_minutes: f64,
    pub matrix_calls: RefCell<usize>,
    pub directions_calls: RefCell<usize>,
    pub last_directions_request: RefCell<Option<DirectionsRequest>>,
}

impl FakeProvider {
    /// Provider with great-circle costs and synthetic 1 km / 2 min legs.
    pub fn euclidean() -> Self {
        Self {
            matrix: MatrixBehavior::Euclidean,
            fail_directions: false,
            reorder: None,
            leg_km: 1.0,
            leg_minutes: 2.0,
            matrix_calls: RefCell::new(0),
            directions_calls: RefCell::new(0),
            last_directions_request: RefCell::new(None),
        }
    }

    pub fn with_matrix(matrix: CostMatrix) -> Self {
        Self {
            matrix: MatrixBehavior::Fixed(matrix),
            ..Self::euclidean()
        }
    }

    /// Provider whose matrix request fails outright.
    pub fn failing_matrix() -> Self {
        Self {
            matrix: MatrixBehavior::Fail,
            ..Self::euclidean()
        }
    }

    /// Make the directions request fail.
    pub fn fail_directions(mut self) -> Self {
        self.fail_directions = true;
        self
    }

    /// Script the provider-side waypoint re-optimization: the realized
    /// visit order of the submitted intermediate waypoints.
    pub fn reorder_waypoints(mut self, order: Vec<usize>) -> Self {
        self.reorder = Some(order);
        self
    }

    /// Synthetic per-leg distance and duration for the directions stage.
    pub fn with_leg_costs(mut self, leg_km: f64, leg_minutes: f64) -> Self {
        self.leg_km = leg_km;
        self.leg_minutes = leg_minutes;
        self
    }
}

impl RoutingProvider for FakeProvider {
    fn travel_matrix(
        &self,
        points: &[(f64, f64)],
        options: &MatrixOptions,
    ) -> Result<CostMatrix, RoutingError> {
        *self.matrix_calls.borrow_mut() += 1;
        match &self.matrix {
            MatrixBehavior::Euclidean => {
                Ok(HaversineMatrix::default().cost_matrix(points, options.metric))
            }
            MatrixBehavior::Fixed(matrix) => Ok(matrix.clone()),
            MatrixBehavior::Fail => Err(RoutingError::Provider {
                code: "UNAVAILABLE".to_string(),
                message: "scripted matrix failure".to_string(),
            }),
        }
    }

    fn directions(&self, request: &DirectionsRequest) -> Result<Directions, RoutingError> {
        *self.directions_calls.borrow_mut() += 1;
        *self.last_directions_request.borrow_mut() = Some(request.clone());

        if self.fail_directions {
            return Err(RoutingError::Provider {
                code: "NoRoute".to_string(),
                message: "scripted directions failure".to_string(),
            });
        }

        let waypoint_order: Vec<usize> = match &self.reorder {
            Some(order) => order.clone(),
            None => (0..request.waypoints.len()).collect(),
        };

        let mut path = Vec::with_capacity(request.waypoints.len() + 2);
        path.push(request.origin);
        for &submitted in &waypoint_order {
            path.push(request.waypoints[submitted]);
        }
        path.push(request.destination);

        let legs = vec![
            RouteLeg {
                distance_meters: self.leg_km * 1000.0,
                duration_seconds: self.leg_minutes * 60.0,
            };
            path.len() - 1
        ];

        Ok(Directions {
            legs,
            geometry: "scripted-geometry".to_string(),
            path,
            waypoint_order,
        })
    }
}
