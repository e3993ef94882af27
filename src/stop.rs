//! Stop model: a geographic point of interest to visit.

use serde::{Deserialize, Serialize};

use crate::error::RoutingError;

/// Dwell time assumed when a stop does not specify one, in minutes.
pub const DEFAULT_DWELL_MINUTES: u32 = 30;

/// Visit priority, rank 1 (high) to 3 (low).
///
/// Serialized as its integer rank so stop records coming from dashboard
/// forms or database rows deserialize directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Integer rank as used in stop records (1 = high, 3 = low).
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    /// Edge-cost multiplier applied by balanced ordering. High-priority
    /// stops look cheaper to reach, so the tour visits them earlier.
    pub fn weight(self) -> f64 {
        match self {
            Priority::High => 0.7,
            Priority::Medium => 1.0,
            Priority::Low => 1.3,
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(rank: u8) -> Result<Self, Self::Error> {
        match rank {
            1 => Ok(Priority::High),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::Low),
            other => Err(format!("priority rank must be 1..=3, got {other}")),
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> u8 {
        priority.rank()
    }
}

/// A point of interest to visit on a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Stable unique identifier within one optimization call.
    pub id: String,
    pub name: String,
    pub address: String,
    /// WGS84 decimal degrees, -90..=90.
    pub latitude: f64,
    /// WGS84 decimal degrees, -180..=180.
    pub longitude: f64,
    /// Minutes spent at the stop; `None` means [`DEFAULT_DWELL_MINUTES`].
    #[serde(default)]
    pub estimated_duration: Option<u32>,
    /// Visit priority; `None` means medium.
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl Stop {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            latitude,
            longitude,
            estimated_duration: None,
            priority: None,
        }
    }

    /// Location as a (lat, lng) pair.
    pub fn location(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// Dwell time in minutes, defaulted when unspecified.
    pub fn dwell_minutes(&self) -> u32 {
        self.estimated_duration.unwrap_or(DEFAULT_DWELL_MINUTES)
    }

    /// Priority, defaulted to medium when unspecified.
    pub fn effective_priority(&self) -> Priority {
        self.priority.unwrap_or_default()
    }
}

/// Validate a stop list ahead of optimization.
///
/// Runs before any network activity so a malformed list never costs a
/// provider round-trip.
pub fn validate_stops(stops: &[Stop]) -> Result<(), RoutingError> {
    if stops.is_empty() {
        return Err(RoutingError::InvalidStops(
            "at least one stop is required".to_string(),
        ));
    }

    for stop in stops {
        if !stop.latitude.is_finite() || !stop.longitude.is_finite() {
            return Err(RoutingError::InvalidStops(format!(
                "stop {} has non-finite coordinates",
                stop.id
            )));
        }
        if !(-90.0..=90.0).contains(&stop.latitude) {
            return Err(RoutingError::InvalidStops(format!(
                "stop {} latitude {} outside -90..=90",
                stop.id, stop.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&stop.longitude) {
            return Err(RoutingError::InvalidStops(format!(
                "stop {} longitude {} outside -180..=180",
                stop.id, stop.longitude
            )));
        }
    }

    Ok(())
}
