//! Polyline representation for route geometries.
//!
//! Route geometry travels as a compact encoded string (the precision-5
//! polyline format OSRM and most map widgets speak). Internally we work with
//! decoded coordinate sequences; decoding happens here, at the provider
//! boundary, and the encoded string is passed through untouched for
//! rendering.

use serde::{Deserialize, Serialize};

/// A route geometry as decoded coordinates.
///
/// Each point is a (latitude, longitude) pair in decimal degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    /// Creates a polyline from already-decoded coordinate points.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Decodes a precision-5 encoded polyline string.
    ///
    /// Returns `None` when the string is truncated or contains bytes
    /// outside the encoding alphabet.
    pub fn from_encoded(encoded: &str) -> Option<Self> {
        let bytes = encoded.as_bytes();
        let mut points = Vec::new();
        let mut cursor = 0;
        let mut lat: i64 = 0;
        let mut lng: i64 = 0;

        while cursor < bytes.len() {
            let (delta_lat, next) = decode_component(bytes, cursor)?;
            let (delta_lng, next) = decode_component(bytes, next)?;
            lat += delta_lat;
            lng += delta_lng;
            cursor = next;
            points.push((lat as f64 * 1e-5, lng as f64 * 1e-5));
        }

        Some(Self { points })
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }
}

/// Decodes one varint-encoded signed component starting at `cursor`.
fn decode_component(bytes: &[u8], mut cursor: usize) -> Option<(i64, usize)> {
    let mut accumulator: i64 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = *bytes.get(cursor)?;
        if !(63..=126).contains(&byte) {
            return None;
        }
        let chunk = (byte - 63) as i64;
        accumulator |= (chunk & 0x1f) << shift;
        cursor += 1;
        if chunk & 0x20 == 0 {
            break;
        }
        shift += 5;
        if shift > 60 {
            return None;
        }
    }

    let value = if accumulator & 1 != 0 {
        !(accumulator >> 1)
    } else {
        accumulator >> 1
    };
    Some((value, cursor))
}
