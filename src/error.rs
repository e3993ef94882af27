//! Error taxonomy for route optimization.
//!
//! Provider and transport failures abort the whole optimization; there is no
//! silent degradation to a heuristic-only route. Unreachable stop pairs are
//! not errors at all: they travel through the cost matrix as `+infinity`.

use thiserror::Error;

use crate::settings::TravelMode;

#[derive(Debug, Error)]
pub enum RoutingError {
    /// The provider client could not be constructed. Fatal, not retried.
    #[error("routing provider configuration failed: {0}")]
    Configuration(String),

    /// The provider answered with a non-success status for the whole request.
    #[error("routing provider rejected the request ({code}): {message}")]
    Provider { code: String, message: String },

    /// The request exceeded the configured deadline. Distinct from a
    /// provider rejection so callers can retry differently.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// Transport-level failure before any provider status was received.
    #[error("network failure talking to {url}: {message}")]
    Network { url: String, message: String },

    /// The provider responded with a payload we could not decode.
    #[error("could not parse provider response: {0}")]
    Parse(String),

    /// The stop list violates a precondition (empty, bad coordinates).
    #[error("invalid stop list: {0}")]
    InvalidStops(String),

    /// `OptimizationType::Custom` carries no defined semantics.
    #[error("optimization type `custom` is not supported; use distance, time, or balanced")]
    CustomNotSupported,

    /// The requested travel mode has no routing profile configured.
    #[error("no routing profile configured for travel mode {0:?}")]
    UnsupportedMode(TravelMode),
}
