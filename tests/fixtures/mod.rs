//! Test fixtures for route-optimizer.
//!
//! Provides stop builders and a scripted routing-provider double with
//! call counting, shared by the integration-style tests.

pub mod stops;

pub use stops::*;
