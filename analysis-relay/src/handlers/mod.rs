//! HTTP handlers for the analysis relay.

pub mod analyze;
pub mod health;
pub mod metrics;

pub use analyze::analyze_video;
pub use health::{health_check, readiness_check};
