//! Data models

pub mod telemetry;
pub mod prediction;

pub use telemetry::*;
pub use prediction::*;
