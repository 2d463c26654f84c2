//! Shared data structures for the prognostics core
//!
//! - `telemetry`: records read from the external store (samples, degradation
//!   history, ML predictions, equipment and model metadata)
//! - `rul`: RUL engine outputs (RulPrediction, ComponentHealthStatus, RiskLevel)
//! - `trend`: trend analyzer outputs (TrendAnalysisResult, FleetTrendSummary)
//!
//! Outputs are plain data; callers decide how to persist or transmit them.

mod telemetry;
mod rul;
mod trend;

pub use telemetry::*;
pub use rul::*;
pub use trend::*;
