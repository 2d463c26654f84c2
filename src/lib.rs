//! Fleet Prognostics: predictive maintenance core
//!
//! Remaining-useful-life estimation and sensor trend analysis for a fleet of
//! mechanical assets (engines, pumps, compressors, generators).
//!
//! ## Architecture
//!
//! - **RUL Engine**: degradation trend fit, ML reconciliation, health index,
//!   hysteresis risk classification, maintenance recommendations
//! - **Trend Analyzer**: summary statistics, anomaly ensemble, forecasting,
//!   seasonality, cross-sensor correlation, fleet ranking
//! - **Store**: tenant-scoped read interface the host system implements
//!
//! The core owns no persistence or network concerns. Results are plain data.

pub mod clock;
pub mod config;
pub mod error;
pub mod observability;
pub mod rul;
pub mod stats;
pub mod store;
pub mod trend;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, EngineConfig, FleetConfig, RulConfig, TrendConfig};

// Re-export engines
pub use rul::RulEngine;
pub use trend::{TrendAnalyzer, TrendOptions};

// Re-export store access
pub use store::{InMemoryStore, OrgId, PrognosticsStore, StoreError};

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::AnalyticsError;
pub use observability::{CountingObserver, EngineObserver, ObserverCounts, TracingObserver};

// Re-export commonly used types
pub use types::{
    DegradationMetrics, DegradationRecord, EquipmentRecord, FailurePrediction,
    FleetTrendSummary, ModelMetadata, PredictionMethod, RiskLevel, RulPrediction, SensorSample,
    TrendAnalysisResult,
};
