//! Trend Analyzer
//!
//! Statistical analysis of single sensor streams, rolled up across a fleet.
//!
//! ## Architecture
//!
//! - **statistics**: summary statistics, 68/95 normality check, OLS trend
//! - **anomaly**: IQR, z-score and sliding-window detectors merged by timestamp
//! - **seasonality**: autocorrelation at daily / weekly / shift / maintenance periods
//! - **forecast**: seasonal, linear or exponential-smoothing forecast with intervals
//! - **correlation**: stream alignment, Pearson r, lag scan, causality heuristic
//! - **analyzer**: store reads and orchestration for one stream
//! - **fleet**: concurrent per-asset analysis, ranking and fleet verdict
//!
//! The analyzer has no dependency on the RUL engine.

mod analyzer;
mod anomaly;
mod correlation;
mod fleet;
mod forecast;
mod seasonality;
mod statistics;

pub use analyzer::{TrendAnalyzer, TrendOptions};
pub use anomaly::{anomaly_level, detect_anomalies};
pub use correlation::{align_streams, causality_of, correlate, lag_scan, strength_of};
pub use fleet::fleet_risk;
pub use forecast::forecast;
pub use seasonality::{autocorrelation, detect_seasonality, mean_interval_hours};
pub use statistics::{linear_trend, normality, summarize};
