//! Engine Configuration Module
//!
//! Every tunable constant of the RUL engine and trend analyzer lives in
//! [`EngineConfig`], loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `PROGNOSTICS_CONFIG` environment variable (path to TOML file)
//! 2. `prognostics.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The config is passed into each engine at construction; there is no global:
//!
//! ```ignore
//! let config = EngineConfig::load();
//! let rul = RulEngine::new(store.clone()).with_config(config.rul.clone());
//! let trends = TrendAnalyzer::new(store)
//!     .with_config(config.trend)
//!     .with_fleet_config(config.fleet);
//! ```

mod engine_config;

pub use engine_config::*;
