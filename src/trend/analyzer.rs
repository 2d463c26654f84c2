//! Trend Analyzer
//!
//! Fetches one sensor stream for a time window and runs the full analysis
//! suite over it: summary statistics, anomaly ensemble, seasonality, forecast
//! and (optionally) correlation against the asset's other sensors.

use std::sync::Arc;

use chrono::Duration;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::{FleetConfig, TrendConfig};
use crate::error::AnalyticsError;
use crate::observability::{EngineObserver, TracingObserver};
use crate::store::{OrgId, PrognosticsStore};
use crate::types::{SensorCorrelation, SensorSample, TimeRange, TrendAnalysisResult};

use super::anomaly::detect_anomalies;
use super::correlation::{correlate, rank_correlations};
use super::forecast::forecast;
use super::seasonality::detect_seasonality;
use super::statistics::summarize;

/// Per-call options for [`TrendAnalyzer::analyze_equipment_trends_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendOptions {
    /// Look-back window; the configured default when `None`
    pub hours: Option<u32>,
    pub include_correlations: bool,
}

impl Default for TrendOptions {
    fn default() -> Self {
        Self {
            hours: None,
            include_correlations: true,
        }
    }
}

pub struct TrendAnalyzer {
    pub(super) store: Arc<dyn PrognosticsStore>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) observer: Arc<dyn EngineObserver>,
    pub(super) config: TrendConfig,
    pub(super) fleet_config: FleetConfig,
}

impl TrendAnalyzer {
    pub fn new(store: Arc<dyn PrognosticsStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            observer: Arc::new(TracingObserver),
            config: TrendConfig::default(),
            fleet_config: FleetConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn EngineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_config(mut self, config: TrendConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_fleet_config(mut self, fleet_config: FleetConfig) -> Self {
        self.fleet_config = fleet_config;
        self
    }

    /// Full analysis of one sensor stream, correlations included
    pub async fn analyze_equipment_trends(
        &self,
        org: &OrgId,
        equipment_id: &str,
        sensor_type: &str,
        hours: Option<u32>,
    ) -> Result<TrendAnalysisResult, AnalyticsError> {
        self.analyze_equipment_trends_with(
            org,
            equipment_id,
            sensor_type,
            TrendOptions {
                hours,
                include_correlations: true,
            },
        )
        .await
    }

    pub async fn analyze_equipment_trends_with(
        &self,
        org: &OrgId,
        equipment_id: &str,
        sensor_type: &str,
        options: TrendOptions,
    ) -> Result<TrendAnalysisResult, AnalyticsError> {
        let hours = options.hours.unwrap_or(self.config.default_window_hours);
        let end = self.clock.now();
        let start = end
            .checked_sub_signed(Duration::hours(i64::from(hours)))
            .ok_or_else(|| AnalyticsError::InvalidMeasurement {
                field: "hours".to_string(),
                reason: format!("a {hours} hour window reaches outside the representable time range"),
            })?;
        let time_range = TimeRange { start, end };

        let samples = self
            .fetch_sorted(org, equipment_id, sensor_type, &time_range)
            .await?;

        let needed = self.config.min_samples;
        if samples.len() < needed {
            self.observer
                .insufficient_data(org, equipment_id, sensor_type, samples.len(), needed);
            return Err(AnalyticsError::insufficient(
                format!("trend analysis of {equipment_id}/{sensor_type}"),
                needed,
                samples.len(),
            ));
        }

        debug!(
            equipment_id = %equipment_id,
            sensor_type = %sensor_type,
            samples = samples.len(),
            hours,
            "Analyzing sensor trend"
        );

        let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
        let statistical_summary = summarize(&values, &self.config);
        let anomaly_detection = detect_anomalies(&samples, &statistical_summary, &self.config);
        let seasonality = detect_seasonality(&samples, &self.config);
        let forecasting = forecast(&samples, &statistical_summary, &seasonality, &self.config);

        let correlations = if options.include_correlations {
            self.correlations(org, equipment_id, sensor_type, &samples, &time_range)
                .await?
        } else {
            Vec::new()
        };

        let result = TrendAnalysisResult {
            equipment_id: equipment_id.to_string(),
            sensor_type: sensor_type.to_string(),
            time_range,
            statistical_summary,
            anomaly_detection,
            forecasting,
            seasonality,
            correlations,
        };

        self.observer.trend_analyzed(org, &result);
        Ok(result)
    }

    /// Samples in the window, stable-sorted by timestamp
    async fn fetch_sorted(
        &self,
        org: &OrgId,
        equipment_id: &str,
        sensor_type: &str,
        range: &TimeRange,
    ) -> Result<Vec<SensorSample>, AnalyticsError> {
        let mut samples = self
            .store
            .get_telemetry_history(org, equipment_id, sensor_type, range.start, range.end)
            .await?;
        samples.sort_by_key(|s| s.timestamp);
        Ok(samples)
    }

    async fn correlations(
        &self,
        org: &OrgId,
        equipment_id: &str,
        sensor_type: &str,
        primary: &[SensorSample],
        range: &TimeRange,
    ) -> Result<Vec<SensorCorrelation>, AnalyticsError> {
        let sensor_types = self.store.get_equipment_sensor_types(org, equipment_id).await?;

        let mut correlations = Vec::new();
        for other_type in sensor_types.iter().filter(|t| t.as_str() != sensor_type) {
            let other = self.fetch_sorted(org, equipment_id, other_type, range).await?;
            if let Some(c) = correlate(sensor_type, primary, other_type, &other, &self.config) {
                correlations.push(c);
            }
        }
        rank_correlations(&mut correlations);
        Ok(correlations)
    }
}
