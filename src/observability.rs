//! Injected observability for the engines
//!
//! Engines hold an `Arc<dyn EngineObserver>` handed to them at construction
//! instead of reaching for process-wide logging or counter state. The default
//! [`TracingObserver`] forwards events to `tracing`; [`CountingObserver`] keeps
//! atomic counters for hosts that export telemetry.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::AnalyticsError;
use crate::store::OrgId;
use crate::types::{DegradationRecord, RulPrediction, TrendAnalysisResult};

/// Domain events emitted by the RUL engine and the trend analyzer.
///
/// All methods default to no-ops so implementors only handle what they need.
pub trait EngineObserver: Send + Sync {
    fn rul_computed(&self, _org: &OrgId, _prediction: &RulPrediction) {}

    fn unknown_equipment(&self, _org: &OrgId, _equipment_id: &str) {}

    fn degradation_recorded(&self, _org: &OrgId, _record: &DegradationRecord) {}

    fn trend_analyzed(&self, _org: &OrgId, _result: &TrendAnalysisResult) {}

    fn insufficient_data(
        &self,
        _org: &OrgId,
        _equipment_id: &str,
        _sensor_type: &str,
        _available: usize,
        _needed: usize,
    ) {
    }

    /// An asset was dropped from a batch or fleet run
    fn asset_skipped(&self, _org: &OrgId, _equipment_id: &str, _error: &AnalyticsError) {}
}

/// Structured `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl EngineObserver for TracingObserver {
    fn rul_computed(&self, org: &OrgId, prediction: &RulPrediction) {
        info!(
            org = %org,
            equipment_id = %prediction.equipment_id,
            remaining_days = prediction.remaining_days,
            risk = %prediction.risk_level,
            method = %prediction.prediction_method,
            confidence = prediction.confidence_score,
            "RUL computed"
        );
    }

    fn unknown_equipment(&self, org: &OrgId, equipment_id: &str) {
        debug!(org = %org, equipment_id = %equipment_id, "Unknown equipment, no RUL prediction");
    }

    fn degradation_recorded(&self, org: &OrgId, record: &DegradationRecord) {
        debug!(
            org = %org,
            equipment_id = %record.equipment_id,
            component = %record.component_type,
            metric = record.degradation_metric,
            rate = record.degradation_rate,
            "Degradation recorded"
        );
    }

    fn trend_analyzed(&self, org: &OrgId, result: &TrendAnalysisResult) {
        info!(
            org = %org,
            equipment_id = %result.equipment_id,
            sensor_type = %result.sensor_type,
            samples = result.statistical_summary.sample_count,
            anomaly_rate = result.anomaly_detection.anomaly_rate,
            trend = %result.statistical_summary.trend.direction,
            "Trend analysis complete"
        );
    }

    fn insufficient_data(
        &self,
        org: &OrgId,
        equipment_id: &str,
        sensor_type: &str,
        available: usize,
        needed: usize,
    ) {
        debug!(
            org = %org,
            equipment_id = %equipment_id,
            sensor_type = %sensor_type,
            available,
            needed,
            "Not enough samples for trend analysis"
        );
    }

    fn asset_skipped(&self, org: &OrgId, equipment_id: &str, error: &AnalyticsError) {
        warn!(org = %org, equipment_id = %equipment_id, error = %error, "Asset skipped");
    }
}

/// Snapshot of [`CountingObserver`] counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverCounts {
    pub rul_computed: u64,
    pub unknown_equipment: u64,
    pub degradation_recorded: u64,
    pub trend_analyzed: u64,
    pub insufficient_data: u64,
    pub assets_skipped: u64,
}

/// Lock-free event counters
#[derive(Debug, Default)]
pub struct CountingObserver {
    rul_computed: AtomicU64,
    unknown_equipment: AtomicU64,
    degradation_recorded: AtomicU64,
    trend_analyzed: AtomicU64,
    insufficient_data: AtomicU64,
    assets_skipped: AtomicU64,
}

impl CountingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ObserverCounts {
        ObserverCounts {
            rul_computed: self.rul_computed.load(Ordering::Relaxed),
            unknown_equipment: self.unknown_equipment.load(Ordering::Relaxed),
            degradation_recorded: self.degradation_recorded.load(Ordering::Relaxed),
            trend_analyzed: self.trend_analyzed.load(Ordering::Relaxed),
            insufficient_data: self.insufficient_data.load(Ordering::Relaxed),
            assets_skipped: self.assets_skipped.load(Ordering::Relaxed),
        }
    }
}

impl EngineObserver for CountingObserver {
    fn rul_computed(&self, _org: &OrgId, _prediction: &RulPrediction) {
        self.rul_computed.fetch_add(1, Ordering::Relaxed);
    }

    fn unknown_equipment(&self, _org: &OrgId, _equipment_id: &str) {
        self.unknown_equipment.fetch_add(1, Ordering::Relaxed);
    }

    fn degradation_recorded(&self, _org: &OrgId, _record: &DegradationRecord) {
        self.degradation_recorded.fetch_add(1, Ordering::Relaxed);
    }

    fn trend_analyzed(&self, _org: &OrgId, _result: &TrendAnalysisResult) {
        self.trend_analyzed.fetch_add(1, Ordering::Relaxed);
    }

    fn insufficient_data(
        &self,
        _org: &OrgId,
        _equipment_id: &str,
        _sensor_type: &str,
        _available: usize,
        _needed: usize,
    ) {
        self.insufficient_data.fetch_add(1, Ordering::Relaxed);
    }

    fn asset_skipped(&self, _org: &OrgId, _equipment_id: &str, _error: &AnalyticsError) {
        self.assets_skipped.fetch_add(1, Ordering::Relaxed);
    }
}
