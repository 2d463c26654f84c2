//! Fleet Trend Roll-up
//!
//! Analyzes the first few primary sensor streams of every asset concurrently
//! (correlations skipped), scores each asset, ranks the fleet and derives a
//! maintenance-risk verdict.
//!
//! ## Per-asset risk score (0-100)
//! ```text
//! 50 × min(1, anomaly_rate / 0.30) + 30 × min(1, cv / 0.50) + 20 × volatile_trend_fraction
//! ```
//! Fleet health is `100 - mean risk score`.
//!
//! A failing asset is reported to the observer and skipped; it never aborts
//! the batch.

use futures::future::join_all;
use tracing::info;

use crate::config::FleetConfig;
use crate::error::AnalyticsError;
use crate::stats::{clamp_percent, mean};
use crate::store::OrgId;
use crate::types::{
    EquipmentRanking, FleetAggregatedMetrics, FleetRecommendation, FleetTrendSummary,
    RecommendationPriority, RiskLevel, TrendAnalysisResult, TrendDirection,
};

use super::analyzer::{TrendAnalyzer, TrendOptions};

/// Per-asset figures feeding the ranking
#[derive(Debug, Clone)]
struct AssetTrend {
    equipment_id: String,
    sensors: Vec<String>,
    anomaly_rate: f64,
    volatility: f64,
    volatile_streams: usize,
}

impl AssetTrend {
    fn from_results(equipment_id: &str, results: &[TrendAnalysisResult]) -> Self {
        let rates: Vec<f64> = results.iter().map(|r| r.anomaly_detection.anomaly_rate).collect();
        let cvs: Vec<f64> = results
            .iter()
            .map(|r| r.statistical_summary.coefficient_of_variation())
            .collect();
        Self {
            equipment_id: equipment_id.to_string(),
            sensors: results.iter().map(|r| r.sensor_type.clone()).collect(),
            anomaly_rate: mean(&rates),
            volatility: mean(&cvs),
            volatile_streams: results
                .iter()
                .filter(|r| r.statistical_summary.trend.direction == TrendDirection::Volatile)
                .count(),
        }
    }

    fn volatile_fraction(&self) -> f64 {
        if self.sensors.is_empty() {
            0.0
        } else {
            self.volatile_streams as f64 / self.sensors.len() as f64
        }
    }

    /// (anomaly, volatility, trend) contributions to the risk score
    fn contributions(&self, config: &FleetConfig) -> (f64, f64, f64) {
        (
            config.anomaly_weight * (self.anomaly_rate / config.anomaly_rate_scale).min(1.0),
            config.volatility_weight * (self.volatility / config.volatility_scale).min(1.0),
            config.trend_penalty_weight * self.volatile_fraction(),
        )
    }

    fn risk_score(&self, config: &FleetConfig) -> f64 {
        let (a, v, t) = self.contributions(config);
        clamp_percent(a + v + t)
    }

    fn primary_concern(&self, config: &FleetConfig) -> String {
        let (a, v, t) = self.contributions(config);
        if a + v + t < 1.0 {
            "No significant concerns".to_string()
        } else if a >= v && a >= t {
            format!("Anomaly rate {:.1}%", self.anomaly_rate * 100.0)
        } else if v >= t {
            format!("High variability (CV {:.2})", self.volatility)
        } else {
            format!(
                "Erratic trend on {} of {} sensors",
                self.volatile_streams,
                self.sensors.len()
            )
        }
    }
}

impl TrendAnalyzer {
    /// Fleet-wide trend summary for one tenant
    pub async fn analyze_fleet_trends(
        &self,
        org: &OrgId,
        equipment_ids: &[String],
        hours: Option<u32>,
    ) -> FleetTrendSummary {
        let outcomes = join_all(
            equipment_ids
                .iter()
                .map(|id| async move { (id, self.analyze_asset(org, id, hours).await) }),
        )
        .await;

        let mut assets = Vec::with_capacity(outcomes.len());
        let mut skipped = 0usize;
        for (id, outcome) in outcomes {
            match outcome {
                Ok(asset) => assets.push(asset),
                Err(e) => {
                    skipped += 1;
                    self.observer.asset_skipped(org, id, &e);
                }
            }
        }

        let summary = summarize_fleet(assets, skipped, self.clock.now(), &self.fleet_config);
        info!(
            org = %org,
            analyzed = summary.aggregated_metrics.equipment_analyzed,
            skipped,
            fleet_health = summary.aggregated_metrics.fleet_health_score,
            risk = %summary.aggregated_metrics.maintenance_risk,
            "Fleet trend analysis complete"
        );
        summary
    }

    /// Analyze the first primary sensors of one asset.
    ///
    /// Streams with too little data are skipped; any other error fails the asset.
    async fn analyze_asset(
        &self,
        org: &OrgId,
        equipment_id: &str,
        hours: Option<u32>,
    ) -> Result<AssetTrend, AnalyticsError> {
        let sensor_types = self.store.get_equipment_sensor_types(org, equipment_id).await?;
        let options = TrendOptions {
            hours,
            include_correlations: false,
        };

        let mut results = Vec::new();
        let mut last_insufficient = None;
        for sensor_type in sensor_types.iter().take(self.fleet_config.sensors_per_equipment) {
            match self
                .analyze_equipment_trends_with(org, equipment_id, sensor_type, options)
                .await
            {
                Ok(result) => results.push(result),
                Err(e) if e.is_insufficient_data() => last_insufficient = Some(e),
                Err(e) => return Err(e),
            }
        }

        if results.is_empty() {
            return Err(last_insufficient.unwrap_or_else(|| {
                AnalyticsError::NotFound(format!("no sensor streams for {equipment_id}"))
            }));
        }
        Ok(AssetTrend::from_results(equipment_id, &results))
    }
}

/// Maintenance-risk verdict from the mean anomaly rate and fleet health
pub fn fleet_risk(anomaly_rate: f64, health: f64, config: &FleetConfig) -> RiskLevel {
    if anomaly_rate > config.critical_anomaly_rate || health < config.critical_health_score {
        RiskLevel::Critical
    } else if anomaly_rate > config.high_anomaly_rate || health < config.high_health_score {
        RiskLevel::High
    } else if anomaly_rate > config.medium_anomaly_rate || health < config.medium_health_score {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn summarize_fleet(
    assets: Vec<AssetTrend>,
    skipped: usize,
    generated_at: chrono::DateTime<chrono::Utc>,
    config: &FleetConfig,
) -> FleetTrendSummary {
    let mut scored: Vec<(f64, AssetTrend)> = assets
        .into_iter()
        .map(|a| (a.risk_score(config), a))
        .collect();
    scored.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| a.1.equipment_id.cmp(&b.1.equipment_id))
    });

    let rates: Vec<f64> = scored.iter().map(|(_, a)| a.anomaly_rate).collect();
    let cvs: Vec<f64> = scored.iter().map(|(_, a)| a.volatility).collect();
    let scores: Vec<f64> = scored.iter().map(|(s, _)| *s).collect();
    let total_streams: usize = scored.iter().map(|(_, a)| a.sensors.len()).sum();
    let volatile_streams: usize = scored.iter().map(|(_, a)| a.volatile_streams).sum();

    let average_anomaly_rate = mean(&rates);
    let fleet_health_score = clamp_percent(100.0 - mean(&scores));
    let maintenance_risk = fleet_risk(average_anomaly_rate, fleet_health_score, config);

    let aggregated_metrics = FleetAggregatedMetrics {
        equipment_analyzed: scored.len(),
        equipment_skipped: skipped,
        average_anomaly_rate,
        average_volatility: mean(&cvs),
        trend_stability: if total_streams == 0 {
            1.0
        } else {
            1.0 - volatile_streams as f64 / total_streams as f64
        },
        fleet_health_score,
        maintenance_risk,
    };

    let recommendations = recommendations(&scored, maintenance_risk, config);

    let equipment_rankings = scored
        .into_iter()
        .enumerate()
        .map(|(i, (risk_score, asset))| EquipmentRanking {
            rank: i + 1,
            primary_concern: asset.primary_concern(config),
            volatile_trend_fraction: asset.volatile_fraction(),
            equipment_id: asset.equipment_id,
            risk_score,
            anomaly_rate: asset.anomaly_rate,
            volatility: asset.volatility,
            sensors_analyzed: asset.sensors,
        })
        .collect();

    FleetTrendSummary {
        generated_at,
        aggregated_metrics,
        equipment_rankings,
        recommendations,
    }
}

fn recommendations(
    ranked: &[(f64, AssetTrend)],
    risk: RiskLevel,
    config: &FleetConfig,
) -> Vec<FleetRecommendation> {
    let mut out = Vec::new();

    for (_, asset) in ranked {
        if asset.anomaly_rate > config.urgent_anomaly_rate {
            out.push(FleetRecommendation {
                priority: RecommendationPriority::Urgent,
                equipment_id: Some(asset.equipment_id.clone()),
                message: format!(
                    "Schedule urgent maintenance for {}: anomaly rate {:.1}%",
                    asset.equipment_id,
                    asset.anomaly_rate * 100.0
                ),
            });
        }
    }

    for (_, asset) in ranked {
        if asset.volatility > config.monitoring_volatility {
            out.push(FleetRecommendation {
                priority: RecommendationPriority::High,
                equipment_id: Some(asset.equipment_id.clone()),
                message: format!(
                    "Increase monitoring frequency for {}: sensor variability is high (CV {:.2})",
                    asset.equipment_id, asset.volatility
                ),
            });
        }
    }

    if risk >= RiskLevel::High {
        out.push(FleetRecommendation {
            priority: RecommendationPriority::Medium,
            equipment_id: None,
            message: format!("Review fleet-wide maintenance strategy: fleet maintenance risk is {risk}"),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn asset(id: &str, rate: f64, cv: f64, volatile: usize, sensors: usize) -> AssetTrend {
        AssetTrend {
            equipment_id: id.to_string(),
            sensors: (0..sensors).map(|i| format!("s{i}")).collect(),
            anomaly_rate: rate,
            volatility: cv,
            volatile_streams: volatile,
        }
    }

    #[test]
    fn test_risk_score_weights() {
        let config = FleetConfig::default();
        // 25 (half anomaly scale) + 30 (saturated cv) + 10 (half volatile)
        let a = asset("a", 0.15, 0.9, 1, 2);
        assert!((a.risk_score(&config) - 65.0).abs() < 1e-9);
        assert!(asset("b", 0.0, 0.0, 0, 2).risk_score(&config).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fleet_risk_breakpoints() {
        let config = FleetConfig::default();
        assert_eq!(fleet_risk(0.01, 95.0, &config), RiskLevel::Low);
        assert_eq!(fleet_risk(0.06, 95.0, &config), RiskLevel::Medium);
        assert_eq!(fleet_risk(0.01, 55.0, &config), RiskLevel::High);
        assert_eq!(fleet_risk(0.31, 95.0, &config), RiskLevel::Critical);
        assert_eq!(fleet_risk(0.0, 39.0, &config), RiskLevel::Critical);
    }

    #[test]
    fn test_ranking_and_recommendations() {
        let config = FleetConfig::default();
        let now = Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap();
        let summary = summarize_fleet(
            vec![
                asset("quiet", 0.0, 0.01, 0, 2),
                asset("noisy", 0.4, 0.6, 2, 2),
                asset("wobbly", 0.02, 0.3, 0, 2),
            ],
            1,
            now,
            &config,
        );

        let ids: Vec<_> = summary
            .equipment_rankings
            .iter()
            .map(|r| r.equipment_id.as_str())
            .collect();
        assert_eq!(ids, vec!["noisy", "wobbly", "quiet"]);
        assert_eq!(summary.equipment_rankings[0].rank, 1);
        assert!((summary.equipment_rankings[0].risk_score - 100.0).abs() < 1e-9);
        assert_eq!(summary.aggregated_metrics.equipment_skipped, 1);
        assert_eq!(summary.aggregated_metrics.equipment_analyzed, 3);

        let priorities: Vec<_> = summary.recommendations.iter().map(|r| r.priority).collect();
        assert_eq!(
            priorities,
            vec![
                RecommendationPriority::Urgent,
                RecommendationPriority::High,
                RecommendationPriority::High,
                RecommendationPriority::Medium,
            ]
        );
        assert!(summary.recommendations[3].equipment_id.is_none());
    }

    #[test]
    fn test_empty_fleet_is_healthy() {
        let now = Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap();
        let summary = summarize_fleet(Vec::new(), 2, now, &FleetConfig::default());
        assert!((summary.aggregated_metrics.fleet_health_score - 100.0).abs() < f64::EPSILON);
        assert_eq!(summary.aggregated_metrics.maintenance_risk, RiskLevel::Low);
        assert!(summary.equipment_rankings.is_empty());
    }
}
