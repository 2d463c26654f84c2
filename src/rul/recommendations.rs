//! Maintenance recommendation text for a RUL prediction
//!
//! Order: risk urgency, unhealthy components, flagged critical metrics, then a
//! single line for erratic or accelerating degradation. Duplicates are dropped
//! and the list is capped.

use crate::config::RulConfig;
use crate::types::{
    ComponentHealthStatus, CriticalMetric, DegradationPattern, EquipmentKind, RiskLevel,
};

fn urgency(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::Critical => {
            "URGENT: Schedule immediate maintenance - failure risk is critical"
        }
        RiskLevel::High => "Schedule maintenance within the next 7 days",
        RiskLevel::Medium => "Plan maintenance within the next 30 days",
        RiskLevel::Low => "Continue routine monitoring",
    }
}

fn metric_action(metric: CriticalMetric, component: &str, kind: EquipmentKind) -> String {
    match metric {
        CriticalMetric::Vibration if kind == EquipmentKind::Pump => format!(
            "High vibration on {component}: check alignment, bearing condition and pump cavitation"
        ),
        CriticalMetric::Vibration => {
            format!("High vibration on {component}: check alignment and bearing condition")
        }
        CriticalMetric::Temperature => {
            format!("Elevated temperature on {component}: inspect cooling system")
        }
        CriticalMetric::OilCondition => {
            format!("Degraded oil on {component}: schedule oil change")
        }
        CriticalMetric::WearParticles => {
            format!("High wear particle count on {component}: inspect for internal wear")
        }
    }
}

pub fn build_recommendations(
    risk: RiskLevel,
    components: &[ComponentHealthStatus],
    governing: Option<&DegradationPattern>,
    kind: EquipmentKind,
    config: &RulConfig,
) -> Vec<String> {
    let mut lines: Vec<String> = vec![urgency(risk).to_string()];

    for component in components
        .iter()
        .filter(|c| c.health_score < config.component_unhealthy_below)
    {
        lines.push(format!(
            "Inspect {} - health score {:.0}%",
            component.component_type, component.health_score
        ));
    }

    for component in components {
        for metric in &component.critical_metrics {
            lines.push(metric_action(*metric, &component.component_type, kind));
        }
    }

    if let Some(pattern) = governing {
        if pattern.acceleration > config.acceleration_warning
            || pattern.volatility > config.volatility_warning
        {
            lines.push(format!(
                "Degradation of {} is accelerating or erratic - increase monitoring frequency",
                pattern.component_type
            ));
        }
    }

    let mut unique: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        if !unique.contains(&line) {
            unique.push(line);
        }
    }
    unique.truncate(config.max_recommendations);
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(name: &str, health: f64, metrics: Vec<CriticalMetric>) -> ComponentHealthStatus {
        ComponentHealthStatus {
            component_type: name.to_string(),
            health_score: health,
            degradation_metric: 100.0 - health,
            degradation_rate: 0.5,
            predicted_failure_days: 10.0,
            confidence: 0.5,
            critical_metrics: metrics,
        }
    }

    #[test]
    fn test_order_and_content() {
        let components = vec![
            component("bearing", 30.0, vec![CriticalMetric::Vibration]),
            component("seal", 80.0, vec![CriticalMetric::OilCondition]),
        ];
        let recs = build_recommendations(
            RiskLevel::High,
            &components,
            None,
            EquipmentKind::Pump,
            &RulConfig::default(),
        );
        assert_eq!(recs[0], "Schedule maintenance within the next 7 days");
        assert_eq!(recs[1], "Inspect bearing - health score 30%");
        assert!(recs[2].contains("cavitation"));
        assert!(recs[3].contains("oil change"));
        assert_eq!(recs.len(), 4);
    }

    #[test]
    fn test_capped_at_six() {
        let all = vec![
            CriticalMetric::Vibration,
            CriticalMetric::Temperature,
            CriticalMetric::OilCondition,
            CriticalMetric::WearParticles,
        ];
        let components = vec![
            component("bearing", 10.0, all.clone()),
            component("gearbox", 20.0, all),
        ];
        let recs = build_recommendations(
            RiskLevel::Critical,
            &components,
            None,
            EquipmentKind::Engine,
            &RulConfig::default(),
        );
        assert_eq!(recs.len(), 6);
        assert!(recs[0].starts_with("URGENT"));
    }

    #[test]
    fn test_erratic_degradation_line() {
        let pattern = DegradationPattern {
            component_type: "rotor".to_string(),
            sample_count: 10,
            slope_per_sample: 1.0,
            degradation_per_day: 1.0,
            latest_value: 50.0,
            time_to_failure_days: Some(50.0),
            r_squared: 0.4,
            volatility: 7.5,
            acceleration: 0.0,
            confidence: 0.1,
        };
        let recs = build_recommendations(
            RiskLevel::Low,
            &[],
            Some(&pattern),
            EquipmentKind::Generator,
            &RulConfig::default(),
        );
        assert_eq!(recs.len(), 2);
        assert!(recs[1].contains("accelerating or erratic"));
    }
}
