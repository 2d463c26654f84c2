//! Synthetic Fleet Simulation
//!
//! Seeds an in-memory store with a synthetic fleet and runs both engines over
//! it. Each asset gets:
//! - hourly vibration / temperature / pressure streams with a daily cycle,
//!   Gaussian noise and occasional spikes
//! - 30 days of daily degradation records for two components
//! - for every third asset, an ML failure prediction with model metadata
//!
//! Prints batch RUL predictions and the fleet trend summary as JSON.
//!
//! # Usage
//! ```bash
//! ./fleet-sim --assets 8 --hours 168 --seed 42 > fleet.json
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use tracing::info;

use fleet_prognostics::types::{DataQualityTier, FailurePrediction, ModelMetadata};
use fleet_prognostics::{
    DegradationRecord, EngineConfig, EquipmentRecord, FleetTrendSummary, InMemoryStore, OrgId,
    RulEngine, RulPrediction, SensorSample, TrendAnalyzer,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "fleet-sim")]
#[command(about = "Synthetic fleet simulation for the prognostics engines")]
#[command(version = "1.0")]
struct Args {
    /// Number of assets in the fleet
    #[arg(short, long, default_value = "6", value_parser = clap::value_parser!(u32).range(1..=500))]
    assets: u32,

    /// Telemetry history per sensor in hours
    #[arg(short = 'H', long, default_value = "168", value_parser = clap::value_parser!(u32).range(10..=2160))]
    hours: u32,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Engine configuration file (TOML)
    #[arg(short, long, env = "PROGNOSTICS_CONFIG")]
    config: Option<PathBuf>,

    /// Organization the synthetic fleet belongs to
    #[arg(long, default_value = "demo-org")]
    org: String,
}

// ============================================================================
// Fleet Generation
// ============================================================================

const EQUIPMENT_TYPES: [&str; 4] = ["engine", "pump", "compressor", "generator"];

/// (sensor, unit, baseline, daily amplitude, noise std-dev)
const SENSORS: [(&str, &str, f64, f64, f64); 3] = [
    ("vibration", "mm/s", 4.0, 0.6, 0.15),
    ("temperature", "C", 65.0, 4.0, 0.8),
    ("pressure", "bar", 8.0, 0.3, 0.1),
];

const COMPONENTS: [&str; 2] = ["bearing", "seal"];

/// Probability that an hourly sample is a spike
const SPIKE_PROBABILITY: f64 = 0.01;

struct FleetGenerator {
    rng: StdRng,
    now: DateTime<Utc>,
    hours: u32,
}

impl FleetGenerator {
    fn sensor_stream(
        &mut self,
        baseline: f64,
        amplitude: f64,
        noise_std: f64,
        unit: &str,
        wear: f64,
    ) -> Result<Vec<SensorSample>> {
        let noise = Normal::new(0.0, noise_std).context("invalid noise std-dev")?;
        let hours = i64::from(self.hours);
        let mut samples = Vec::with_capacity(self.hours as usize);

        for h in 0..hours {
            let timestamp = self.now - Duration::hours(hours - h);
            let cycle = amplitude * (2.0 * std::f64::consts::PI * h as f64 / 24.0).sin();
            let drift = wear * baseline * h as f64 / hours as f64;
            let mut value = baseline + cycle + drift + noise.sample(&mut self.rng);
            if self.rng.gen_bool(SPIKE_PROBABILITY) {
                value += baseline * self.rng.gen_range(0.5..1.5);
            }
            samples.push(SensorSample::new(timestamp, value, unit));
        }
        Ok(samples)
    }

    fn degradation_history(&mut self, equipment_id: &str, component: &str) -> Vec<DegradationRecord> {
        let start = self.rng.gen_range(5.0..45.0);
        let rate = self.rng.gen_range(0.2..2.5);
        let mut previous: Option<(DateTime<Utc>, f64)> = None;
        let mut records = Vec::with_capacity(30);

        for day in 0..30i64 {
            let timestamp = self.now - Duration::days(29 - day);
            let metric = (start + rate * day as f64 + self.rng.gen_range(-0.5..0.5)).clamp(0.0, 100.0);
            let degradation_rate = previous.map_or(0.0, |(t, m)| {
                let days = (timestamp - t).num_seconds() as f64 / 86_400.0;
                if days > 0.0 {
                    (metric - m) / days
                } else {
                    0.0
                }
            });
            previous = Some((timestamp, metric));

            records.push(DegradationRecord {
                equipment_id: equipment_id.to_string(),
                component_type: component.to_string(),
                timestamp,
                degradation_metric: metric,
                vibration_level: Some(3.0 + metric / 10.0),
                temperature: Some(55.0 + metric / 3.0),
                oil_condition: Some(100.0 - metric * 0.7),
                wear_particle_count: Some(metric * 12.0),
                degradation_rate,
            });
        }
        records
    }
}

async fn seed_fleet(
    store: &InMemoryStore,
    org: &OrgId,
    args: &Args,
    now: DateTime<Utc>,
) -> Result<Vec<String>> {
    let mut generator = FleetGenerator {
        rng: args
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64),
        now,
        hours: args.hours,
    };
    let mut ids = Vec::with_capacity(args.assets as usize);

    for i in 0..args.assets as usize {
        let equipment_type = EQUIPMENT_TYPES[i % EQUIPMENT_TYPES.len()];
        let equipment_id = format!("{equipment_type}-{i:03}");
        store
            .insert_equipment(org, EquipmentRecord::new(&equipment_id, equipment_type))
            .await;

        let wear = generator.rng.gen_range(0.0..0.3);
        for (sensor, unit, baseline, amplitude, noise) in SENSORS {
            let samples = generator.sensor_stream(baseline, amplitude, noise, unit, wear)?;
            store.insert_samples(org, &equipment_id, sensor, samples).await;
        }

        for component in COMPONENTS {
            let history = generator.degradation_history(&equipment_id, component);
            store.insert_degradation_records(org, history).await;
        }

        if i % 3 == 0 {
            let model_id = format!("lstm-{equipment_type}");
            store
                .insert_failure_prediction(
                    org,
                    FailurePrediction {
                        equipment_id: equipment_id.clone(),
                        prediction_timestamp: now - Duration::hours(6),
                        failure_probability: generator.rng.gen_range(0.05..0.8),
                        predicted_failure_date: Some(
                            now + Duration::days(generator.rng.gen_range(3..120)),
                        ),
                        confidence: generator.rng.gen_range(0.5..0.95),
                        model_id: model_id.clone(),
                        model_type: "LSTM".to_string(),
                    },
                )
                .await;
            store
                .insert_model_metadata(
                    org,
                    ModelMetadata {
                        model_id,
                        confidence_multiplier: None,
                        data_quality_tier: Some(DataQualityTier::Silver),
                    },
                )
                .await;
        }

        ids.push(equipment_id);
    }
    Ok(ids)
}

// ============================================================================
// Output
// ============================================================================

#[derive(Serialize)]
struct SimulationReport {
    organization: String,
    assets: usize,
    rul: Vec<RulPrediction>,
    fleet: FleetTrendSummary,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::load(),
    };

    let org = OrgId::new(args.org.clone());
    let now = Utc::now();
    let store = Arc::new(InMemoryStore::new());

    info!(assets = args.assets, hours = args.hours, seed = ?args.seed, "Seeding synthetic fleet");
    let ids = seed_fleet(&store, &org, &args, now).await?;

    let rul_engine = RulEngine::new(store.clone()).with_config(config.rul.clone());
    let trend_analyzer = TrendAnalyzer::new(store)
        .with_config(config.trend.clone())
        .with_fleet_config(config.fleet.clone());

    let predictions = rul_engine.calculate_batch_rul(&ids, &org).await;
    let fleet = trend_analyzer
        .analyze_fleet_trends(&org, &ids, Some(args.hours))
        .await;

    let mut rul: Vec<RulPrediction> = predictions.into_values().collect();
    rul.sort_by(|a, b| a.equipment_id.cmp(&b.equipment_id));

    let report = SimulationReport {
        organization: org.to_string(),
        assets: ids.len(),
        rul,
        fleet,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
