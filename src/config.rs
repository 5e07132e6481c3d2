use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::insights::InsightConfig;
use crate::metrics::AggregatorConfig;
use crate::models::StationKind;
use crate::summary::SummaryConfig;

/// Athlete-specific parameters shared across the aggregator, insight rules
/// and summary builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteProfile {
    pub max_heart_rate: f64,
    pub weight_kg: f64,
    /// Station types the athlete is strong at; drives the upcoming-strength
    /// opportunity insight.
    pub strong_stations: Vec<StationKind>,
}

impl Default for AthleteProfile {
    fn default() -> Self {
        Self {
            max_heart_rate: 190.0,
            weight_kg: 75.0,
            strong_stations: vec![StationKind::SledPush, StationKind::FarmersCarry],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub athlete: AthleteProfile,
    pub aggregator: AggregatorConfig,
    pub insights: InsightConfig,
    pub summary: SummaryConfig,
    /// Engine tick interval in milliseconds (sub-second clock recomputation).
    pub tick_interval_ms: u64,
    /// Insights are regenerated every this many ticks.
    pub insight_every_ticks: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            athlete: AthleteProfile::default(),
            aggregator: AggregatorConfig::default(),
            insights: InsightConfig::default(),
            summary: SummaryConfig::default(),
            tick_interval_ms: 1_000,
            insight_every_ticks: 10,
        }
    }
}

impl EngineConfig {
    /// Load a config from a JSON file, falling back to defaults when the file
    /// is missing or unparseable.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config from {}", path.display()))?;
        Ok(serde_json::from_str(&contents).unwrap_or_default())
    }
}
