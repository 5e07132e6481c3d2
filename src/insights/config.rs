use serde::{Deserialize, Serialize};

/// Tunable thresholds for the insight rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightConfig {
    /// A run slower than the prior-run average by more than this (secs/km)
    /// triggers the pace-degradation warning.
    pub pace_degradation_margin_secs: f64,

    /// Behind-pace warning fires once the projected finish trails the target
    /// by more than this many seconds.
    pub behind_pace_slack_secs: f64,

    /// Rolling-average heart rate above this fraction of max triggers the
    /// high-heart-rate warning.
    pub hr_alert_fraction: f64,

    /// Minimum accumulated zone time before the zone-distribution note is
    /// worth showing.
    pub zone_note_min_secs: f64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            pace_degradation_margin_secs: 10.0,
            behind_pace_slack_secs: 30.0,
            hr_alert_fraction: 0.90,
            zone_note_min_secs: 300.0,
        }
    }
}
