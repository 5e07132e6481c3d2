use serde::{Deserialize, Serialize};

/// Thresholds for summary-time analysis. These are configuration, not
/// physiological invariants; hosts should tune them per athlete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryConfig {
    /// A run averaging above this fraction of max heart rate counts as
    /// executed under elevated stress.
    pub compromised_hr_fraction: f64,

    /// Expected "fresh" run pace (secs/km) used to derive the baseline
    /// duration a run of a given distance should have taken.
    pub baseline_run_pace_secs_per_km: f64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            compromised_hr_fraction: 0.85,
            baseline_run_pace_secs_per_km: 300.0,
        }
    }
}
