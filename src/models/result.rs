use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Measured outcome of one completed segment.
///
/// Created exactly once, at the moment the segment transitions to completed;
/// never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentResult {
    pub segment_index: usize,
    pub duration_secs: f64,
    pub distance_m: Option<f64>,
    pub reps: Option<u32>,
    pub avg_heart_rate: Option<f64>,
    pub peak_heart_rate: Option<u32>,
}

/// A run segment executed under elevated physiological stress rather than at
/// a fresh aerobic baseline. Derived at summary-build time only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompromisedRun {
    pub segment_index: usize,
    pub segment_name: String,
    /// Seconds over the baseline expectation for the run's distance.
    pub excess_secs: f64,
    pub avg_heart_rate: f64,
    pub reason: String,
}

/// Terminal artifact of a session, handed to persistence and transport once.
/// Immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSummary {
    pub session_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: DateTime<Utc>,
    /// Active time: wall-clock duration minus accumulated pause time.
    pub total_elapsed_secs: f64,
    pub segments_completed: usize,
    pub segments_skipped: usize,
    pub total_segments: usize,
    pub avg_heart_rate: Option<f64>,
    pub peak_heart_rate: Option<u32>,
    pub total_calories: f64,
    pub total_distance_m: f64,
    pub segment_results: Vec<SegmentResult>,
    pub compromised_runs: Vec<CompromisedRun>,
    /// Seconds spent in each of the five heart-rate zones.
    pub zone_secs: [f64; 5],
}
