use serde::{Deserialize, Serialize};

/// Point-in-time view of the aggregator, safe to poll at any rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub current_heart_rate: Option<u32>,
    /// Average over the bounded rolling window (most recent samples).
    pub rolling_avg_heart_rate: Option<f64>,
    /// Running maximum over the whole session, never reset.
    pub peak_heart_rate: Option<u32>,
    pub segment_distance_m: f64,
    pub session_distance_m: f64,
    pub segment_reps: u32,
    pub total_calories: f64,
    /// Seconds per kilometer for the current segment; None until the segment
    /// has covered enough distance for the figure to mean anything.
    pub current_pace_secs_per_km: Option<f64>,
    pub zone_secs: [f64; 5],
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            current_heart_rate: None,
            rolling_avg_heart_rate: None,
            peak_heart_rate: None,
            segment_distance_m: 0.0,
            session_distance_m: 0.0,
            segment_reps: 0,
            total_calories: 0.0,
            current_pace_secs_per_km: None,
            zone_secs: [0.0; 5],
        }
    }
}

/// Segment-scoped totals captured when a segment finishes, feeding the
/// segment's result record.
#[derive(Debug, Clone)]
pub struct SegmentScope {
    pub distance_m: f64,
    pub reps: u32,
    pub avg_heart_rate: Option<f64>,
    pub peak_heart_rate: Option<u32>,
}
