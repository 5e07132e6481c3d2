use std::time::Instant;

use chrono::Utc;

use crate::metrics::LiveMetrics;
use crate::models::WorkoutSummary;
use crate::session::SessionState;

use super::compromised::detect_compromised_runs;
use super::config::SummaryConfig;

/// Fold the finished session into its terminal artifact. Called exactly once,
/// when the state machine reaches completion or is force-ended; the returned
/// summary is immutable from the caller's point of view.
pub fn build_summary(
    state: &SessionState,
    metrics: &LiveMetrics,
    max_heart_rate: f64,
    config: &SummaryConfig,
    now: Instant,
) -> WorkoutSummary {
    let compromised_runs =
        detect_compromised_runs(&state.results, &state.segments, max_heart_rate, config);

    WorkoutSummary {
        session_id: state.session_id.clone(),
        started_at: state.started_at,
        completed_at: state.completed_at.unwrap_or_else(Utc::now),
        total_elapsed_secs: state.session_elapsed_ms(now) as f64 / 1_000.0,
        segments_completed: state.results.len(),
        segments_skipped: state.skipped.len(),
        total_segments: state.segments.len(),
        avg_heart_rate: metrics.session_avg_heart_rate(),
        peak_heart_rate: metrics.session_peak_heart_rate(),
        total_calories: metrics.total_calories(),
        total_distance_m: metrics.session_distance_m(),
        segment_results: state.results.clone(),
        compromised_runs,
        zone_secs: metrics.zone_secs(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::metrics::AggregatorConfig;
    use crate::models::{Segment, SegmentKind, SegmentResult};

    #[test]
    fn immediate_end_summarizes_zero_completions() {
        let t0 = Instant::now();
        let segments: Vec<Segment> = (0..4).map(|i| Segment::new(i, SegmentKind::Run)).collect();
        let mut state = SessionState::new();
        state
            .start("s-1".to_string(), segments, Utc::now(), t0)
            .unwrap();
        state
            .force_end(Utc::now(), t0 + Duration::from_secs(5))
            .unwrap();

        let metrics = LiveMetrics::new(AggregatorConfig::default(), 190.0, 75.0);
        let summary = build_summary(
            &state,
            &metrics,
            190.0,
            &SummaryConfig::default(),
            t0 + Duration::from_secs(5),
        );

        assert_eq!(summary.segments_completed, 0);
        assert_eq!(summary.total_segments, 4);
        assert_eq!(summary.segments_skipped, 0);
        assert!(summary.segment_results.is_empty());
        assert!(summary.compromised_runs.is_empty());
        assert!((summary.total_elapsed_secs - 5.0).abs() < 1e-9);
    }

    #[test]
    fn summary_carries_results_and_compromised_runs() {
        let t0 = Instant::now();
        let segments = vec![
            Segment::new(0, SegmentKind::Run).with_target_distance(1_000.0),
            Segment::new(1, SegmentKind::Rest).with_target_duration(60),
        ];
        let mut state = SessionState::new();
        state
            .start("s-2".to_string(), segments, Utc::now(), t0)
            .unwrap();

        state.record_result(SegmentResult {
            segment_index: 0,
            duration_secs: 340.0,
            distance_m: Some(1_000.0),
            reps: None,
            avg_heart_rate: Some(172.0),
            peak_heart_rate: Some(181),
        });
        state
            .advance(Utc::now(), t0 + Duration::from_secs(340))
            .unwrap();
        state.record_skip(1);
        state
            .advance(Utc::now(), t0 + Duration::from_secs(345))
            .unwrap();

        let mut metrics = LiveMetrics::new(AggregatorConfig::default(), 190.0, 75.0);
        metrics.record_heart_rate(172);

        let summary = build_summary(
            &state,
            &metrics,
            190.0,
            &SummaryConfig::default(),
            t0 + Duration::from_secs(345),
        );

        assert_eq!(summary.segments_completed, 1);
        assert_eq!(summary.segments_skipped, 1);
        // 172 avg > 161.5 threshold, 340s > 300s baseline for 1km.
        assert_eq!(summary.compromised_runs.len(), 1);
        assert_eq!(summary.peak_heart_rate, Some(172));
    }
}
