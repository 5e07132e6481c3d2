use crate::models::{CompromisedRun, Segment, SegmentKind, SegmentResult};

use super::config::SummaryConfig;

/// Flag run segments executed under elevated physiological stress: average
/// heart rate above the high-intensity threshold AND a duration beyond the
/// baseline expectation for the run's distance. Models a run compromised by
/// fatigue carried over from a preceding station.
pub fn detect_compromised_runs(
    results: &[SegmentResult],
    segments: &[Segment],
    max_heart_rate: f64,
    config: &SummaryConfig,
) -> Vec<CompromisedRun> {
    let hr_threshold = max_heart_rate * config.compromised_hr_fraction;

    results
        .iter()
        .filter_map(|result| {
            let segment = segments.get(result.segment_index)?;
            if segment.kind != SegmentKind::Run {
                return None;
            }
            let avg_hr = result.avg_heart_rate?;
            if avg_hr <= hr_threshold {
                return None;
            }
            let distance_m = result.distance_m.filter(|&d| d > 0.0)?;
            let expected_secs = distance_m / 1_000.0 * config.baseline_run_pace_secs_per_km;
            let excess_secs = result.duration_secs - expected_secs;
            if excess_secs <= 0.0 {
                return None;
            }

            Some(CompromisedRun {
                segment_index: result.segment_index,
                segment_name: segment.name(),
                excess_secs,
                avg_heart_rate: avg_hr,
                reason: format!(
                    "Averaged {avg_hr:.0} bpm (threshold {hr_threshold:.0}) and ran {excess_secs:.0}s over the expected time for {:.2} km",
                    distance_m / 1_000.0
                ),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_segment(index: usize) -> Segment {
        Segment::new(index, SegmentKind::Run).with_target_distance(1_000.0)
    }

    fn run_result(index: usize, duration_secs: f64, avg_hr: Option<f64>) -> SegmentResult {
        SegmentResult {
            segment_index: index,
            duration_secs,
            distance_m: Some(1_000.0),
            reps: None,
            avg_heart_rate: avg_hr,
            peak_heart_rate: avg_hr.map(|hr| hr as u32 + 8),
        }
    }

    #[test]
    fn flags_hot_slow_run_exactly_once() {
        // Threshold = 180 * 0.85 = 153; avg 160 is over, and 340s for 1km is
        // 40s past the 300s baseline.
        let config = SummaryConfig::default();
        let segments = vec![run_segment(0)];
        let results = vec![run_result(0, 340.0, Some(160.0))];

        let flagged = detect_compromised_runs(&results, &segments, 180.0, &config);
        assert_eq!(flagged.len(), 1);
        assert!(flagged[0].excess_secs > 0.0);
        assert!((flagged[0].excess_secs - 40.0).abs() < 1e-9);
        assert!(flagged[0].reason.contains("160"));
    }

    #[test]
    fn fast_or_cool_runs_are_not_flagged() {
        let config = SummaryConfig::default();
        let segments = vec![run_segment(0), run_segment(1)];
        let results = vec![
            // Hot but fast: under baseline duration.
            run_result(0, 280.0, Some(170.0)),
            // Slow but cool: under the HR threshold.
            run_result(1, 360.0, Some(140.0)),
        ];

        assert!(detect_compromised_runs(&results, &segments, 180.0, &config).is_empty());
    }

    #[test]
    fn non_runs_and_missing_data_are_ignored() {
        let config = SummaryConfig::default();
        let segments = vec![
            Segment::new(0, SegmentKind::Station).with_target_reps(100),
            run_segment(1),
        ];
        let results = vec![
            // Station result, however hot, is not a run.
            SegmentResult {
                segment_index: 0,
                duration_secs: 400.0,
                distance_m: None,
                reps: Some(100),
                avg_heart_rate: Some(175.0),
                peak_heart_rate: Some(182),
            },
            // Run with no heart-rate data cannot be judged.
            run_result(1, 400.0, None),
        ];

        assert!(detect_compromised_runs(&results, &segments, 180.0, &config).is_empty());
    }
}
