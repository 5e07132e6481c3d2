use serde::{Deserialize, Serialize};

use crate::models::Segment;
use crate::session::{SessionPhase, SessionState};

/// Projected finish time for the session, extrapolated from completed-segment
/// pace when possible. Recomputed on every access; owns no state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub projected_finish_secs: f64,
    /// Sum of all planned segment target durations, when the plan has any.
    pub target_finish_secs: Option<f64>,
    /// Projected minus target; negative means ahead of schedule.
    pub finish_delta_secs: Option<f64>,
    /// False when the engine could only report raw elapsed time.
    pub extrapolated: bool,
}

/// Progress through the current segment in `[0, 1]`.
///
/// Target priority is distance, then reps, then duration: distance-based
/// stations dominate over any incidental duration target.
pub fn segment_progress(
    segment: &Segment,
    segment_distance_m: f64,
    segment_reps: u32,
    segment_elapsed_secs: f64,
) -> f64 {
    if let Some(target) = segment.target_distance_m.filter(|&d| d > 0.0) {
        return (segment_distance_m / target).min(1.0);
    }
    if let Some(target) = segment.target_reps.filter(|&r| r > 0) {
        return (f64::from(segment_reps) / f64::from(target)).min(1.0);
    }
    if let Some(target) = segment.target_duration_secs.filter(|&d| d > 0) {
        return (segment_elapsed_secs / target as f64).min(1.0);
    }
    0.0
}

/// Fraction of the whole session already behind the athlete, in `[0, 1]`.
/// Monotonically non-decreasing: the segment index never moves backward and
/// per-segment progress is clamped.
pub fn overall_progress(state: &SessionState, segment_progress: f64) -> f64 {
    let total = state.segments.len();
    if total == 0 {
        return 0.0;
    }
    if state.phase == SessionPhase::Complete {
        return 1.0;
    }
    ((state.current_index as f64 + segment_progress.clamp(0.0, 1.0)) / total as f64).clamp(0.0, 1.0)
}

/// Extrapolate the finish time from completed-segment pace.
///
/// Skipped segments never enter the average. With zero completed segments the
/// projection falls back to the planned targets of the remaining segments,
/// and to raw elapsed time when the plan defines no targets at all.
pub fn project_finish(
    state: &SessionState,
    segment_elapsed_secs: f64,
    session_elapsed_secs: f64,
) -> Projection {
    let target_finish_secs = target_total(&state.segments);

    let projected_finish_secs = match state.phase {
        SessionPhase::Idle => 0.0,
        SessionPhase::Complete => session_elapsed_secs,
        SessionPhase::Active | SessionPhase::Paused => {
            let completed: Vec<f64> = state.results.iter().map(|r| r.duration_secs).collect();
            let sum_completed: f64 = completed.iter().sum();
            // The in-flight segment counts as remaining; its elapsed time is
            // carried separately.
            let remaining = state.segments.len().saturating_sub(state.current_index);

            if completed.is_empty() {
                let remaining_targets: f64 = state.segments[state.current_index..]
                    .iter()
                    .filter_map(|s| s.target_duration_secs)
                    .map(|d| d as f64)
                    .sum();
                if remaining_targets > 0.0 {
                    session_elapsed_secs + remaining_targets
                } else {
                    // No completions and no targets: report raw elapsed time
                    // with no extrapolation.
                    return Projection {
                        projected_finish_secs: session_elapsed_secs,
                        target_finish_secs,
                        finish_delta_secs: None,
                        extrapolated: false,
                    };
                }
            } else {
                let avg = sum_completed / completed.len() as f64;
                sum_completed + segment_elapsed_secs + avg * remaining as f64
            }
        }
    };

    let finish_delta_secs = target_finish_secs.map(|target| projected_finish_secs - target);
    Projection {
        projected_finish_secs,
        target_finish_secs,
        finish_delta_secs,
        extrapolated: state.phase != SessionPhase::Idle,
    }
}

fn target_total(segments: &[Segment]) -> Option<f64> {
    let total: f64 = segments
        .iter()
        .filter_map(|s| s.target_duration_secs)
        .map(|d| d as f64)
        .sum();
    if total > 0.0 {
        Some(total)
    } else {
        None
    }
}
