use serde_json::json;

use crate::models::{Segment, SegmentKind, StationKind};
use crate::progress::Projection;

use super::{Insight, InsightKind};

/// Rule 1: the most recent completed run is markedly slower than the average
/// of all prior runs.
pub(super) fn pace_degradation(run_paces: &[f64], margin_secs: f64) -> Option<Insight> {
    if run_paces.len() < 2 {
        return None;
    }
    let (last, prior) = run_paces.split_last()?;
    let prior_avg = prior.iter().sum::<f64>() / prior.len() as f64;
    let excess = last - prior_avg;
    if excess <= margin_secs {
        return None;
    }

    Some(Insight {
        category: "pace-degradation".to_string(),
        text: format!(
            "Last run came in at {} /km, {:.0}s slower than your earlier runs. Shake your legs out before the next one.",
            format_pace(*last),
            excess
        ),
        kind: InsightKind::Warning,
        data: Some(json!({
            "lastPaceSecsPerKm": last,
            "priorAvgSecsPerKm": prior_avg,
            "excessSecs": excess,
        })),
    })
}

/// Rule 2: the next pending segment is one of the athlete's strong stations.
pub(super) fn strength_opportunity(
    next_segment: Option<&Segment>,
    strong_stations: &[StationKind],
) -> Option<Insight> {
    let segment = next_segment?;
    if segment.kind != SegmentKind::Station {
        return None;
    }
    let station = segment.station?;
    if !strong_stations.contains(&station) {
        return None;
    }

    Some(Insight {
        category: "strength-opportunity".to_string(),
        text: format!(
            "{} is up next - one of your strong stations. A hard push here buys time for the runs.",
            station.display_name()
        ),
        kind: InsightKind::Opportunity,
        data: Some(json!({ "station": station.display_name() })),
    })
}

/// Rules 3 and 4: ahead-of-pace affirmation, or behind-pace warning once the
/// deficit clears the slack. Mutually exclusive by construction.
pub(super) fn pace_status(projection: &Projection, slack_secs: f64) -> Option<Insight> {
    let delta = projection.finish_delta_secs?;

    if delta < 0.0 {
        let lead = -delta;
        return Some(Insight {
            category: "ahead-of-pace".to_string(),
            text: format!("Projected {lead:.0}s ahead of your target finish. Hold this rhythm."),
            kind: InsightKind::Positive,
            data: Some(json!({ "leadSecs": lead })),
        });
    }
    if delta > slack_secs {
        return Some(Insight {
            category: "behind-pace".to_string(),
            text: format!(
                "Projected {delta:.0}s behind target. Keep transitions tight to claw it back."
            ),
            kind: InsightKind::Warning,
            data: Some(json!({ "behindSecs": delta })),
        });
    }
    None
}

/// Supplemental rule: sustained rolling-average heart rate near max.
pub(super) fn high_heart_rate(
    rolling_avg: Option<f64>,
    max_heart_rate: f64,
    alert_fraction: f64,
) -> Option<Insight> {
    let avg = rolling_avg?;
    let threshold = max_heart_rate * alert_fraction;
    if avg <= threshold {
        return None;
    }

    Some(Insight {
        category: "heart-rate".to_string(),
        text: format!(
            "Heart rate has been holding above {threshold:.0} bpm. Settle into a sustainable effort before the next run."
        ),
        kind: InsightKind::Warning,
        data: Some(json!({ "rollingAvgBpm": avg, "thresholdBpm": threshold })),
    })
}

/// Supplemental rule: once enough time has accrued, note the dominant
/// heart-rate zone for the session.
pub(super) fn zone_note(zone_secs: [f64; 5], min_total_secs: f64) -> Option<Insight> {
    let total: f64 = zone_secs.iter().sum();
    if total < min_total_secs {
        return None;
    }
    let (dominant, &secs) = zone_secs
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))?;

    Some(Insight {
        category: "zone-distribution".to_string(),
        text: format!(
            "Most of this session has been in zone {} ({:.0}% of the work so far).",
            dominant + 1,
            secs / total * 100.0
        ),
        kind: InsightKind::Neutral,
        data: Some(json!({ "dominantZone": dominant + 1, "zoneSecs": zone_secs })),
    })
}

fn format_pace(secs_per_km: f64) -> String {
    let total = secs_per_km.round() as i64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::{evaluate, InsightConfig, InsightContext};

    fn projection(delta: Option<f64>) -> Projection {
        Projection {
            projected_finish_secs: 1_000.0,
            target_finish_secs: delta.map(|d| 1_000.0 - d),
            finish_delta_secs: delta,
            extrapolated: true,
        }
    }

    #[test]
    fn pace_degradation_fires_past_margin() {
        // Prior average of [288, 295, 308] ~= 297; 315 is 18s over.
        let insight = pace_degradation(&[288.0, 295.0, 308.0, 315.0], 10.0).unwrap();
        assert_eq!(insight.kind, InsightKind::Warning);
        assert_eq!(insight.category, "pace-degradation");

        // Within the margin: quiet.
        assert!(pace_degradation(&[300.0, 300.0, 305.0], 10.0).is_none());
        // A single run has no history to degrade from.
        assert!(pace_degradation(&[320.0], 10.0).is_none());
    }

    #[test]
    fn strength_opportunity_requires_a_strong_station() {
        let strong = [StationKind::SledPush];
        let sled = Segment::new(3, SegmentKind::Station).with_station(StationKind::SledPush);
        let row = Segment::new(3, SegmentKind::Station).with_station(StationKind::Rowing);
        let run = Segment::new(3, SegmentKind::Run);

        assert!(strength_opportunity(Some(&sled), &strong).is_some());
        assert!(strength_opportunity(Some(&row), &strong).is_none());
        assert!(strength_opportunity(Some(&run), &strong).is_none());
        assert!(strength_opportunity(None, &strong).is_none());
    }

    #[test]
    fn pace_status_is_ahead_or_behind_never_both() {
        let ahead = pace_status(&projection(Some(-25.0)), 30.0).unwrap();
        assert_eq!(ahead.kind, InsightKind::Positive);

        let behind = pace_status(&projection(Some(45.0)), 30.0).unwrap();
        assert_eq!(behind.kind, InsightKind::Warning);

        // Inside the slack: no nagging.
        assert!(pace_status(&projection(Some(10.0)), 30.0).is_none());
        // No target to compare against.
        assert!(pace_status(&projection(None), 30.0).is_none());
    }

    #[test]
    fn high_heart_rate_uses_fraction_of_max() {
        // 0.9 * 190 = 171.
        assert!(high_heart_rate(Some(175.0), 190.0, 0.9).is_some());
        assert!(high_heart_rate(Some(165.0), 190.0, 0.9).is_none());
        assert!(high_heart_rate(None, 190.0, 0.9).is_none());
    }

    #[test]
    fn zone_note_waits_for_enough_data() {
        let mut zones = [0.0; 5];
        zones[3] = 100.0;
        assert!(zone_note(zones, 300.0).is_none());

        zones[3] = 400.0;
        zones[2] = 100.0;
        let insight = zone_note(zones, 300.0).unwrap();
        assert_eq!(insight.kind, InsightKind::Neutral);
        assert!(insight.text.contains("zone 4"));
    }

    #[test]
    fn evaluate_collects_independent_rules() {
        let paces = [288.0, 295.0, 308.0, 315.0];
        let proj = projection(Some(45.0));
        let ctx = InsightContext {
            run_paces: &paces,
            next_segment: None,
            projection: &proj,
            rolling_avg_heart_rate: Some(178.0),
            max_heart_rate: 190.0,
            strong_stations: &[],
            zone_secs: [0.0; 5],
        };
        let insights = evaluate(&ctx, &InsightConfig::default());

        let categories: Vec<&str> = insights.iter().map(|i| i.category.as_str()).collect();
        assert!(categories.contains(&"pace-degradation"));
        assert!(categories.contains(&"behind-pace"));
        assert!(categories.contains(&"heart-rate"));
        assert_eq!(insights.len(), 3);
    }
}
