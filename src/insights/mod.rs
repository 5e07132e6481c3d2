mod config;
mod rules;

pub use config::InsightConfig;

use serde::{Deserialize, Serialize};

use crate::models::{Segment, StationKind};
use crate::progress::Projection;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum InsightKind {
    Positive,
    Warning,
    Opportunity,
    Neutral,
}

/// Short advisory message shown alongside the live metrics.
///
/// Insights are a current-state snapshot, not a log: every evaluation fully
/// replaces the prior list, so stale advice never lingers once its trigger
/// clears.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    /// Icon-class slug, e.g. "pace-degradation" or "heart-rate".
    pub category: String,
    pub text: String,
    pub kind: InsightKind,
    /// Supporting numbers for richer rendering.
    pub data: Option<serde_json::Value>,
}

/// Everything the rules need, borrowed from engine snapshots. The generator
/// itself owns no state.
pub struct InsightContext<'a> {
    /// Paces of completed run segments, secs/km, in completion order.
    pub run_paces: &'a [f64],
    /// The next not-yet-started segment, if any.
    pub next_segment: Option<&'a Segment>,
    pub projection: &'a Projection,
    pub rolling_avg_heart_rate: Option<f64>,
    pub max_heart_rate: f64,
    pub strong_stations: &'a [StationKind],
    pub zone_secs: [f64; 5],
}

/// Evaluate every rule independently; multiple insights may coexist.
pub fn evaluate(ctx: &InsightContext<'_>, config: &InsightConfig) -> Vec<Insight> {
    let mut insights = Vec::new();

    insights.extend(rules::pace_degradation(
        ctx.run_paces,
        config.pace_degradation_margin_secs,
    ));
    insights.extend(rules::strength_opportunity(
        ctx.next_segment,
        ctx.strong_stations,
    ));
    insights.extend(rules::pace_status(
        ctx.projection,
        config.behind_pace_slack_secs,
    ));
    insights.extend(rules::high_heart_rate(
        ctx.rolling_avg_heart_rate,
        ctx.max_heart_rate,
        config.hr_alert_fraction,
    ));
    insights.extend(rules::zone_note(ctx.zone_secs, config.zone_note_min_secs));

    insights
}
