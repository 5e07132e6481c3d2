mod types;

pub use types::{MetricsSnapshot, SegmentScope};

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;
use crate::sensing::LocationFix;

/// Tunable thresholds for sensor ingestion and derived metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatorConfig {
    /// Rolling heart-rate window length (most-recent samples).
    pub hr_window_len: usize,

    /// Location fixes with worse horizontal accuracy than this are dropped.
    pub max_horizontal_accuracy_m: f64,

    /// Pace is undefined until the segment has covered this much distance;
    /// avoids division-by-near-zero paces at segment start.
    pub min_pace_distance_m: f64,

    /// Calorie model: kcal per kg of body weight per minute at 100% of max
    /// heart rate, scaled linearly with heart-rate fraction.
    pub burn_rate_kcal_per_kg_min: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            hr_window_len: 60,
            max_horizontal_accuracy_m: 50.0,
            min_pace_distance_m: 50.0,
            burn_rate_kcal_per_kg_min: 0.14,
        }
    }
}

/// Rolling live metrics, scoped to the current segment and to the session.
///
/// Mutated continuously by sensor events and the engine tick. Segment-scoped
/// counters reset on every segment transition; session-scoped accumulators
/// (peak heart rate, total distance, calories, zone times) never reset.
pub struct LiveMetrics {
    config: AggregatorConfig,
    max_heart_rate: f64,
    weight_kg: f64,

    hr_window: VecDeque<u32>,
    current_hr: Option<u32>,
    session_peak_hr: Option<u32>,
    session_hr_sum: u64,
    session_hr_count: u64,

    segment_hr_sum: u64,
    segment_hr_count: u64,
    segment_peak_hr: Option<u32>,

    // Last accepted fix; the delta chain continues across segment boundaries.
    last_fix: Option<(f64, f64)>,
    segment_distance_m: f64,
    session_distance_m: f64,
    segment_reps: u32,
    total_calories: f64,
    zone_secs: [f64; 5],
}

impl LiveMetrics {
    pub fn new(config: AggregatorConfig, max_heart_rate: f64, weight_kg: f64) -> Self {
        Self {
            config,
            max_heart_rate,
            weight_kg,
            hr_window: VecDeque::new(),
            current_hr: None,
            session_peak_hr: None,
            session_hr_sum: 0,
            session_hr_count: 0,
            segment_hr_sum: 0,
            segment_hr_count: 0,
            segment_peak_hr: None,
            last_fix: None,
            segment_distance_m: 0.0,
            session_distance_m: 0.0,
            segment_reps: 0,
            total_calories: 0.0,
            zone_secs: [0.0; 5],
        }
    }

    /// Ingest one heart-rate sample. Samples are trusted as delivered;
    /// physiological plausibility is the insight generator's concern.
    pub fn record_heart_rate(&mut self, bpm: u32) {
        if self.hr_window.len() == self.config.hr_window_len {
            self.hr_window.pop_front();
        }
        self.hr_window.push_back(bpm);
        self.current_hr = Some(bpm);

        self.session_hr_sum += u64::from(bpm);
        self.session_hr_count += 1;
        self.segment_hr_sum += u64::from(bpm);
        self.segment_hr_count += 1;

        if self.session_peak_hr.map_or(true, |peak| bpm > peak) {
            self.session_peak_hr = Some(bpm);
        }
        if self.segment_peak_hr.map_or(true, |peak| bpm > peak) {
            self.segment_peak_hr = Some(bpm);
        }
    }

    /// Ingest one location fix. Fixes with non-finite, non-positive, or poor
    /// horizontal accuracy are rejected; callers swallow the error since
    /// sporadic bad GPS fixes are routine.
    pub fn record_location(&mut self, fix: &LocationFix) -> Result<f64, EngineError> {
        let accuracy = fix.horizontal_accuracy_m;
        if !accuracy.is_finite() || accuracy <= 0.0 {
            return Err(EngineError::SensorDataRejected(format!(
                "invalid horizontal accuracy {accuracy}"
            )));
        }
        if accuracy > self.config.max_horizontal_accuracy_m {
            return Err(EngineError::SensorDataRejected(format!(
                "horizontal accuracy {accuracy}m exceeds {}m",
                self.config.max_horizontal_accuracy_m
            )));
        }
        if !fix.latitude.is_finite() || !fix.longitude.is_finite() {
            return Err(EngineError::SensorDataRejected(
                "non-finite coordinate".to_string(),
            ));
        }

        let delta = match self.last_fix {
            Some((lat, lon)) => haversine_distance_m(lat, lon, fix.latitude, fix.longitude),
            None => 0.0,
        };
        self.last_fix = Some((fix.latitude, fix.longitude));
        self.segment_distance_m += delta;
        self.session_distance_m += delta;
        Ok(delta)
    }

    /// One discrete "rep observed" action; returns the new segment rep count.
    pub fn increment_rep(&mut self) -> u32 {
        self.segment_reps += 1;
        self.segment_reps
    }

    /// Accrue time-based accumulators for one active (unpaused) tick:
    /// calories from the current heart-rate intensity, and zone attribution.
    pub fn on_active_tick(&mut self, dt_secs: f64) {
        let Some(bpm) = self.current_hr else {
            return;
        };
        let hr_fraction = (f64::from(bpm) / self.max_heart_rate).clamp(0.0, 1.5);
        let kcal_per_min = self.weight_kg * self.config.burn_rate_kcal_per_kg_min * hr_fraction;
        self.total_calories += kcal_per_min * dt_secs / 60.0;

        self.zone_secs[zone_index(f64::from(bpm), self.max_heart_rate)] += dt_secs;
    }

    pub fn rolling_avg_heart_rate(&self) -> Option<f64> {
        if self.hr_window.is_empty() {
            return None;
        }
        let sum: u64 = self.hr_window.iter().map(|&bpm| u64::from(bpm)).sum();
        Some(sum as f64 / self.hr_window.len() as f64)
    }

    pub fn session_avg_heart_rate(&self) -> Option<f64> {
        if self.session_hr_count == 0 {
            return None;
        }
        Some(self.session_hr_sum as f64 / self.session_hr_count as f64)
    }

    pub fn session_peak_heart_rate(&self) -> Option<u32> {
        self.session_peak_hr
    }

    pub fn segment_distance_m(&self) -> f64 {
        self.segment_distance_m
    }

    pub fn session_distance_m(&self) -> f64 {
        self.session_distance_m
    }

    pub fn segment_reps(&self) -> u32 {
        self.segment_reps
    }

    pub fn total_calories(&self) -> f64 {
        self.total_calories
    }

    pub fn zone_secs(&self) -> [f64; 5] {
        self.zone_secs
    }

    /// Seconds per kilometer over the current segment, or None until the
    /// segment distance clears the minimum threshold.
    pub fn current_pace_secs_per_km(&self, segment_elapsed_secs: f64) -> Option<f64> {
        if self.segment_distance_m < self.config.min_pace_distance_m {
            return None;
        }
        Some(segment_elapsed_secs / (self.segment_distance_m / 1_000.0))
    }

    /// Capture segment-scoped totals and reset them for the next segment.
    /// Session-scoped accumulators are untouched.
    pub fn finalize_segment(&mut self) -> SegmentScope {
        let scope = SegmentScope {
            distance_m: self.segment_distance_m,
            reps: self.segment_reps,
            avg_heart_rate: if self.segment_hr_count > 0 {
                Some(self.segment_hr_sum as f64 / self.segment_hr_count as f64)
            } else {
                None
            },
            peak_heart_rate: self.segment_peak_hr,
        };

        self.segment_distance_m = 0.0;
        self.segment_reps = 0;
        self.segment_hr_sum = 0;
        self.segment_hr_count = 0;
        self.segment_peak_hr = None;

        scope
    }

    pub fn snapshot(&self, segment_elapsed_secs: f64) -> MetricsSnapshot {
        MetricsSnapshot {
            current_heart_rate: self.current_hr,
            rolling_avg_heart_rate: self.rolling_avg_heart_rate(),
            peak_heart_rate: self.session_peak_hr,
            segment_distance_m: self.segment_distance_m,
            session_distance_m: self.session_distance_m,
            segment_reps: self.segment_reps,
            total_calories: self.total_calories,
            current_pace_secs_per_km: self.current_pace_secs_per_km(segment_elapsed_secs),
            zone_secs: self.zone_secs,
        }
    }
}

/// Zone bands as fractions of max heart rate: <0.6, 0.6-0.7, 0.7-0.8,
/// 0.8-0.9, >=0.9.
pub fn zone_index(bpm: f64, max_heart_rate: f64) -> usize {
    let fraction = bpm / max_heart_rate;
    match fraction {
        x if x < 0.6 => 0,
        x if x < 0.7 => 1,
        x if x < 0.8 => 2,
        x if x < 0.9 => 3,
        _ => 4,
    }
}

/// Great-circle distance between two coordinates, in meters.
fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let r = 6_371_000.0_f64;
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    r * c
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn fix(latitude: f64, accuracy: f64) -> LocationFix {
        LocationFix {
            latitude,
            longitude: -73.98,
            altitude_m: 10.0,
            timestamp: Utc::now(),
            speed_mps: 3.0,
            horizontal_accuracy_m: accuracy,
        }
    }

    fn metrics() -> LiveMetrics {
        LiveMetrics::new(AggregatorConfig::default(), 190.0, 75.0)
    }

    #[test]
    fn rejects_poor_and_invalid_accuracy_fixes() {
        let mut m = metrics();

        // Stream with accuracies [10, 80, 5, -1]: only 10 and 5 contribute.
        assert!(m.record_location(&fix(45.5000, 10.0)).is_ok());
        assert!(m.record_location(&fix(45.5010, 80.0)).is_err());
        assert!(m.record_location(&fix(45.5020, 5.0)).is_ok());
        assert!(m.record_location(&fix(45.5030, -1.0)).is_err());

        // Accepted distance spans 45.5000 -> 45.5020 (~222m), the rejected
        // fixes contribute nothing and do not move the delta anchor.
        let distance = m.session_distance_m();
        assert!(
            (200.0..250.0).contains(&distance),
            "unexpected distance {distance}"
        );
        assert!((m.segment_distance_m() - distance).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_non_finite_accuracy() {
        let mut m = metrics();
        assert!(m.record_location(&fix(45.5, f64::NAN)).is_err());
        assert!(m.record_location(&fix(45.5, f64::INFINITY)).is_err());
        assert_eq!(m.session_distance_m(), 0.0);
    }

    #[test]
    fn rolling_window_is_bounded() {
        let mut m = metrics();
        for bpm in 0..100 {
            m.record_heart_rate(100 + bpm);
        }
        // Window keeps the most recent 60 samples: 140..=199.
        let avg = m.rolling_avg_heart_rate().unwrap();
        assert!((avg - 169.5).abs() < 1e-9, "avg was {avg}");
        // Peak covers the whole session, not just the window.
        assert_eq!(m.session_peak_heart_rate(), Some(199));
    }

    #[test]
    fn pace_requires_minimum_distance() {
        let mut m = metrics();
        assert!(m.record_location(&fix(45.5000, 10.0)).is_ok());
        assert!(m.current_pace_secs_per_km(60.0).is_none());

        // ~111m per 0.001 degrees of latitude.
        assert!(m.record_location(&fix(45.5010, 10.0)).is_ok());
        let pace = m.current_pace_secs_per_km(60.0).unwrap();
        // 60s over ~111m is roughly 540 s/km.
        assert!((450.0..650.0).contains(&pace), "pace was {pace}");
    }

    #[test]
    fn segment_finalize_resets_segment_scope_only() {
        let mut m = metrics();
        m.record_heart_rate(150);
        m.record_heart_rate(160);
        m.increment_rep();
        assert!(m.record_location(&fix(45.5000, 10.0)).is_ok());
        assert!(m.record_location(&fix(45.5010, 10.0)).is_ok());

        let scope = m.finalize_segment();
        assert_eq!(scope.reps, 1);
        assert_eq!(scope.peak_heart_rate, Some(160));
        assert!((scope.avg_heart_rate.unwrap() - 155.0).abs() < 1e-9);
        assert!(scope.distance_m > 100.0);

        // Segment scope cleared, session scope preserved.
        assert_eq!(m.segment_reps(), 0);
        assert_eq!(m.segment_distance_m(), 0.0);
        assert!(m.session_distance_m() > 100.0);
        assert_eq!(m.session_peak_heart_rate(), Some(160));

        // The delta chain survives the transition: the next accepted fix
        // measures from the last pre-transition fix.
        assert!(m.record_location(&fix(45.5020, 10.0)).is_ok());
        assert!(m.segment_distance_m() > 100.0);
    }

    #[test]
    fn calories_and_zones_accrue_on_active_ticks() {
        let mut m = metrics();
        m.record_heart_rate(160); // 160/190 ~ 0.84 -> zone index 3
        m.on_active_tick(60.0);

        assert!(m.total_calories() > 0.0);
        assert!(m.zone_secs()[3] > 59.0);

        // No heart rate yet -> nothing accrues.
        let mut empty = metrics();
        empty.on_active_tick(60.0);
        assert_eq!(empty.total_calories(), 0.0);
    }

    #[test]
    fn zone_bands() {
        assert_eq!(zone_index(100.0, 190.0), 0);
        assert_eq!(zone_index(120.0, 190.0), 1);
        assert_eq!(zone_index(140.0, 190.0), 2);
        assert_eq!(zone_index(160.0, 190.0), 3);
        assert_eq!(zone_index(180.0, 190.0), 4);
    }
}
