use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::errors::EngineError;
use crate::models::{Segment, SegmentResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Idle,
    Active,
    Paused,
    Complete,
}

impl Default for SessionPhase {
    fn default() -> Self {
        SessionPhase::Idle
    }
}

/// Elapsed time derived from timestamp anchors, never from an incrementing
/// counter, so timer coalescing or backgrounding cannot desynchronize it
/// from wall-clock reality.
///
/// `baseline_ms` holds time accumulated from earlier running windows and
/// combines with `anchor` to compute the true elapsed duration.
#[derive(Debug, Clone, Default)]
struct FrozenClock {
    baseline_ms: u64,
    anchor: Option<Instant>,
}

impl FrozenClock {
    fn elapsed_ms(&self, now: Instant) -> u64 {
        match self.anchor {
            Some(anchor) => self
                .baseline_ms
                .saturating_add(now.saturating_duration_since(anchor).as_millis() as u64),
            None => self.baseline_ms,
        }
    }

    fn freeze(&mut self, now: Instant) {
        self.baseline_ms = self.elapsed_ms(now);
        self.anchor = None;
    }

    fn unfreeze(&mut self, now: Instant) {
        if self.anchor.is_none() {
            self.anchor = Some(now);
        }
    }

    fn reset(&mut self, now: Instant, running: bool) {
        self.baseline_ms = 0;
        self.anchor = if running { Some(now) } else { None };
    }
}

/// The mutable heart of the engine: segment progression, pause/resume and
/// the two frozen clocks. Only one segment is ever live at a time, and
/// `current_index` is monotonically non-decreasing, bounded by
/// `[0, segments.len()]`; reaching the bound means the session is complete.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub session_id: String,
    pub segments: Arc<Vec<Segment>>,
    pub phase: SessionPhase,
    pub current_index: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    session_clock: FrozenClock,
    segment_clock: FrozenClock,
    paused_ms: u64,
    pause_anchor: Option<Instant>,
    pub results: Vec<SegmentResult>,
    pub skipped: Vec<usize>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            session_id: String::new(),
            segments: Arc::new(Vec::new()),
            phase: SessionPhase::Idle,
            current_index: 0,
            started_at: None,
            completed_at: None,
            session_clock: FrozenClock::default(),
            segment_clock: FrozenClock::default(),
            paused_ms: 0,
            pause_anchor: None,
            results: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn start(
        &mut self,
        session_id: String,
        segments: Vec<Segment>,
        start_at: DateTime<Utc>,
        now: Instant,
    ) -> Result<(), EngineError> {
        if self.phase != SessionPhase::Idle {
            return Err(EngineError::InvalidSession(
                "session already started".to_string(),
            ));
        }
        if segments.is_empty() {
            return Err(EngineError::InvalidSession(
                "segment list is empty".to_string(),
            ));
        }

        self.session_id = session_id;
        self.segments = Arc::new(segments);
        self.phase = SessionPhase::Active;
        self.current_index = 0;
        self.started_at = Some(start_at);
        self.session_clock.reset(now, true);
        self.segment_clock.reset(now, true);
        Ok(())
    }

    /// Freeze the derived clocks. Sensor subscriptions stay live so resuming
    /// has fresh data immediately.
    pub fn pause(&mut self, now: Instant) -> Result<(), EngineError> {
        if self.phase != SessionPhase::Active {
            return Err(EngineError::invalid_transition("pause", self.phase));
        }
        self.session_clock.freeze(now);
        self.segment_clock.freeze(now);
        self.pause_anchor = Some(now);
        self.phase = SessionPhase::Paused;
        Ok(())
    }

    pub fn resume(&mut self, now: Instant) -> Result<(), EngineError> {
        if self.phase != SessionPhase::Paused {
            return Err(EngineError::invalid_transition("resume", self.phase));
        }
        if let Some(anchor) = self.pause_anchor.take() {
            self.paused_ms = self
                .paused_ms
                .saturating_add(now.saturating_duration_since(anchor).as_millis() as u64);
        }
        self.session_clock.unfreeze(now);
        self.segment_clock.unfreeze(now);
        self.phase = SessionPhase::Active;
        Ok(())
    }

    /// Advance past the current segment. Returns true when the session just
    /// reached completion.
    pub fn advance(&mut self, completed_at: DateTime<Utc>, now: Instant) -> Result<bool, EngineError> {
        match self.phase {
            SessionPhase::Active | SessionPhase::Paused => {}
            phase => return Err(EngineError::invalid_transition("advance segment", phase)),
        }

        self.current_index += 1;
        if self.current_index == self.segments.len() {
            self.finish(completed_at, now);
            return Ok(true);
        }

        let running = self.phase == SessionPhase::Active;
        self.segment_clock.reset(now, running);
        Ok(false)
    }

    /// Force-terminate regardless of remaining segments.
    pub fn force_end(&mut self, ended_at: DateTime<Utc>, now: Instant) -> Result<(), EngineError> {
        match self.phase {
            SessionPhase::Active | SessionPhase::Paused => {
                self.finish(ended_at, now);
                Ok(())
            }
            phase => Err(EngineError::invalid_transition("end", phase)),
        }
    }

    fn finish(&mut self, at: DateTime<Utc>, now: Instant) {
        if let Some(anchor) = self.pause_anchor.take() {
            self.paused_ms = self
                .paused_ms
                .saturating_add(now.saturating_duration_since(anchor).as_millis() as u64);
        }
        self.session_clock.freeze(now);
        self.segment_clock.freeze(now);
        self.phase = SessionPhase::Complete;
        self.completed_at = Some(at);
    }

    pub fn record_result(&mut self, result: SegmentResult) {
        self.results.push(result);
    }

    pub fn record_skip(&mut self, segment_index: usize) {
        self.skipped.push(segment_index);
    }

    pub fn current_segment(&self) -> Option<&Segment> {
        self.segments.get(self.current_index)
    }

    pub fn is_live(&self) -> bool {
        matches!(self.phase, SessionPhase::Active | SessionPhase::Paused)
    }

    /// Active session time: wall-clock duration minus accumulated pause time.
    pub fn session_elapsed_ms(&self, now: Instant) -> u64 {
        self.session_clock.elapsed_ms(now)
    }

    pub fn segment_elapsed_ms(&self, now: Instant) -> u64 {
        self.segment_clock.elapsed_ms(now)
    }

    /// Cumulative pause time, including a currently running pause.
    pub fn paused_ms(&self, now: Instant) -> u64 {
        match self.pause_anchor {
            Some(anchor) => self
                .paused_ms
                .saturating_add(now.saturating_duration_since(anchor).as_millis() as u64),
            None => self.paused_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::SegmentKind;

    fn segs(n: usize) -> Vec<Segment> {
        (0..n).map(|i| Segment::new(i, SegmentKind::Run)).collect()
    }

    fn started(n: usize, t0: Instant) -> SessionState {
        let mut state = SessionState::new();
        state
            .start("s-1".to_string(), segs(n), Utc::now(), t0)
            .unwrap();
        state
    }

    #[test]
    fn start_requires_segments() {
        let mut state = SessionState::new();
        let err = state.start("s-1".to_string(), Vec::new(), Utc::now(), Instant::now());
        assert!(matches!(err, Err(EngineError::InvalidSession(_))));
    }

    #[test]
    fn start_twice_is_invalid() {
        let t0 = Instant::now();
        let mut state = started(2, t0);
        let err = state.start("s-2".to_string(), segs(2), Utc::now(), t0);
        assert!(matches!(err, Err(EngineError::InvalidSession(_))));
    }

    #[test]
    fn elapsed_is_wall_clock_minus_pauses() {
        let t0 = Instant::now();
        let mut state = started(3, t0);

        // 10s active, 5s paused, 10s active, 3s paused, 2s active.
        state.pause(t0 + Duration::from_secs(10)).unwrap();
        state.resume(t0 + Duration::from_secs(15)).unwrap();
        state.pause(t0 + Duration::from_secs(25)).unwrap();
        state.resume(t0 + Duration::from_secs(28)).unwrap();

        let now = t0 + Duration::from_secs(30);
        assert_eq!(state.session_elapsed_ms(now), 22_000);
        assert_eq!(state.paused_ms(now), 8_000);
    }

    #[test]
    fn pause_while_paused_and_resume_while_active_are_reported() {
        let t0 = Instant::now();
        let mut state = started(2, t0);

        assert!(matches!(
            state.resume(t0 + Duration::from_secs(1)),
            Err(EngineError::InvalidTransition { .. })
        ));
        state.pause(t0 + Duration::from_secs(2)).unwrap();
        assert!(matches!(
            state.pause(t0 + Duration::from_secs(3)),
            Err(EngineError::InvalidTransition { .. })
        ));

        // The failed calls must not corrupt the clock.
        state.resume(t0 + Duration::from_secs(5)).unwrap();
        let now = t0 + Duration::from_secs(6);
        assert_eq!(state.session_elapsed_ms(now), 3_000);
    }

    #[test]
    fn clock_frozen_while_paused() {
        let t0 = Instant::now();
        let mut state = started(2, t0);
        state.pause(t0 + Duration::from_secs(4)).unwrap();

        let elapsed_at_pause = state.session_elapsed_ms(t0 + Duration::from_secs(4));
        let elapsed_much_later = state.session_elapsed_ms(t0 + Duration::from_secs(400));
        assert_eq!(elapsed_at_pause, elapsed_much_later);
    }

    #[test]
    fn advance_resets_segment_clock_and_completes_at_end() {
        let t0 = Instant::now();
        let mut state = started(2, t0);

        let t1 = t0 + Duration::from_secs(30);
        assert!(!state.advance(Utc::now(), t1).unwrap());
        assert_eq!(state.current_index, 1);
        assert_eq!(state.segment_elapsed_ms(t1 + Duration::from_secs(5)), 5_000);
        // Session clock keeps running across the transition.
        assert_eq!(state.session_elapsed_ms(t1 + Duration::from_secs(5)), 35_000);

        let t2 = t1 + Duration::from_secs(40);
        assert!(state.advance(Utc::now(), t2).unwrap());
        assert_eq!(state.phase, SessionPhase::Complete);
        assert!(state.completed_at.is_some());
    }

    #[test]
    fn advance_when_complete_is_reported_not_fatal() {
        let t0 = Instant::now();
        let mut state = started(1, t0);
        assert!(state.advance(Utc::now(), t0 + Duration::from_secs(10)).unwrap());

        let err = state.advance(Utc::now(), t0 + Duration::from_secs(11));
        assert!(matches!(err, Err(EngineError::InvalidTransition { .. })));
        assert_eq!(state.phase, SessionPhase::Complete);
        assert_eq!(state.current_index, 1);
    }

    #[test]
    fn force_end_freezes_clocks_mid_pause() {
        let t0 = Instant::now();
        let mut state = started(3, t0);
        state.pause(t0 + Duration::from_secs(10)).unwrap();
        state
            .force_end(Utc::now(), t0 + Duration::from_secs(20))
            .unwrap();

        assert_eq!(state.phase, SessionPhase::Complete);
        let now = t0 + Duration::from_secs(100);
        assert_eq!(state.session_elapsed_ms(now), 10_000);
        assert_eq!(state.paused_ms(now), 10_000);
    }
}
