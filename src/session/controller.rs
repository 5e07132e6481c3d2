use std::{sync::Arc, time::Instant};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tokio::time::Duration;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::events::{EngineEvent, EventBus, FeedbackSignal};
use crate::insights::{evaluate, Insight, InsightContext};
use crate::metrics::{LiveMetrics, MetricsSnapshot};
use crate::models::{Segment, SegmentKind, SegmentResult, WorkoutSummary};
use crate::progress::{overall_progress, project_finish, segment_progress, Projection};
use crate::sensing::controller::SensorRuntime;
use crate::sensing::{SensorAdapter, SensorEvent};
use crate::summary::build_summary;

use super::state::{SessionPhase, SessionState};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Read-only view of the whole engine, safe to poll at any rate: everything
/// here is recomputed from the two mutable stores on each call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub session_id: String,
    pub phase: SessionPhase,
    pub current_index: usize,
    pub current_segment: Option<Segment>,
    pub segment_elapsed_secs: f64,
    pub session_elapsed_secs: f64,
    pub paused_secs: f64,
    pub segment_progress: f64,
    pub overall_progress: f64,
    pub projection: Projection,
    pub metrics: MetricsSnapshot,
    pub insights: Vec<Insight>,
    pub segments_completed: usize,
}

/// Shared mutable core: the session state machine plus the live aggregator.
/// All mutation funnels through the engine loop and the command surface,
/// which share this structure behind one async lock.
pub(crate) struct EngineCore {
    state: SessionState,
    metrics: LiveMetrics,
    insights: Vec<Insight>,
    summary: Option<WorkoutSummary>,
    config: EngineConfig,
    events: EventBus,
}

impl EngineCore {
    fn new(config: EngineConfig, events: EventBus) -> Self {
        let metrics = LiveMetrics::new(
            config.aggregator.clone(),
            config.athlete.max_heart_rate,
            config.athlete.weight_kg,
        );
        Self {
            state: SessionState::new(),
            metrics,
            insights: Vec::new(),
            summary: None,
            config,
            events,
        }
    }

    pub(crate) fn apply_sensor_event(&mut self, event: SensorEvent) {
        if !self.state.is_live() {
            return;
        }
        match event {
            SensorEvent::HeartRate(sample) => self.metrics.record_heart_rate(sample.bpm),
            SensorEvent::Location(fix) => {
                if let Err(err) = self.metrics.record_location(&fix) {
                    // Routine GPS noise; swallowed, never surfaced per event.
                    log_debug!("dropped location fix: {err}");
                }
            }
        }
    }

    pub(crate) fn on_tick(&mut self, dt_secs: f64) {
        if self.state.phase == SessionPhase::Active {
            self.metrics.on_active_tick(dt_secs);
        }
    }

    pub(crate) fn refresh_insights(&mut self, now: Instant) {
        if !self.state.is_live() {
            return;
        }

        let run_paces = self.completed_run_paces();
        let segment_elapsed = self.state.segment_elapsed_ms(now) as f64 / 1_000.0;
        let session_elapsed = self.state.session_elapsed_ms(now) as f64 / 1_000.0;
        let projection = project_finish(&self.state, segment_elapsed, session_elapsed);

        let ctx = InsightContext {
            run_paces: &run_paces,
            next_segment: self.state.segments.get(self.state.current_index + 1),
            projection: &projection,
            rolling_avg_heart_rate: self.metrics.rolling_avg_heart_rate(),
            max_heart_rate: self.config.athlete.max_heart_rate,
            strong_stations: &self.config.athlete.strong_stations,
            zone_secs: self.metrics.zone_secs(),
        };
        let fresh = evaluate(&ctx, &self.config.insights);

        let had_hr_warning = self.insights.iter().any(|i| i.category == "heart-rate");
        let has_hr_warning = fresh.iter().any(|i| i.category == "heart-rate");
        if has_hr_warning && !had_hr_warning {
            self.events.emit_feedback(FeedbackSignal::HeartRateWarning);
        }

        self.insights = fresh;
        self.events.emit(EngineEvent::InsightsUpdated {
            insights: self.insights.clone(),
        });
    }

    fn start(&mut self, segments: Vec<Segment>, now: Instant) -> Result<(), EngineError> {
        let session_id = Uuid::new_v4().to_string();
        self.state.start(session_id, segments, Utc::now(), now)?;
        self.events
            .emit_state_changed(self.state.phase, self.state.current_index);
        self.events.emit_feedback(FeedbackSignal::SegmentStart);
        Ok(())
    }

    fn pause(&mut self, now: Instant) -> Result<(), EngineError> {
        self.state.pause(now)?;
        self.events
            .emit_state_changed(self.state.phase, self.state.current_index);
        Ok(())
    }

    fn resume(&mut self, now: Instant) -> Result<(), EngineError> {
        self.state.resume(now)?;
        self.events
            .emit_state_changed(self.state.phase, self.state.current_index);
        Ok(())
    }

    /// Returns the recorded result plus whether the session just finished.
    fn complete_current_segment(
        &mut self,
        now: Instant,
    ) -> Result<(SegmentResult, bool), EngineError> {
        if !self.state.is_live() {
            return Err(EngineError::invalid_transition(
                "complete segment",
                self.state.phase,
            ));
        }

        let duration_secs = self.state.segment_elapsed_ms(now) as f64 / 1_000.0;
        let scope = self.metrics.finalize_segment();
        let result = SegmentResult {
            segment_index: self.state.current_index,
            duration_secs,
            distance_m: (scope.distance_m > 0.0).then_some(scope.distance_m),
            reps: (scope.reps > 0).then_some(scope.reps),
            avg_heart_rate: scope.avg_heart_rate,
            peak_heart_rate: scope.peak_heart_rate,
        };
        self.state.record_result(result.clone());

        let finished = self.state.advance(Utc::now(), now)?;
        self.events.emit(EngineEvent::SegmentCompleted {
            result: result.clone(),
        });
        self.events.emit_feedback(FeedbackSignal::SegmentComplete);

        if finished {
            self.finish_session(now);
        } else {
            self.events
                .emit_state_changed(self.state.phase, self.state.current_index);
            self.events.emit_feedback(FeedbackSignal::SegmentStart);
            self.refresh_insights(now);
        }
        Ok((result, finished))
    }

    /// Deliberate bypass of a planned segment: advances the index but records
    /// no result, so projection never sees it as a completion.
    fn skip_current_segment(&mut self, now: Instant) -> Result<bool, EngineError> {
        if !self.state.is_live() {
            return Err(EngineError::invalid_transition(
                "skip segment",
                self.state.phase,
            ));
        }

        // Discard the segment scope so the next segment starts clean.
        let _ = self.metrics.finalize_segment();
        self.state.record_skip(self.state.current_index);
        let finished = self.state.advance(Utc::now(), now)?;

        if finished {
            self.finish_session(now);
        } else {
            self.events
                .emit_state_changed(self.state.phase, self.state.current_index);
            self.events.emit_feedback(FeedbackSignal::SegmentStart);
            self.refresh_insights(now);
        }
        Ok(finished)
    }

    fn increment_rep(&mut self) -> Result<u32, EngineError> {
        if !self.state.is_live() {
            return Err(EngineError::invalid_transition(
                "increment rep",
                self.state.phase,
            ));
        }
        let reps = self.metrics.increment_rep();
        self.events.emit_feedback(FeedbackSignal::RepComplete);
        Ok(reps)
    }

    fn end(&mut self, now: Instant) -> Result<WorkoutSummary, EngineError> {
        self.state.force_end(Utc::now(), now)?;
        self.finish_session(now);
        // finish_session always stores a summary right before this point.
        self.summary
            .clone()
            .ok_or_else(|| EngineError::InvalidSession("summary missing after end".to_string()))
    }

    fn finish_session(&mut self, now: Instant) {
        let summary = build_summary(
            &self.state,
            &self.metrics,
            self.config.athlete.max_heart_rate,
            &self.config.summary,
            now,
        );
        self.summary = Some(summary.clone());
        self.insights.clear();
        self.events
            .emit_state_changed(self.state.phase, self.state.current_index);
        self.events.emit_feedback(FeedbackSignal::WorkoutComplete);
        self.events.emit(EngineEvent::SummaryReady { summary });
    }

    /// Paces (secs/km) of completed run segments, in completion order.
    fn completed_run_paces(&self) -> Vec<f64> {
        self.state
            .results
            .iter()
            .filter(|r| {
                self.state
                    .segments
                    .get(r.segment_index)
                    .is_some_and(|s| s.kind == SegmentKind::Run)
            })
            .filter_map(|r| {
                let distance = r.distance_m?;
                if distance < self.config.aggregator.min_pace_distance_m {
                    return None;
                }
                Some(r.duration_secs / (distance / 1_000.0))
            })
            .collect()
    }

    fn snapshot(&self, now: Instant) -> EngineSnapshot {
        let segment_elapsed = self.state.segment_elapsed_ms(now) as f64 / 1_000.0;
        let session_elapsed = self.state.session_elapsed_ms(now) as f64 / 1_000.0;
        let seg_progress = self
            .state
            .current_segment()
            .map(|segment| {
                segment_progress(
                    segment,
                    self.metrics.segment_distance_m(),
                    self.metrics.segment_reps(),
                    segment_elapsed,
                )
            })
            .unwrap_or(0.0);

        EngineSnapshot {
            session_id: self.state.session_id.clone(),
            phase: self.state.phase,
            current_index: self.state.current_index,
            current_segment: self.state.current_segment().cloned(),
            segment_elapsed_secs: segment_elapsed,
            session_elapsed_secs: session_elapsed,
            paused_secs: self.state.paused_ms(now) as f64 / 1_000.0,
            segment_progress: seg_progress,
            overall_progress: overall_progress(&self.state, seg_progress),
            projection: project_finish(&self.state, segment_elapsed, session_elapsed),
            metrics: self.metrics.snapshot(segment_elapsed),
            insights: self.insights.clone(),
            segments_completed: self.state.results.len(),
        }
    }
}

/// Command surface and lifecycle owner for one workout session.
///
/// Construction injects the sensor adapter and configuration; the engine
/// never reaches into ambient global state. Cloning shares the same session.
#[derive(Clone)]
pub struct WorkoutEngine {
    core: Arc<Mutex<EngineCore>>,
    runtime: Arc<Mutex<SensorRuntime>>,
    events: EventBus,
    tick_interval: Duration,
    insight_every_ticks: u32,
}

impl WorkoutEngine {
    pub fn new(adapter: Box<dyn SensorAdapter>, config: EngineConfig) -> Self {
        let events = EventBus::new();
        let tick_interval = Duration::from_millis(config.tick_interval_ms);
        let insight_every_ticks = config.insight_every_ticks;
        Self {
            core: Arc::new(Mutex::new(EngineCore::new(config, events.clone()))),
            runtime: Arc::new(Mutex::new(SensorRuntime::new(adapter))),
            events,
            tick_interval,
            insight_every_ticks,
        }
    }

    /// Subscribe to engine change notifications and feedback signals.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Begin the session: enters the first segment, starts sensor delivery
    /// and spawns the engine loop.
    pub async fn start(&self, segments: Vec<Segment>) -> Result<(), EngineError> {
        let mut runtime = self.runtime.lock().await;
        {
            let mut core = self.core.lock().await;
            core.start(segments, Instant::now())?;
        }

        runtime
            .start(
                Arc::clone(&self.core),
                self.tick_interval,
                self.insight_every_ticks,
            )
            .map_err(|err| {
                EngineError::InvalidSession(format!("sensor runtime failed to start: {err}"))
            })?;

        log_info!("workout session started");
        Ok(())
    }

    pub async fn pause(&self) -> Result<(), EngineError> {
        let mut core = self.core.lock().await;
        core.pause(Instant::now()).map_err(|err| {
            log_warn!("pause rejected: {err}");
            err
        })
    }

    pub async fn resume(&self) -> Result<(), EngineError> {
        let mut core = self.core.lock().await;
        core.resume(Instant::now()).map_err(|err| {
            log_warn!("resume rejected: {err}");
            err
        })
    }

    /// Finalize the current segment's result and move to the next one. When
    /// the last segment completes, the session finishes and the sensor
    /// runtime is stopped before returning.
    pub async fn complete_current_segment(&self) -> Result<SegmentResult, EngineError> {
        let (result, finished) = {
            let mut core = self.core.lock().await;
            core.complete_current_segment(Instant::now())?
        };
        if finished {
            self.shutdown_runtime().await;
        }
        Ok(result)
    }

    pub async fn skip_current_segment(&self) -> Result<(), EngineError> {
        let finished = {
            let mut core = self.core.lock().await;
            core.skip_current_segment(Instant::now())?
        };
        if finished {
            self.shutdown_runtime().await;
        }
        Ok(())
    }

    /// One discrete "rep observed" event; returns the segment's new count.
    pub async fn increment_rep(&self) -> Result<u32, EngineError> {
        let mut core = self.core.lock().await;
        core.increment_rep()
    }

    /// Force-terminate the session and return the summary for whatever was
    /// completed. Sensor delivery and the engine loop are stopped before this
    /// returns.
    pub async fn end(&self) -> Result<WorkoutSummary, EngineError> {
        let summary = {
            let mut core = self.core.lock().await;
            core.end(Instant::now())?
        };
        self.shutdown_runtime().await;
        log_info!(
            "workout session ended: {}/{} segments completed",
            summary.segments_completed,
            summary.total_segments
        );
        Ok(summary)
    }

    pub async fn snapshot(&self) -> EngineSnapshot {
        let core = self.core.lock().await;
        core.snapshot(Instant::now())
    }

    /// The terminal summary, present once the session has finished.
    pub async fn summary(&self) -> Option<WorkoutSummary> {
        let core = self.core.lock().await;
        core.summary.clone()
    }

    pub async fn insights(&self) -> Vec<Insight> {
        let core = self.core.lock().await;
        core.insights.clone()
    }

    async fn shutdown_runtime(&self) {
        let mut runtime = self.runtime.lock().await;
        if let Err(err) = runtime.stop().await {
            log_warn!("sensor runtime shutdown failed: {err:?}");
        }
    }
}
