use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::insights::Insight;
use crate::models::{SegmentResult, WorkoutSummary};
use crate::session::SessionPhase;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Fire-and-forget classification for the platform feedback layer (haptics,
/// chimes). The engine emits these alongside state transitions and never
/// waits on their consumers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FeedbackSignal {
    SegmentStart,
    SegmentComplete,
    RepComplete,
    HeartRateWarning,
    WorkoutComplete,
}

/// Change notifications for the display layer. Consumers subscribe and poll
/// read accessors for detail; missing an event is harmless since every
/// accessor recomputes from current state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EngineEvent {
    StateChanged {
        phase: SessionPhase,
        current_index: usize,
    },
    SegmentCompleted {
        result: SegmentResult,
    },
    InsightsUpdated {
        insights: Vec<Insight>,
    },
    SummaryReady {
        summary: WorkoutSummary,
    },
    Feedback {
        signal: FeedbackSignal,
    },
}

/// Broadcast fan-out for engine events. Sends are lossy by design: with no
/// subscribers, or a lagging subscriber, events are dropped rather than
/// blocking the engine.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    pub(crate) fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }

    pub(crate) fn emit_feedback(&self, signal: FeedbackSignal) {
        self.emit(EngineEvent::Feedback { signal });
    }

    pub(crate) fn emit_state_changed(&self, phase: SessionPhase, current_index: usize) {
        self.emit(EngineEvent::StateChanged {
            phase,
            current_index,
        });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
