//! circuitline: a live session engine for timed circuit workouts.
//!
//! The engine tracks a structured, multi-segment workout (runs, equipment
//! stations, rest and transition periods) in real time: a segment state
//! machine with pause/resume and skip, a live-metric aggregator fed by
//! heart-rate and location sensors, finish-time projection, rule-based
//! insights, and an immutable end-of-session summary.
//!
//! Construction is dependency-injected: callers hand the engine a
//! [`sensing::SensorAdapter`] and a segment catalog, subscribe for change
//! notifications, and drive the session through the [`WorkoutEngine`]
//! command surface.

pub mod config;
pub mod errors;
pub mod events;
pub mod insights;
pub mod metrics;
pub mod models;
pub mod progress;
pub mod sensing;
pub mod session;
pub mod summary;
mod utils;

pub use config::{AthleteProfile, EngineConfig};
pub use errors::EngineError;
pub use events::{EngineEvent, EventBus, FeedbackSignal};
pub use insights::{Insight, InsightConfig, InsightKind};
pub use metrics::{AggregatorConfig, MetricsSnapshot};
pub use models::{
    CompromisedRun, Segment, SegmentKind, SegmentResult, StationKind, WorkoutSummary,
};
pub use progress::Projection;
pub use sensing::{
    ChannelSensors, HeartRateSample, LocationFix, SensorAdapter, SensorEvent, SensorHandle,
    SimulatedSensors,
};
pub use session::{EngineSnapshot, SessionPhase, WorkoutEngine};
pub use summary::SummaryConfig;
