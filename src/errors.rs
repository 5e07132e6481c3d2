use thiserror::Error;

use crate::session::SessionPhase;

/// Errors surfaced by the session engine.
///
/// State-machine violations are advisory: user input races with sensor timing
/// are expected, so callers get a `Result` they can log or ignore, and the
/// engine itself never panics on them.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The session cannot start (empty segment list, or already started).
    #[error("invalid session: {0}")]
    InvalidSession(String),

    /// An action was called from a phase that does not permit it.
    #[error("cannot {action} while {phase:?}")]
    InvalidTransition {
        action: &'static str,
        phase: SessionPhase,
    },

    /// A sensor reading was rejected (bad accuracy, non-finite values).
    /// Swallowed inside the engine loop; never surfaced per event.
    #[error("sensor data rejected: {0}")]
    SensorDataRejected(String),
}

impl EngineError {
    pub(crate) fn invalid_transition(action: &'static str, phase: SessionPhase) -> Self {
        Self::InvalidTransition { action, phase }
    }
}
