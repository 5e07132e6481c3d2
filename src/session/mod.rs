pub(crate) mod controller;
pub mod state;

pub use controller::{EngineSnapshot, WorkoutEngine};
pub use state::{SessionPhase, SessionState};
