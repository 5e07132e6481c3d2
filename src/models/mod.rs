mod result;
mod segment;

pub use result::{CompromisedRun, SegmentResult, WorkoutSummary};
pub use segment::{Segment, SegmentKind, StationKind};
