use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SegmentKind {
    Warmup,
    Run,
    Station,
    Rest,
    Transition,
    Cooldown,
}

impl SegmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentKind::Warmup => "Warmup",
            SegmentKind::Run => "Run",
            SegmentKind::Station => "Station",
            SegmentKind::Rest => "Rest",
            SegmentKind::Transition => "Transition",
            SegmentKind::Cooldown => "Cooldown",
        }
    }
}

/// Equipment station sub-types for `SegmentKind::Station` segments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StationKind {
    SkiErg,
    SledPush,
    SledPull,
    BurpeeBroadJump,
    Rowing,
    FarmersCarry,
    SandbagLunge,
    WallBall,
}

impl StationKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            StationKind::SkiErg => "SkiErg",
            StationKind::SledPush => "Sled Push",
            StationKind::SledPull => "Sled Pull",
            StationKind::BurpeeBroadJump => "Burpee Broad Jump",
            StationKind::Rowing => "Rowing",
            StationKind::FarmersCarry => "Farmers Carry",
            StationKind::SandbagLunge => "Sandbag Lunge",
            StationKind::WallBall => "Wall Ball",
        }
    }
}

/// One planned unit of work in the circuit.
///
/// Segments are read-only templates once a session starts; measured results
/// are recorded separately so the original plan is preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub index: usize,
    pub kind: SegmentKind,
    pub station: Option<StationKind>,
    pub target_duration_secs: Option<u64>,
    pub target_distance_m: Option<f64>,
    pub target_reps: Option<u32>,
    pub target_pace: Option<String>,
    pub notes: Option<String>,
}

impl Segment {
    pub fn new(index: usize, kind: SegmentKind) -> Self {
        Self {
            index,
            kind,
            station: None,
            target_duration_secs: None,
            target_distance_m: None,
            target_reps: None,
            target_pace: None,
            notes: None,
        }
    }

    pub fn with_station(mut self, station: StationKind) -> Self {
        self.station = Some(station);
        self
    }

    pub fn with_target_duration(mut self, secs: u64) -> Self {
        self.target_duration_secs = Some(secs);
        self
    }

    pub fn with_target_distance(mut self, meters: f64) -> Self {
        self.target_distance_m = Some(meters);
        self
    }

    pub fn with_target_reps(mut self, reps: u32) -> Self {
        self.target_reps = Some(reps);
        self
    }

    /// Display label: station name for stations, kind name otherwise.
    pub fn name(&self) -> String {
        match (self.kind, self.station) {
            (SegmentKind::Station, Some(station)) => station.display_name().to_string(),
            (kind, _) => kind.as_str().to_string(),
        }
    }
}
