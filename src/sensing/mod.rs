pub mod adapter;
pub(crate) mod controller;
pub(crate) mod loop_worker;
pub mod simulated;

pub use adapter::{
    ChannelSensors, HeartRateSample, LocationFix, SensorAdapter, SensorEvent, SensorHandle,
};
pub use simulated::SimulatedSensors;
