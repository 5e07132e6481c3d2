use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// One heart-rate sample as delivered by the platform sensor layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRateSample {
    pub bpm: u32,
    pub at: DateTime<Utc>,
}

/// One location fix as delivered by the platform location layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
    pub timestamp: DateTime<Utc>,
    pub speed_mps: f64,
    pub horizontal_accuracy_m: f64,
}

#[derive(Debug, Clone)]
pub enum SensorEvent {
    HeartRate(HeartRateSample),
    Location(LocationFix),
}

/// Abstraction over the two asynchronous sensor streams the engine consumes.
///
/// `start` hands the adapter a channel to push events into; `stop` must stop
/// delivery before returning so no late callback reaches a torn-down session.
pub trait SensorAdapter: Send {
    fn start(&mut self, events: mpsc::Sender<SensorEvent>) -> Result<()>;
    fn stop(&mut self);
}

type SenderSlot = Arc<Mutex<Option<mpsc::Sender<SensorEvent>>>>;

/// Channel-backed adapter realizing the platform callback contract.
///
/// The host keeps the [`SensorHandle`] and invokes the callbacks from
/// whatever thread its sensor APIs use; events funnel into the engine loop's
/// channel. Once the adapter is stopped the callbacks become no-ops.
pub struct ChannelSensors {
    slot: SenderSlot,
}

#[derive(Clone)]
pub struct SensorHandle {
    slot: SenderSlot,
}

impl ChannelSensors {
    pub fn new() -> (Self, SensorHandle) {
        let slot: SenderSlot = Arc::new(Mutex::new(None));
        (
            Self {
                slot: Arc::clone(&slot),
            },
            SensorHandle { slot },
        )
    }
}

impl SensorAdapter for ChannelSensors {
    fn start(&mut self, events: mpsc::Sender<SensorEvent>) -> Result<()> {
        let mut guard = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.is_some() {
            bail!("sensor delivery already active");
        }
        *guard = Some(events);
        Ok(())
    }

    fn stop(&mut self) {
        let mut guard = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = None;
    }
}

impl SensorHandle {
    pub fn on_heart_rate_sample(&self, bpm: u32, at: DateTime<Utc>) {
        self.send(SensorEvent::HeartRate(HeartRateSample { bpm, at }));
    }

    pub fn on_location_fix(&self, fix: LocationFix) {
        self.send(SensorEvent::Location(fix));
    }

    fn send(&self, event: SensorEvent) {
        let guard = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(tx) = guard.as_ref() {
            // A saturated engine drops the event rather than blocking the
            // platform callback thread.
            let _ = tx.try_send(event);
        }
    }
}
