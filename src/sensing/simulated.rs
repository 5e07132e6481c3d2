use anyhow::{bail, Result};
use chrono::Utc;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::adapter::{HeartRateSample, LocationFix, SensorAdapter, SensorEvent};

const SAMPLE_INTERVAL_MS: u64 = 500;

/// Synthetic sensor streams for the demo binary: a wandering heart rate and
/// a GPS track heading north at roughly running pace, with the occasional
/// poor-accuracy fix so the engine's rejection path gets exercised.
pub struct SimulatedSensors {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl SimulatedSensors {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }
}

impl Default for SimulatedSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorAdapter for SimulatedSensors {
    fn start(&mut self, events: mpsc::Sender<SensorEvent>) -> Result<()> {
        if self.handle.is_some() {
            bail!("simulation already active");
        }

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let handle = tokio::spawn(simulation_loop(events, token_clone));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn simulation_loop(events: mpsc::Sender<SensorEvent>, cancel_token: CancellationToken) {
    let mut ticker = tokio::time::interval(Duration::from_millis(SAMPLE_INTERVAL_MS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut rng = StdRng::from_entropy();
    let mut bpm: f64 = 120.0;
    let mut latitude: f64 = 45.5000;
    let longitude: f64 = -73.5800;
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tick += 1;

                // Heart rate drifts upward over the session with some jitter.
                bpm += 0.05 + rng.gen_range(-2.0..2.0);
                bpm = bpm.clamp(90.0, 195.0);
                let sample = HeartRateSample {
                    bpm: bpm.round() as u32,
                    at: Utc::now(),
                };
                if events.send(SensorEvent::HeartRate(sample)).await.is_err() {
                    break;
                }

                // One fix per second; about 1 in 12 arrives with accuracy
                // bad enough to be dropped by the aggregator.
                if tick % 2 == 0 {
                    let speed = rng.gen_range(2.6..3.4);
                    latitude += speed * (SAMPLE_INTERVAL_MS as f64 * 2.0 / 1_000.0) / 111_000.0;
                    let accuracy = if rng.gen_ratio(1, 12) {
                        rng.gen_range(60.0..120.0)
                    } else {
                        rng.gen_range(4.0..18.0)
                    };
                    let fix = LocationFix {
                        latitude,
                        longitude,
                        altitude_m: 30.0 + rng.gen_range(-1.0..1.0),
                        timestamp: Utc::now(),
                        speed_mps: speed,
                        horizontal_accuracy_m: accuracy,
                    };
                    if events.send(SensorEvent::Location(fix)).await.is_err() {
                        break;
                    }
                }
            }
            _ = cancel_token.cancelled() => break,
        }
    }
}
