use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::session::controller::EngineCore;

use super::adapter::SensorAdapter;
use super::loop_worker::engine_loop;

const SENSOR_CHANNEL_CAPACITY: usize = 256;

/// Owns the sensor adapter and the engine loop task for one session.
pub(crate) struct SensorRuntime {
    adapter: Box<dyn SensorAdapter>,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl SensorRuntime {
    pub fn new(adapter: Box<dyn SensorAdapter>) -> Self {
        Self {
            adapter,
            handle: None,
            cancel_token: None,
        }
    }

    pub fn start(
        &mut self,
        core: Arc<Mutex<EngineCore>>,
        tick_interval: Duration,
        insight_every_ticks: u32,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("engine loop already active");
        }

        let (events_tx, events_rx) = mpsc::channel(SENSOR_CHANNEL_CAPACITY);
        self.adapter.start(events_tx)?;

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let handle = tokio::spawn(engine_loop(
            core,
            events_rx,
            token_clone,
            tick_interval,
            insight_every_ticks,
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Stop sensor delivery first, then cancel and join the loop, so a late
    /// callback cannot mutate a torn-down session.
    pub async fn stop(&mut self) -> Result<()> {
        self.adapter.stop();

        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("engine loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}
