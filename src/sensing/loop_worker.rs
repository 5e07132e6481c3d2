use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Mutex};
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::session::controller::EngineCore;

use super::adapter::SensorEvent;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

/// The engine's single serialization point.
///
/// One periodic ticker drives clock-derived recomputation and periodic
/// insight regeneration; sensor events arrive on the channel at their own
/// cadence. Both funnel through the same select loop and the same core lock,
/// so each stream is processed strictly in arrival order and no mutation
/// happens off this path besides the command surface sharing the lock.
pub(crate) async fn engine_loop(
    core: Arc<Mutex<EngineCore>>,
    mut events: mpsc::Receiver<SensorEvent>,
    cancel_token: CancellationToken,
    tick_interval: Duration,
    insight_every_ticks: u32,
) {
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut ticks: u32 = 0;
    let mut events_open = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let mut guard = core.lock().await;
                guard.on_tick(tick_interval.as_secs_f64());
                ticks = ticks.wrapping_add(1);
                if insight_every_ticks > 0 && ticks % insight_every_ticks == 0 {
                    guard.refresh_insights(Instant::now());
                }
            }
            maybe_event = events.recv(), if events_open => {
                match maybe_event {
                    Some(event) => core.lock().await.apply_sensor_event(event),
                    None => {
                        // Adapter dropped its sender; keep ticking so the
                        // clock and insights stay live.
                        events_open = false;
                        log_info!("sensor event channel closed");
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("engine loop shutting down");
                break;
            }
        }
    }
}
