//! Accelerated demo session driven by the simulated sensor adapter.
//!
//! Runs a short HYROX-style plan, pausing once and skipping one segment so
//! the whole command surface gets exercised, then prints the summary.
//! `RUST_LOG=debug` shows dropped GPS fixes and loop shutdown.

use anyhow::Result;
use log::info;
use tokio::time::{sleep, Duration};

use circuitline::{
    EngineConfig, EngineEvent, Segment, SegmentKind, SimulatedSensors, StationKind, WorkoutEngine,
};

fn demo_plan() -> Vec<Segment> {
    vec![
        Segment::new(0, SegmentKind::Warmup).with_target_duration(8),
        Segment::new(1, SegmentKind::Run)
            .with_target_distance(60.0)
            .with_target_duration(12),
        Segment::new(2, SegmentKind::Station)
            .with_station(StationKind::SledPush)
            .with_target_reps(10)
            .with_target_duration(10),
        Segment::new(3, SegmentKind::Rest).with_target_duration(6),
        Segment::new(4, SegmentKind::Run)
            .with_target_distance(60.0)
            .with_target_duration(12),
        Segment::new(5, SegmentKind::Cooldown).with_target_duration(6),
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("circuitline demo session starting...");

    let engine = WorkoutEngine::new(Box::new(SimulatedSensors::new()), EngineConfig::default());

    let mut events = engine.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                EngineEvent::Feedback { signal } => info!("feedback: {signal:?}"),
                EngineEvent::SegmentCompleted { result } => info!(
                    "segment {} completed in {:.1}s",
                    result.segment_index, result.duration_secs
                ),
                EngineEvent::InsightsUpdated { insights } => {
                    for insight in &insights {
                        info!("insight [{:?}]: {}", insight.kind, insight.text);
                    }
                }
                _ => {}
            }
        }
    });

    let plan = demo_plan();
    let total = plan.len();
    engine.start(plan).await?;

    for _ in 0..total {
        let snapshot = engine.snapshot().await;
        let Some(segment) = snapshot.current_segment.clone() else {
            break;
        };
        info!(
            "segment {}/{}: {} ({:.0}% overall, projected finish {:.0}s)",
            snapshot.current_index + 1,
            total,
            segment.name(),
            snapshot.overall_progress * 100.0,
            snapshot.projection.projected_finish_secs
        );

        match segment.kind {
            SegmentKind::Station => {
                for _ in 0..segment.target_reps.unwrap_or(10) {
                    engine.increment_rep().await?;
                    sleep(Duration::from_millis(700)).await;
                }
                engine.complete_current_segment().await?;
            }
            SegmentKind::Rest => {
                // Demonstrate the frozen clock across a pause.
                engine.pause().await?;
                sleep(Duration::from_secs(2)).await;
                engine.resume().await?;
                sleep(Duration::from_secs(2)).await;
                engine.skip_current_segment().await?;
            }
            _ => {
                sleep(Duration::from_secs(
                    segment.target_duration_secs.unwrap_or(6),
                ))
                .await;
                engine.complete_current_segment().await?;
            }
        }
    }

    if let Some(summary) = engine.summary().await {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
