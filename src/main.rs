// src/main.rs

mod audit;
mod config;
mod pipeline;
mod risk;
mod spatial;
mod tracker;
mod types;

use anyhow::Result;
use audit::TracingAuditSink;
use pipeline::FramePipeline;
use tracing::{info, warn};
use types::{BoundingBox, Config};

fn main() -> Result<()> {
    let config = match Config::load("config.yaml") {
        Ok(config) => config,
        Err(err) => {
            let config = Config::default();
            eprintln!("config.yaml not loaded ({err}), using defaults");
            config
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("sentinel_triage={}", config.logging.level))
        .init();

    info!("🛡️ Sentinel triage core starting");
    info!(
        "Reference frame {}x{}, posture {}, sensitivity {:.2}",
        config.frame.width,
        config.frame.height,
        config.triage.posture.as_str(),
        config.triage.sensitivity
    );

    let mut pipeline = FramePipeline::new(&config, TracingAuditSink);

    // Scripted detection feed standing in for the external detector:
    // a walker crossing the safe zone, a loiterer parked in the restricted
    // corner, and a fall (box collapsing to a wide aspect).
    let frame_period = 1.0 / 30.0;
    for frame_id in 0..90u64 {
        let t = frame_id as f64 * frame_period;
        let detections = synthetic_detections(frame_id);

        let reports = pipeline.process_frame(&detections, t);
        for report in &reports {
            match serde_json::to_string(report) {
                Ok(json) => info!("frame {:>3} {}", frame_id, json),
                Err(err) => warn!("report serialization failed: {err}"),
            }
        }
    }

    let metrics = pipeline.metrics().summary();
    let safety = pipeline.safety_metrics();
    info!("Pipeline metrics: {}", serde_json::to_string(&metrics)?);
    info!("Safety metrics: {}", serde_json::to_string(&safety)?);
    info!("✓ Demo feed complete");

    Ok(())
}

/// Three concurrent synthetic entities, positioned for a 640x480 frame.
fn synthetic_detections(frame_id: u64) -> Vec<BoundingBox> {
    let mut detections = Vec::new();

    // Walker: paces the top half at 8 px/frame, turning around at frame 45
    let phase = (frame_id % 90) as f32;
    let drift = if phase < 45.0 { phase } else { 90.0 - phase } * 8.0;
    detections.push(BoundingBox::new(
        60.0 + drift,
        80.0,
        140.0 + drift,
        210.0,
    ));

    // Loiterer: parked in the bottom-right restricted corner
    detections.push(BoundingBox::new(420.0, 300.0, 480.0, 430.0));

    // Fall: upright until frame 45, then collapses to a wide box
    if frame_id < 45 {
        detections.push(BoundingBox::new(250.0, 90.0, 310.0, 220.0));
    } else {
        detections.push(BoundingBox::new(220.0, 170.0, 370.0, 230.0));
    }

    detections
}
