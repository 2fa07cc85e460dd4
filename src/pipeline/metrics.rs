// src/pipeline/metrics.rs
//
// Frame pipeline observability. Atomic counters per subsystem outcome,
// exported as a serializable summary for the operator surface or logs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub total_frames: Arc<AtomicU64>,
    pub paused_frames: Arc<AtomicU64>,
    pub entities_scored: Arc<AtomicU64>,
    pub proceeds: Arc<AtomicU64>,
    pub warns: Arc<AtomicU64>,
    pub abstains: Arc<AtomicU64>,
    pub escalations: Arc<AtomicU64>,
    pub evicted_tracks: Arc<AtomicU64>,
    pub dropped_detections: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: Arc::new(AtomicU64::new(0)),
            paused_frames: Arc::new(AtomicU64::new(0)),
            entities_scored: Arc::new(AtomicU64::new(0)),
            proceeds: Arc::new(AtomicU64::new(0)),
            warns: Arc::new(AtomicU64::new(0)),
            abstains: Arc::new(AtomicU64::new(0)),
            escalations: Arc::new(AtomicU64::new(0)),
            evicted_tracks: Arc::new(AtomicU64::new(0)),
            dropped_detections: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fps(&self) -> f64 {
        let frames = self.total_frames.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames.load(Ordering::Relaxed),
            paused_frames: self.paused_frames.load(Ordering::Relaxed),
            entities_scored: self.entities_scored.load(Ordering::Relaxed),
            proceeds: self.proceeds.load(Ordering::Relaxed),
            warns: self.warns.load(Ordering::Relaxed),
            abstains: self.abstains.load(Ordering::Relaxed),
            escalations: self.escalations.load(Ordering::Relaxed),
            evicted_tracks: self.evicted_tracks.load(Ordering::Relaxed),
            dropped_detections: self.dropped_detections.load(Ordering::Relaxed),
            fps: self.fps(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub paused_frames: u64,
    pub entities_scored: u64,
    pub proceeds: u64,
    pub warns: u64,
    pub abstains: u64,
    pub escalations: u64,
    pub evicted_tracks: u64,
    pub dropped_detections: u64,
    pub fps: f64,
    pub elapsed_secs: f64,
}
