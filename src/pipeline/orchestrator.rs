// src/pipeline/orchestrator.rs
//
// Per-frame coordination: detections -> Tracker -> SpatialContext ->
// RiskScorer -> RiskMemory -> AbstentionEngine, with escalations forwarded
// to the audit sink and one report emitted per tracked identity.
//
// The pipeline owns every piece of per-identity state behind &mut self.
// Frames must arrive in order from a single caller; run one pipeline per
// camera stream and wrap it in a lock if callers are concurrent.

use crate::audit::{AuditSink, EscalationRecord};
use crate::pipeline::metrics::PipelineMetrics;
use crate::risk::{AbstentionEngine, RiskMemory, RiskScorer};
use crate::spatial::SpatialContext;
use crate::tracker::Tracker;
use crate::types::{BoundingBox, Config, Decision, EntityReport, SecurityPosture, Signature};
use tracing::{info, warn};

pub struct FramePipeline<S: AuditSink> {
    tracker: Tracker,
    spatial: SpatialContext,
    scorer: RiskScorer,
    memory: RiskMemory,
    abstention: AbstentionEngine,
    audit: S,
    metrics: PipelineMetrics,
    track_ttl_seconds: f64,
    posture: SecurityPosture,
    sensitivity: f32,
    paused: bool,
}

impl<S: AuditSink> FramePipeline<S> {
    pub fn new(config: &Config, audit: S) -> Self {
        Self {
            tracker: Tracker::new(
                config.tracking.distance_threshold,
                config.tracking.trail_capacity,
            ),
            spatial: SpatialContext::new(config.frame.width, config.frame.height),
            scorer: RiskScorer::new(),
            memory: RiskMemory::new(),
            abstention: AbstentionEngine::new(),
            audit,
            metrics: PipelineMetrics::new(),
            track_ttl_seconds: config.tracking.track_ttl_seconds,
            posture: config.triage.posture,
            sensitivity: config.triage.sensitivity.max(0.0),
            paused: false,
        }
    }

    /// Process one frame's detections. Returns one report per tracked
    /// identity; empty while paused.
    pub fn process_frame(
        &mut self,
        detections: &[BoundingBox],
        timestamp: f64,
    ) -> Vec<EntityReport> {
        if self.paused {
            self.metrics.inc(&self.metrics.paused_frames);
            return Vec::new();
        }
        self.metrics.inc(&self.metrics.total_frames);

        for id in self.tracker.evict_idle(timestamp, self.track_ttl_seconds) {
            self.scorer.remove(&id);
            self.memory.remove(&id);
            self.metrics.inc(&self.metrics.evicted_tracks);
        }

        // Malformed boxes drop that detection, never the whole frame
        let mut finite = Vec::with_capacity(detections.len());
        for det in detections {
            if det.is_finite() {
                finite.push(*det);
            } else {
                warn!("Dropping non-finite detection {:?}", det);
                self.metrics.inc(&self.metrics.dropped_detections);
            }
        }

        let assignments = self.tracker.update(&finite, timestamp);
        let mut reports = Vec::with_capacity(assignments.len());

        for assignment in assignments {
            let zone = self.spatial.classify_zone(&assignment.bbox);
            let pose = self.spatial.estimate_pose(&assignment.bbox);

            let assessment = self.scorer.assess(
                &assignment.id,
                assignment.prev_box.as_ref(),
                &assignment.bbox,
                zone,
                pose,
                self.posture,
                timestamp,
            );

            let (score, state) = self.memory.update(
                &assignment.id,
                assessment.risk * self.sensitivity,
                timestamp,
            );
            let (decision, prediction) = self.abstention.decide(score, assessment.confidence);

            let risk_score = round3(score);
            let rationale = rationale_for(decision, assessment.primary);

            self.metrics.inc(&self.metrics.entities_scored);
            self.metrics.inc(match decision {
                Decision::Proceed => &self.metrics.proceeds,
                Decision::Warn => &self.metrics.warns,
                Decision::AbstainEscalate => &self.metrics.abstains,
            });

            if decision != Decision::Proceed {
                self.audit.record(&EscalationRecord::new(
                    assignment.id.clone(),
                    assessment.primary,
                    risk_score,
                    decision,
                    rationale.clone(),
                ));
                self.metrics.inc(&self.metrics.escalations);
            }

            reports.push(EntityReport {
                identity: assignment.id.clone(),
                risk_score,
                confidence: round2(assessment.confidence),
                decision,
                state,
                signature: assessment.primary,
                hypotheses: assessment.hypotheses,
                rationale,
                prediction,
                pattern: assessment.pattern,
                trail: self.tracker.trail_of(&assignment.id),
            });
        }

        reports
    }

    pub fn set_posture(&mut self, posture: SecurityPosture) {
        info!("Security posture -> {}", posture.as_str());
        self.posture = posture;
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity.max(0.0);
        info!("Sensitivity -> {:.2}", self.sensitivity);
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Operator reset: clears risk memory and behavior counters. Tracker
    /// identity assignments survive so re-observed entities keep their ids.
    pub fn reset(&mut self) {
        self.memory.reset();
        self.scorer.reset();
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    pub fn safety_metrics(&self) -> crate::risk::memory::SafetyMetrics {
        self.memory.metrics()
    }

    pub fn track_count(&self) -> usize {
        self.tracker.track_count()
    }

    pub fn risk_record_count(&self) -> usize {
        self.memory.record_count()
    }

    pub fn audit_sink(&self) -> &S {
        &self.audit
    }
}

fn rationale_for(decision: Decision, signature: Signature) -> String {
    if decision == Decision::Proceed {
        return "Behavioral entropy within safe bounds.".to_string();
    }
    match signature {
        Signature::ZoneIntrusion => "Critical: Restricted zone violation detected.".to_string(),
        Signature::EntityFall => "Emergency: Potential incapacitated person.".to_string(),
        other => format!("Anomaly Signature detected: {}", other.title()),
    }
}

fn round3(value: f32) -> f64 {
    (value as f64 * 1000.0).round() / 1000.0
}

fn round2(value: f32) -> f64 {
    (value as f64 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::types::{Pattern, SafetyState};

    fn pipeline() -> FramePipeline<MemoryAuditSink> {
        FramePipeline::new(&Config::default(), MemoryAuditSink::new())
    }

    fn bbox(x1: f32, y1: f32, x2: f32, y2: f32) -> BoundingBox {
        BoundingBox::new(x1, y1, x2, y2)
    }

    /// Stationary box in the top-half SAFE zone, ordinary proportions
    fn safe_box() -> BoundingBox {
        bbox(100.0, 100.0, 200.0, 200.0)
    }

    /// Box whose center sits in the bottom-right RESTRICTED zone
    fn restricted_box() -> BoundingBox {
        bbox(400.0, 300.0, 460.0, 420.0)
    }

    #[test]
    fn test_first_safe_frame_proceeds() {
        let mut p = pipeline();
        let reports = p.process_frame(&[safe_box()], 0.0);
        assert_eq!(reports.len(), 1);

        let r = &reports[0];
        // No previous box: seed hypotheses only, score 0.5 * 0.4 = 0.2,
        // under half the effective threshold in both day and night regimes
        assert_eq!(r.decision, Decision::Proceed);
        assert_eq!(r.state, SafetyState::Observing);
        assert_eq!(r.signature, Signature::StableStay);
        assert_eq!(r.pattern, Pattern::Transient);
        assert!((r.risk_score - 0.2).abs() < 1e-9);
        assert!((r.confidence - 0.9).abs() < 1e-9);
        assert_eq!(r.rationale, "Behavioral entropy within safe bounds.");
        assert!(r.prediction.is_none());
        assert_eq!(r.trail, vec![safe_box()]);
        assert!(p.audit_sink().records.is_empty());
    }

    #[test]
    fn test_restricted_intrusion_warns_and_escalates_to_audit() {
        let mut p = pipeline();
        let reports = p.process_frame(&[restricted_box()], 0.0);

        let r = &reports[0];
        // Score 0.95 * 0.4 = 0.38: inside the warn band for every
        // threshold regime (0.225..0.45 night, 0.30..0.60 day)
        assert_eq!(r.decision, Decision::Warn);
        assert_eq!(r.signature, Signature::ZoneIntrusion);
        assert_eq!(r.rationale, "Critical: Restricted zone violation detected.");

        let audit = p.audit_sink();
        assert_eq!(audit.records.len(), 1);
        assert_eq!(audit.records[0].identity, r.identity);
        assert_eq!(audit.records[0].decision, Decision::Warn);
        assert_eq!(audit.records[0].risk_score, r.risk_score);
    }

    #[test]
    fn test_sustained_intrusion_reaches_abstain() {
        let mut p = pipeline();
        let mut last = None;
        for i in 0..4 {
            let reports = p.process_frame(&[restricted_box()], i as f64);
            last = Some(reports[0].clone());
        }
        let r = last.unwrap();
        assert_eq!(r.decision, Decision::AbstainEscalate);
        assert_eq!(r.state, SafetyState::Abstained);
        assert!(r.prediction.is_none());
        assert_eq!(p.safety_metrics().total_abstentions, 1);
        // Every frame of this run escalated
        assert_eq!(p.audit_sink().records.len(), 4);
    }

    #[test]
    fn test_identity_stable_across_frames() {
        let mut p = pipeline();
        let first = p.process_frame(&[safe_box()], 0.0);
        let second = p.process_frame(&[bbox(105.0, 105.0, 205.0, 205.0)], 0.033);
        assert_eq!(first[0].identity, second[0].identity);
        assert_eq!(second[0].trail.len(), 2);
    }

    #[test]
    fn test_paused_pipeline_emits_nothing() {
        let mut p = pipeline();
        p.set_paused(true);
        assert!(p.process_frame(&[restricted_box()], 0.0).is_empty());
        assert!(p.audit_sink().records.is_empty());

        p.set_paused(false);
        assert_eq!(p.process_frame(&[restricted_box()], 1.0).len(), 1);
    }

    #[test]
    fn test_zero_sensitivity_never_escalates() {
        let mut p = pipeline();
        p.set_sensitivity(0.0);
        for i in 0..10 {
            let reports = p.process_frame(&[restricted_box()], i as f64);
            assert_eq!(reports[0].decision, Decision::Proceed);
            assert_eq!(reports[0].risk_score, 0.0);
        }
        assert!(p.audit_sink().records.is_empty());
    }

    #[test]
    fn test_negative_sensitivity_clamped() {
        let mut p = pipeline();
        p.set_sensitivity(-3.0);
        let reports = p.process_frame(&[restricted_box()], 0.0);
        assert_eq!(reports[0].risk_score, 0.0);
    }

    #[test]
    fn test_reset_clears_risk_but_keeps_identities() {
        let mut p = pipeline();
        for i in 0..3 {
            p.process_frame(&[restricted_box()], i as f64);
        }
        assert!(p.risk_record_count() > 0);

        p.reset();
        assert_eq!(p.risk_record_count(), 0);
        assert_eq!(p.track_count(), 1, "reset must not clear tracker identities");

        // Same identity continues, scoring starts from a clean slate
        let reports = p.process_frame(&[restricted_box()], 3.0);
        assert!((reports[0].risk_score - 0.38).abs() < 1e-6);
    }

    #[test]
    fn test_idle_identity_fully_released() {
        let mut p = pipeline();
        p.process_frame(&[safe_box()], 0.0);
        assert_eq!(p.track_count(), 1);

        // Next frame arrives long past the 30s TTL
        p.process_frame(&[], 100.0);
        assert_eq!(p.track_count(), 0);
        assert_eq!(p.risk_record_count(), 0);
    }

    #[test]
    fn test_non_finite_detection_skipped_not_fatal() {
        let mut p = pipeline();
        let reports = p.process_frame(
            &[bbox(f32::NAN, 100.0, 200.0, 200.0), safe_box()],
            0.0,
        );
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].trail, vec![safe_box()]);
    }

    #[test]
    fn test_trail_never_exceeds_capacity() {
        let mut p = pipeline();
        let mut last_len = 0;
        for i in 0..40 {
            let reports = p.process_frame(&[safe_box()], i as f64 * 0.033);
            last_len = reports[0].trail.len();
        }
        assert_eq!(last_len, 15);
    }
}
