// src/risk/scorer.rs
//
// Multi-hypothesis behavioral risk scoring.
//
// Every frame each tracked box is scored against a set of competing weighted
// hypotheses seeded from motion, zone, and pose signals. The heaviest
// hypothesis becomes the primary signature and its weight the raw risk.
// A per-identity fractional hit counter classifies how persistently the
// identity has run hot (TRANSIENT / RECURRING_BEHAVIOR / ESCALATING_PATTERN).

use crate::types::{
    BoundingBox, EntityId, Pattern, Pose, RiskAssessment, SecurityPosture, Signature, Zone,
};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

// ============================================================================
// HYPOTHESIS SEEDS AND THRESHOLDS
// ============================================================================
const BASE_CONFIDENCE: f32 = 0.9;
const SEED_WEIGHT: f32 = 0.5;

/// Center displacement (px/frame) above which motion reads as erratic
const ERRATIC_VELOCITY_PX: f32 = 25.0;
/// Center displacement (px/frame) below which the entity is loitering
const LOITER_VELOCITY_PX: f32 = 5.0;

const ERRATIC_VELOCITY_NORM: f32 = 50.0;
const SPRINT_VELOCITY_NORM: f32 = 80.0;
const LOITERING_WEIGHT: f32 = 0.8;
const ZONE_INTRUSION_WEIGHT: f32 = 0.95;
const ENTITY_FALL_WEIGHT: f32 = 0.9;

// ============================================================================
// TEMPORAL PATTERN
// ============================================================================
/// Scaled risk above which a frame counts as a hit
const PATTERN_RISK_FLOOR: f32 = 0.3;
/// Fractional decay applied on quiet frames, floored at zero
const HIT_DECAY: f32 = 0.5;
const RECURRING_HITS: f32 = 5.0;
const ESCALATING_HITS: f32 = 15.0;

const MAX_RISK: f32 = 2.0;

/// Per-identity temporal counters backing pattern classification.
#[derive(Debug, Clone)]
struct BehaviorMemory {
    hits: f32,
    pattern_start: f64,
}

pub struct RiskScorer {
    behavior: HashMap<EntityId, BehaviorMemory>,
}

impl RiskScorer {
    pub fn new() -> Self {
        Self {
            behavior: HashMap::new(),
        }
    }

    /// Score one tracked box. A missing previous box simply skips the
    /// velocity-derived hypotheses; there are no failure modes on
    /// well-formed input.
    pub fn assess(
        &mut self,
        id: &EntityId,
        prev_box: Option<&BoundingBox>,
        current: &BoundingBox,
        zone: Zone,
        pose: Pose,
        posture: SecurityPosture,
        now: f64,
    ) -> RiskAssessment {
        let mem = self
            .behavior
            .entry(id.clone())
            .or_insert_with(|| BehaviorMemory {
                hits: 0.0,
                pattern_start: now,
            });

        // Competing hypotheses, insertion order breaks weight ties
        let mut hypotheses: Vec<(Signature, f32)> = vec![
            (Signature::StableStay, SEED_WEIGHT),
            (Signature::NormalMotion, SEED_WEIGHT),
        ];
        let mut confidence = BASE_CONFIDENCE;

        if let Some(prev) = prev_box {
            let (cx, cy) = current.center();
            let (px, py) = prev.center();
            let velocity = (cx - px).hypot(cy - py);

            if velocity > ERRATIC_VELOCITY_PX {
                hypotheses.push((
                    Signature::ErraticMotion,
                    (velocity / ERRATIC_VELOCITY_NORM).min(1.0),
                ));
                hypotheses.push((
                    Signature::SuddenSprint,
                    (velocity / SPRINT_VELOCITY_NORM).min(1.0),
                ));
                // High motion blurs the detector's signal
                confidence -= 0.1;
            } else if velocity < LOITER_VELOCITY_PX {
                hypotheses.push((Signature::Loitering, LOITERING_WEIGHT));
                confidence += 0.05;
            }
        }

        if zone == Zone::Restricted {
            hypotheses.push((Signature::ZoneIntrusion, ZONE_INTRUSION_WEIGHT));
            confidence += 0.1;
        }

        if pose == Pose::Fallen {
            hypotheses.push((Signature::EntityFall, ENTITY_FALL_WEIGHT));
            confidence += 0.2;
        }

        // Stable sort: on equal weight the first-inserted hypothesis wins
        hypotheses.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        hypotheses.truncate(2);

        let primary = hypotheses[0].0;
        let mut risk = hypotheses[0].1;

        risk *= posture.risk_scale();

        let mut pattern = Pattern::Transient;
        if risk > PATTERN_RISK_FLOOR {
            mem.hits += 1.0;
            if mem.hits > ESCALATING_HITS {
                pattern = Pattern::EscalatingPattern;
                debug!(
                    "Identity {} escalating: {:.1} hits over {:.1}s",
                    id,
                    mem.hits,
                    now - mem.pattern_start
                );
            } else if mem.hits > RECURRING_HITS {
                pattern = Pattern::RecurringBehavior;
            }
        } else {
            mem.hits = (mem.hits - HIT_DECAY).max(0.0);
        }

        RiskAssessment {
            risk: risk.clamp(0.0, MAX_RISK),
            confidence: confidence.clamp(0.0, 1.0),
            primary,
            hypotheses,
            pattern,
        }
    }

    /// Release the behavior counters for an evicted identity.
    pub fn remove(&mut self, id: &EntityId) {
        self.behavior.remove(id);
    }

    /// Clear all behavior counters (operator reset).
    pub fn reset(&mut self) {
        self.behavior.clear();
    }
}
