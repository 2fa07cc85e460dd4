// src/risk/memory.rs
//
// Persistent per-identity risk memory with state-dependent decay.
//
// The accumulated score feeds a four-state machine re-evaluated every frame:
// OBSERVING -> WARNING -> ABSTAINED -> COOLDOWN. Once an identity has
// abstained its score decays far slower (safety persistence): the system
// refuses to downgrade risk quickly after an escalation.

use crate::types::{EntityId, SafetyState};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

/// Decay applied while the identity is OBSERVING or WARNING
const DECAY_NORMAL: f32 = 0.85;
/// Decay applied while ABSTAINED or in COOLDOWN
const DECAY_PERSISTENT: f32 = 0.98;

/// Share of the instantaneous risk blended into the score each frame
const RISK_BLEND: f32 = 0.4;

const ABSTAIN_SCORE: f32 = 0.8;
const WARNING_SCORE: f32 = 0.4;

/// Placeholder recovery duration recorded when an identity leaves ABSTAINED.
/// Not a measured quantity; replace once real recovery timing exists.
const RECOVERY_SAMPLE_SECS: f32 = 5.0;

/// Per-identity persistent risk record. Exists iff the identity has been
/// observed at least once; cleared only by an explicit reset.
#[derive(Debug, Clone)]
pub struct RiskRecord {
    pub score: f32,
    pub state: SafetyState,
    pub abstain_count: u32,
    pub last_abstain_time: f64,
}

/// Process-wide safety aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct SafetyMetrics {
    pub total_abstentions: u64,
    pub avg_recovery_time: f32,
    pub recovery_samples: usize,
}

pub struct RiskMemory {
    records: HashMap<EntityId, RiskRecord>,
    total_abstentions: u64,
    recovery_times: Vec<f32>,
}

impl RiskMemory {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            total_abstentions: 0,
            recovery_times: Vec::new(),
        }
    }

    /// Blend one frame's instantaneous risk (already posture- and
    /// sensitivity-scaled) into the identity's score and re-run the
    /// transition rules. Returns the updated score and state.
    pub fn update(&mut self, id: &EntityId, new_risk: f32, now: f64) -> (f32, SafetyState) {
        let record = self.records.entry(id.clone()).or_insert_with(|| RiskRecord {
            score: 0.0,
            state: SafetyState::Observing,
            abstain_count: 0,
            last_abstain_time: 0.0,
        });

        let prev_state = record.state;

        let decay = match record.state {
            SafetyState::Abstained | SafetyState::Cooldown => DECAY_PERSISTENT,
            SafetyState::Observing | SafetyState::Warning => DECAY_NORMAL,
        };

        record.score = record.score * decay + new_risk * RISK_BLEND;

        // Fixed priority order, first match wins
        if record.score > ABSTAIN_SCORE {
            record.state = SafetyState::Abstained;
            if prev_state != SafetyState::Abstained {
                self.total_abstentions += 1;
                record.abstain_count += 1;
                record.last_abstain_time = now;
                warn!(
                    "Identity {} abstained (score {:.3}, abstention #{})",
                    id, record.score, record.abstain_count
                );
            }
        } else if record.score > WARNING_SCORE {
            record.state = SafetyState::Warning;
        } else if prev_state == SafetyState::Abstained {
            record.state = SafetyState::Cooldown;
            self.recovery_times.push(RECOVERY_SAMPLE_SECS);
            info!("Identity {} entered cooldown (score {:.3})", id, record.score);
        } else {
            record.state = SafetyState::Observing;
        }

        (record.score, record.state)
    }

    pub fn record_of(&self, id: &EntityId) -> Option<&RiskRecord> {
        self.records.get(id)
    }

    pub fn metrics(&self) -> SafetyMetrics {
        // Empty sample set reports the 0 sentinel rather than dividing
        let avg = if self.recovery_times.is_empty() {
            0.0
        } else {
            self.recovery_times.iter().sum::<f32>() / self.recovery_times.len() as f32
        };
        SafetyMetrics {
            total_abstentions: self.total_abstentions,
            avg_recovery_time: avg,
            recovery_samples: self.recovery_times.len(),
        }
    }

    /// Release the record for an evicted identity.
    pub fn remove(&mut self, id: &EntityId) {
        self.records.remove(id);
    }

    /// Operator reset: clears every per-identity record. The process-wide
    /// aggregate survives the reset.
    pub fn reset(&mut self) {
        let dropped = self.records.len();
        self.records.clear();
        info!("Risk memory reset ({} records cleared)", dropped);
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}
