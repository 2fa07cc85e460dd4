// src/risk/abstention.rs
//
// Confidence-aware abstention policy with a predictive projection.
//
// The base threshold tightens overnight, and low classifier confidence
// tightens the effective threshold further so uncertain situations escalate
// earlier. The time-to-abstain projection is a linear heuristic for the
// operator display, not a fitted forecast.

use crate::types::Decision;
use chrono::Timelike;

/// Base threshold during night hours (22:00-06:00, boundary hours included)
const NIGHT_THRESHOLD: f32 = 0.45;
const DAY_THRESHOLD: f32 = 0.60;

const NIGHT_START_HOUR: u32 = 22;
const NIGHT_END_HOUR: u32 = 6;

/// Confidence floor: even a fully uncertain reading only halves the threshold
const CONFIDENCE_FLOOR: f32 = 0.5;

/// Risk above which a WARN decision carries a projection
const PREDICTION_RISK_FLOOR: f32 = 0.4;

pub struct AbstentionEngine;

impl AbstentionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Base threshold for the current wall-clock hour.
    pub fn base_threshold(&self) -> f32 {
        self.base_threshold_at(chrono::Local::now().hour())
    }

    pub fn base_threshold_at(&self, hour: u32) -> f32 {
        if hour >= NIGHT_START_HOUR || hour <= NIGHT_END_HOUR {
            NIGHT_THRESHOLD
        } else {
            DAY_THRESHOLD
        }
    }

    /// Convert an accumulated risk score and the frame's classifier
    /// confidence into a decision plus an optional time-to-abstain label.
    pub fn decide(&self, risk: f32, confidence: f32) -> (Decision, Option<String>) {
        self.decide_at(chrono::Local::now().hour(), risk, confidence)
    }

    pub fn decide_at(&self, hour: u32, risk: f32, confidence: f32) -> (Decision, Option<String>) {
        let base = self.base_threshold_at(hour);
        let effective = base * confidence.max(CONFIDENCE_FLOOR);

        let decision = if risk < effective / 2.0 {
            Decision::Proceed
        } else if risk < effective {
            Decision::Warn
        } else {
            Decision::AbstainEscalate
        };

        // Linear projection of seconds until the score crosses the base
        // threshold, floored at 2s so the label never reads as immediate
        let prediction = if decision == Decision::Warn && risk > PREDICTION_RISK_FLOOR {
            let seconds = (((base - risk) * 20.0).round() as i64).max(2);
            Some(format!("ABSTAIN_IN_~{seconds}s"))
        } else {
            None
        };

        (decision, prediction)
    }
}
