// src/audit.rs
//
// Interface to the external audit collaborator. The core forwards one
// escalation record per identity per frame whenever the decision is not
// PROCEED; durable storage lives behind this trait, outside the core.

use crate::types::{Decision, EntityId, Signature};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Serialize)]
pub struct EscalationRecord {
    pub identity: EntityId,
    pub signature: Signature,
    pub risk_score: f64,
    pub decision: Decision,
    pub rationale: String,
    pub recorded_at: String,
}

impl EscalationRecord {
    pub fn new(
        identity: EntityId,
        signature: Signature,
        risk_score: f64,
        decision: Decision,
        rationale: String,
    ) -> Self {
        Self {
            identity,
            signature,
            risk_score,
            decision,
            rationale,
            recorded_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

pub trait AuditSink {
    fn record(&mut self, record: &EscalationRecord);
}

/// Default sink: structured log line per escalation.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&mut self, record: &EscalationRecord) {
        warn!(
            "AUDIT {} {} risk={:.3} {} — {}",
            record.decision.as_str(),
            record.identity,
            record.risk_score,
            record.signature.as_str(),
            record.rationale
        );
    }
}

/// Buffering sink for tests and the demo runner.
#[derive(Default)]
pub struct MemoryAuditSink {
    pub records: Vec<EscalationRecord>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&mut self, record: &EscalationRecord) {
        self.records.push(record.clone());
    }
}
