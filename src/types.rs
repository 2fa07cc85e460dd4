use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub frame: FrameConfig,
    pub tracking: TrackingConfig,
    pub triage: TriageConfig,
    pub logging: LoggingConfig,
}

/// Reference frame the detector's pixel coordinates are normalized against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameConfig {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Maximum centroid distance (pixels) to match a detection to a track
    pub distance_threshold: f32,
    /// Historical boxes retained per identity (oldest dropped first)
    pub trail_capacity: usize,
    /// Seconds without an update before an identity is evicted
    pub track_ttl_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Operator sensitivity multiplier applied to instantaneous risk
    pub sensitivity: f32,
    pub posture: SecurityPosture,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame: FrameConfig {
                width: 640.0,
                height: 480.0,
            },
            tracking: TrackingConfig {
                distance_threshold: 50.0,
                trail_capacity: 15,
                track_ttl_seconds: 30.0,
            },
            triage: TriageConfig {
                sensitivity: 1.0,
                posture: SecurityPosture::ActiveWatch,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

/// Axis-aligned bounding box in pixel space, as supplied by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) * 0.5, (self.y1 + self.y2) * 0.5)
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn is_finite(&self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }
}

/// Stable identity label bound to a physical entity across frames.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    /// Mint a fresh 8-character identity.
    pub fn mint() -> Self {
        let full = uuid::Uuid::new_v4().simple().to_string();
        Self(full[..8].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Geofence zone of the observed area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    Safe,
    Transition,
    Restricted,
}

/// Coarse pose label derived from box geometry alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Pose {
    Stable,
    Fallen,
    ProximityAlert,
}

/// Operator-set global sensitivity profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityPosture {
    ActiveWatch,
    Standby,
    ZeroTrust,
}

impl SecurityPosture {
    /// Multiplier applied to the raw risk before clamping.
    pub fn risk_scale(&self) -> f32 {
        match self {
            Self::ActiveWatch => 1.0,
            Self::Standby => 0.5,
            Self::ZeroTrust => 1.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActiveWatch => "ACTIVE_WATCH",
            Self::Standby => "STANDBY",
            Self::ZeroTrust => "ZERO_TRUST",
        }
    }
}

/// Labeled candidate explanation for observed behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signature {
    StableStay,
    NormalMotion,
    ErraticMotion,
    SuddenSprint,
    Loitering,
    ZoneIntrusion,
    EntityFall,
}

impl Signature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StableStay => "STABLE_STAY",
            Self::NormalMotion => "NORMAL_MOTION",
            Self::ErraticMotion => "ERRATIC_MOTION",
            Self::SuddenSprint => "SUDDEN_SPRINT",
            Self::Loitering => "LOITERING",
            Self::ZoneIntrusion => "ZONE_INTRUSION",
            Self::EntityFall => "ENTITY_FALL",
        }
    }

    /// Human-readable form used in escalation rationales.
    pub fn title(&self) -> String {
        self.as_str()
            .split('_')
            .map(|w| {
                let mut c = w.chars();
                match c.next() {
                    Some(first) => first.to_string() + &c.as_str().to_lowercase(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How persistently an identity has exhibited elevated risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Pattern {
    Transient,
    RecurringBehavior,
    EscalatingPattern,
}

/// Discrete safety state of an identity's persistent risk memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyState {
    Observing,
    Warning,
    Abstained,
    Cooldown,
}

impl SafetyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Observing => "OBSERVING",
            Self::Warning => "WARNING",
            Self::Abstained => "ABSTAINED",
            Self::Cooldown => "COOLDOWN",
        }
    }
}

/// Final per-entity triage outcome for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Proceed,
    Warn,
    AbstainEscalate,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proceed => "PROCEED",
            Self::Warn => "WARN",
            Self::AbstainEscalate => "ABSTAIN_ESCALATE",
        }
    }
}

/// One scoring pass over a tracked box. Recomputed every frame, never stored.
#[derive(Debug, Clone)]
pub struct RiskAssessment {
    /// Raw instantaneous risk, posture-scaled, clamped to [0, 2]
    pub risk: f32,
    /// Classifier confidence, clamped to [0, 1]
    pub confidence: f32,
    pub primary: Signature,
    /// Top two competing hypotheses, heaviest first
    pub hypotheses: Vec<(Signature, f32)>,
    pub pattern: Pattern,
}

/// Per-identity record emitted to the operator surface each frame.
#[derive(Debug, Clone, Serialize)]
pub struct EntityReport {
    pub identity: EntityId,
    /// Accumulated memory score, rounded to 3 decimals
    pub risk_score: f64,
    /// Rounded to 2 decimals
    pub confidence: f64,
    pub decision: Decision,
    pub state: SafetyState,
    pub signature: Signature,
    pub hypotheses: Vec<(Signature, f32)>,
    pub rationale: String,
    pub prediction: Option<String>,
    pub pattern: Pattern,
    pub trail: Vec<BoundingBox>,
}
