use serde::{Deserialize, Serialize};
use std::fmt;

use super::event::NetworkEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of anomaly reported by the live detectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyType {
    #[serde(rename = "UNAUTHORIZED SERVER ACCESS")]
    UnauthorizedServerAccess,
    #[serde(rename = "TRAFFIC LOOP")]
    TrafficLoop,
    #[serde(rename = "HIGH TRAFFIC VOLUME")]
    HighTrafficVolume,
    #[serde(rename = "BRUTE FORCE ATTACK")]
    BruteForceAttack,
    #[serde(rename = "AI STATISTICAL ANOMALY")]
    StatisticalAnomaly,
}

impl AnomalyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyType::UnauthorizedServerAccess => "UNAUTHORIZED SERVER ACCESS",
            AnomalyType::TrafficLoop => "TRAFFIC LOOP",
            AnomalyType::HighTrafficVolume => "HIGH TRAFFIC VOLUME",
            AnomalyType::BruteForceAttack => "BRUTE FORCE ATTACK",
            AnomalyType::StatisticalAnomaly => "AI STATISTICAL ANOMALY",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AnomalyType::UnauthorizedServerAccess | AnomalyType::BruteForceAttack => Severity::High,
            AnomalyType::TrafficLoop
            | AnomalyType::HighTrafficVolume
            | AnomalyType::StatisticalAnomaly => Severity::Medium,
        }
    }
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding from the rule engine or the outlier scorer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: AnomalyType,
    pub source: String,
    pub destination: String,
    pub action: String,
    pub severity: Severity,
    pub description: String,
}

impl AnomalyRecord {
    /// Build a record for a single triggering row
    pub fn for_event(kind: AnomalyType, event: &NetworkEvent, description: String) -> Self {
        AnomalyRecord {
            timestamp: event.timestamp.clone(),
            kind,
            source: event.source().to_string(),
            destination: event.destination().to_string(),
            action: event.action().to_string(),
            severity: kind.severity(),
            description,
        }
    }
}

/// Kinds of forward-looking warning raised by the trend predictor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredictionType {
    #[serde(rename = "ATTACK ESCALATION")]
    AttackEscalation,
    #[serde(rename = "TRAFFIC OVERLOAD RISK")]
    TrafficOverloadRisk,
    #[serde(rename = "PERSISTENT UNAUTHORIZED ACCESS")]
    PersistentUnauthorizedAccess,
    #[serde(rename = "NETWORK INSTABILITY")]
    NetworkInstability,
    #[serde(rename = "BRUTE FORCE ACCELERATION")]
    BruteForceAcceleration,
}

impl PredictionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionType::AttackEscalation => "ATTACK ESCALATION",
            PredictionType::TrafficOverloadRisk => "TRAFFIC OVERLOAD RISK",
            PredictionType::PersistentUnauthorizedAccess => "PERSISTENT UNAUTHORIZED ACCESS",
            PredictionType::NetworkInstability => "NETWORK INSTABILITY",
            PredictionType::BruteForceAcceleration => "BRUTE FORCE ACCELERATION",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            PredictionType::AttackEscalation
            | PredictionType::PersistentUnauthorizedAccess
            | PredictionType::BruteForceAcceleration => Severity::High,
            PredictionType::TrafficOverloadRisk | PredictionType::NetworkInstability => {
                Severity::Medium
            }
        }
    }
}

impl fmt::Display for PredictionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(rename = "type")]
    pub kind: PredictionType,
    pub severity: Severity,
    pub description: String,
    pub recommendation: String,
}

impl PredictionRecord {
    pub fn new(kind: PredictionType, description: String, recommendation: String) -> Self {
        PredictionRecord {
            kind,
            severity: kind.severity(),
            description,
            recommendation,
        }
    }
}
