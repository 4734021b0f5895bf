//! Shared domain vocabulary for the careloop care-coordination system.
//!
//! These types are the common language between the engine, the storage
//! layer, and any frontend: caregiver accounts, child profiles, the
//! log-entry variants caregivers record, risk predictions, and transient
//! notifications. They carry no business logic beyond small constructors
//! and display helpers; all rules live in the backend's domain layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role a caregiver signs in with. Parents own child profiles; educators
/// gain scoped read/log access through invite-code connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Parent,
    Educator,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Parent => write!(f, "Parent"),
            UserRole::Educator => write!(f, "Educator"),
        }
    }
}

/// A signed-in caregiver. Accounts are asserted identity only; there is
/// no credential verification anywhere in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

/// Profile of a tracked child, owned by the parent who created it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildProfile {
    pub id: String,
    pub name: String,
    pub age: u8,
    /// Freeform care notes (sensitivities, comfort objects, routines).
    pub care_notes: String,
    /// Unique code an educator redeems to connect to this child.
    /// Generated once at creation and never rotated.
    pub invite_code: String,
    pub parent_name: String,
    pub emergency_contact: String,
}

/// Self-reported mood on a five-point scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoodLevel {
    Distressed,
    Unsettled,
    Neutral,
    Happy,
    VeryHappy,
}

impl MoodLevel {
    /// Ordinal score, 1 (distressed) through 5 (very happy).
    pub fn score(&self) -> u8 {
        match self {
            MoodLevel::Distressed => 1,
            MoodLevel::Unsettled => 2,
            MoodLevel::Neutral => 3,
            MoodLevel::Happy => 4,
            MoodLevel::VeryHappy => 5,
        }
    }
}

impl fmt::Display for MoodLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MoodLevel::Distressed => "Distressed",
            MoodLevel::Unsettled => "Unsettled",
            MoodLevel::Neutral => "Neutral",
            MoodLevel::Happy => "Happy",
            MoodLevel::VeryHappy => "Very Happy",
        };
        write!(f, "{}", label)
    }
}

/// Observed stress indicator, roughly ordered from calm to overwhelmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressLevel {
    Calm,
    Restless,
    Stressed,
    Overwhelmed,
    NeedsBreak,
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StressLevel::Calm => "Calm",
            StressLevel::Restless => "Stimulated / Restless",
            StressLevel::Stressed => "Signs of Stress",
            StressLevel::Overwhelmed => "Overwhelmed",
            StressLevel::NeedsBreak => "Needs Break",
        };
        write!(f, "{}", label)
    }
}

/// Type-dependent payload of a log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EntryKind {
    Mood {
        mood_level: MoodLevel,
        /// Sleep quality 1–5, recordable by parents only.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sleep_quality: Option<u8>,
    },
    Activity {
        activity_name: String,
    },
    StressIndicator {
        stress_level: StressLevel,
    },
    Achievement {
        activity_name: String,
    },
    Note,
}

impl EntryKind {
    /// Human-readable type label, as shown in timelines and oracle input.
    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::Mood { .. } => "Mood",
            EntryKind::Activity { .. } => "Activity",
            EntryKind::StressIndicator { .. } => "Stress Indicator",
            EntryKind::Achievement { .. } => "Achievement",
            EntryKind::Note => "Note",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One append-only record in a child's log ledger.
///
/// Entries are never mutated after creation; the ledger removes them only
/// when the owning child is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    /// Child this entry belongs to. Always references a live profile at
    /// append time; cascade delete removes the entries with the child.
    pub child_id: String,
    /// Assigned by the ledger at append time, never client-edited.
    pub timestamp: DateTime<Utc>,
    pub author_role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(flatten)]
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Meltdown-risk bands returned by the prediction oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    /// Whether this band warrants an alert to the caregiver.
    pub fn is_alert_worthy(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        };
        write!(f, "{}", label)
    }
}

/// Latest risk assessment for a child. Session-transient: replaced
/// wholesale on each successful assessment, never persisted.
///
/// Field names match the oracle's JSON response schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// Estimated probability of a meltdown, 0–100.
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub explanation: String,
    pub recommendations: Vec<String>,
}

impl Prediction {
    /// Fixed fallback shown when the oracle is unreachable or returns
    /// garbage, so the presentation layer never renders a blank state.
    pub fn unavailable() -> Self {
        Prediction {
            risk_score: 0,
            risk_level: RiskLevel::Low,
            explanation: "Unable to generate a prediction at this time.".to_string(),
            recommendations: vec![
                "Check your internet connection".to_string(),
                "Try a manual refresh in a little while".to_string(),
            ],
        }
    }
}

/// How prominently a notification is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Success,
    Critical,
}

/// A transient toast-style alert. Never persisted; auto-expires after the
/// notification center's dwell interval unless dismissed first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationItem {
    pub id: String,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub raised_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(kind: EntryKind) -> LogEntry {
        LogEntry {
            id: "log::1".to_string(),
            child_id: "child::1".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
            author_role: UserRole::Parent,
            author_name: Some("Sarah".to_string()),
            kind,
            details: None,
        }
    }

    #[test]
    fn mood_scores_cover_full_scale() {
        assert_eq!(MoodLevel::Distressed.score(), 1);
        assert_eq!(MoodLevel::Neutral.score(), 3);
        assert_eq!(MoodLevel::VeryHappy.score(), 5);
    }

    #[test]
    fn entry_kind_round_trips_through_json() {
        let original = entry(EntryKind::Mood {
            mood_level: MoodLevel::Happy,
            sleep_quality: Some(4),
        });

        let json = serde_json::to_string(&original).unwrap();
        let parsed: LogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn entry_kind_serializes_with_type_tag() {
        let stress = entry(EntryKind::StressIndicator {
            stress_level: StressLevel::Overwhelmed,
        });

        let value = serde_json::to_value(&stress).unwrap();
        assert_eq!(value["type"], "StressIndicator");
        assert_eq!(value["stress_level"], "Overwhelmed");
        // Absent payload fields are omitted entirely, not serialized as null.
        assert!(value.get("sleep_quality").is_none());
    }

    #[test]
    fn prediction_parses_oracle_camel_case() {
        let json = r#"{
            "riskScore": 82,
            "riskLevel": "High",
            "explanation": "Rising stress after two transitions.",
            "recommendations": ["Offer a sensory break"]
        }"#;

        let prediction: Prediction = serde_json::from_str(json).unwrap();
        assert_eq!(prediction.risk_score, 82);
        assert_eq!(prediction.risk_level, RiskLevel::High);
        assert!(prediction.risk_level.is_alert_worthy());
    }

    #[test]
    fn low_and_moderate_are_not_alert_worthy() {
        assert!(!RiskLevel::Low.is_alert_worthy());
        assert!(!RiskLevel::Moderate.is_alert_worthy());
        assert!(RiskLevel::Critical.is_alert_worthy());
    }
}
