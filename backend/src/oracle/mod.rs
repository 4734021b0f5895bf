//! # Oracle boundary
//!
//! The risk-prediction oracle is an external asynchronous service:
//! given a bounded window of recent log entries it returns one
//! [`Prediction`]. Its reasoning is opaque and substitutable: the
//! engine must work identically against the live Gemini client or the
//! deterministic offline stand-in used when no credential is
//! configured. Oracle failures never propagate to callers; the
//! scheduler settles on a fallback prediction instead.

pub mod gemini;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, warn};
use shared::{EntryKind, LogEntry, Prediction, RiskLevel};

use crate::config::EngineConfig;
use crate::domain::risk::{AssessmentRequest, ASSESSMENT_WINDOW};

pub use gemini::GeminiOracle;

/// Asynchronous meltdown-risk predictor.
#[async_trait]
pub trait RiskOracle: Send + Sync {
    async fn assess(&self, request: &AssessmentRequest) -> Result<Prediction>;
}

/// Pick the oracle implementation for this configuration: the live
/// Gemini client when a credential is present, the offline stand-in
/// otherwise.
pub fn from_config(config: &EngineConfig) -> Arc<dyn RiskOracle> {
    match &config.api_key {
        Some(api_key) => Arc::new(GeminiOracle::new(api_key.clone(), config.model.clone())),
        None => {
            warn!("No oracle credential configured; live risk analysis is disabled");
            Arc::new(OfflineOracle)
        }
    }
}

/// Format the most recent entries as the single text block the oracle
/// receives: one `[HH:MM] [Role] summary` line per entry, oldest first,
/// capped at [`ASSESSMENT_WINDOW`] entries.
pub fn format_log_window(entries: &[LogEntry]) -> String {
    let start = entries.len().saturating_sub(ASSESSMENT_WINDOW);
    entries[start..]
        .iter()
        .map(format_entry)
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_entry(entry: &LogEntry) -> String {
    let summary = match &entry.kind {
        EntryKind::Mood { mood_level, .. } => match &entry.details {
            Some(details) => format!("Mood: {} ({})", mood_level, details),
            None => format!("Mood: {}", mood_level),
        },
        EntryKind::StressIndicator { stress_level } => {
            format!("Indicator: {}", stress_level)
        }
        EntryKind::Activity { activity_name } => match &entry.details {
            Some(details) => format!("Activity: {} - {}", activity_name, details),
            None => format!("Activity: {}", activity_name),
        },
        EntryKind::Achievement { activity_name } => match &entry.details {
            Some(details) => format!("Achievement: {} - {}", activity_name, details),
            None => format!("Achievement: {}", activity_name),
        },
        EntryKind::Note => format!(
            "Note: {}",
            entry.details.as_deref().unwrap_or_default()
        ),
    };

    format!(
        "[{}] [{}] {}",
        entry.timestamp.format("%H:%M"),
        entry.author_role,
        summary
    )
}

/// Deterministic stand-in used when live analysis is unavailable.
/// Always reports low risk, with an explanation saying so.
pub struct OfflineOracle;

#[async_trait]
impl RiskOracle for OfflineOracle {
    async fn assess(&self, request: &AssessmentRequest) -> Result<Prediction> {
        debug!(
            "Offline oracle answering for {} ({} entries)",
            request.child_name, request.entry_count
        );
        Ok(Prediction {
            risk_score: 24,
            risk_level: RiskLevel::Low,
            explanation: "Simulated analysis: recent patterns look stable. Configure a \
                          Gemini API key to enable live behavioral analysis."
                .to_string(),
            recommendations: vec![
                "Maintain the current sensory environment".to_string(),
                "Plan a transition break in the next hour".to_string(),
                "Watch for subtle signs of restlessness".to_string(),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use shared::{MoodLevel, StressLevel, UserRole};

    fn entry(kind: EntryKind, details: Option<&str>, minute: u32) -> LogEntry {
        LogEntry {
            id: format!("log::{}", minute),
            child_id: "child::a".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 14, 9, minute, 0).unwrap(),
            author_role: UserRole::Parent,
            author_name: None,
            kind,
            details: details.map(str::to_string),
        }
    }

    #[test]
    fn formats_each_entry_kind() {
        let entries = vec![
            entry(
                EntryKind::Mood {
                    mood_level: MoodLevel::Happy,
                    sleep_quality: None,
                },
                Some("calm morning"),
                5,
            ),
            entry(
                EntryKind::StressIndicator {
                    stress_level: StressLevel::Overwhelmed,
                },
                None,
                10,
            ),
            entry(
                EntryKind::Activity {
                    activity_name: "Sensory break".to_string(),
                },
                None,
                15,
            ),
            entry(EntryKind::Note, Some("teacher visit went well"), 20),
        ];

        let window = format_log_window(&entries);
        let lines: Vec<&str> = window.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "[09:05] [Parent] Mood: Happy (calm morning)");
        assert_eq!(lines[1], "[09:10] [Parent] Indicator: Overwhelmed");
        assert_eq!(lines[2], "[09:15] [Parent] Activity: Sensory break");
        assert_eq!(lines[3], "[09:20] [Parent] Note: teacher visit went well");
    }

    #[test]
    fn window_keeps_only_the_most_recent_entries() {
        let entries: Vec<LogEntry> = (0..30)
            .map(|i| {
                entry(
                    EntryKind::Note,
                    Some(&format!("note {}", i)),
                    i as u32,
                )
            })
            .collect();

        let window = format_log_window(&entries);
        let lines: Vec<&str> = window.lines().collect();
        assert_eq!(lines.len(), ASSESSMENT_WINDOW);
        // Oldest lines fall off the front; the tail is intact.
        assert!(lines[0].ends_with("note 10"));
        assert!(lines[19].ends_with("note 29"));
    }

    #[tokio::test]
    async fn offline_oracle_is_deterministic_and_low_risk() {
        let request = AssessmentRequest {
            child_id: "child::a".to_string(),
            child_name: "Leo".to_string(),
            entry_count: 3,
            log_window: String::new(),
        };

        let first = OfflineOracle.assess(&request).await.unwrap();
        let second = OfflineOracle.assess(&request).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.risk_level, RiskLevel::Low);
        assert!(first.explanation.contains("live behavioral analysis"));
    }
}
