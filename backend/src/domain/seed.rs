//! Out-of-the-box demo state, used as the named default when a blob is
//! missing or unreadable so a fresh install never starts empty.

use chrono::{Duration, Utc};
use shared::{ChildProfile, EntryKind, LogEntry, MoodLevel, UserRole};

pub const DEMO_CHILD_ID: &str = "child::demo-leo";

pub fn demo_children() -> Vec<ChildProfile> {
    vec![ChildProfile {
        id: DEMO_CHILD_ID.to_string(),
        name: "Leo".to_string(),
        age: 6,
        care_notes: "Sensory sensitivities to loud noises, loves space and trains.".to_string(),
        invite_code: "LEO-2024".to_string(),
        parent_name: "Sarah Parent".to_string(),
        emergency_contact: "(555) 010-9988".to_string(),
    }]
}

pub fn demo_logs() -> Vec<LogEntry> {
    vec![LogEntry {
        id: "log::demo-1".to_string(),
        child_id: DEMO_CHILD_ID.to_string(),
        timestamp: Utc::now() - Duration::hours(4),
        author_role: UserRole::Parent,
        author_name: Some("Sarah Parent".to_string()),
        kind: EntryKind::Mood {
            mood_level: MoodLevel::Happy,
            sleep_quality: None,
        },
        details: Some("Woke up well, very interested in his toy rocket.".to_string()),
    }]
}

pub fn demo_connections() -> Vec<String> {
    vec![DEMO_CHILD_ID.to_string()]
}
