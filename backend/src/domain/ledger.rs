//! Append-only log ledger.
//!
//! Entries are inserted in arrival order and never mutated afterwards;
//! the only removal path is [`LogLedger::purge`], used by the owning
//! child's cascade delete. Canonical order is chronological; consumers
//! wanting most-recent-first must reverse explicitly.

use chrono::{DateTime, Utc};
use log::debug;
use shared::LogEntry;

use super::ids;

/// The append-only collection of log entries for all children.
///
/// Referential validation (`child_id` must resolve to a live profile)
/// happens in the engine before an entry reaches the ledger.
#[derive(Debug, Default)]
pub struct LogLedger {
    entries: Vec<LogEntry>,
}

impl LogLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a ledger from persisted entries, keeping their order.
    pub fn from_entries(entries: Vec<LogEntry>) -> Self {
        LogLedger { entries }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Append an entry, assigning its id when absent and clamping its
    /// timestamp so ledger order stays non-decreasing even if the wall
    /// clock steps backwards.
    pub fn append(&mut self, mut entry: LogEntry) -> LogEntry {
        if entry.id.is_empty() {
            entry.id = ids::entry_id(entry.timestamp.timestamp_millis());
        }
        if let Some(last) = self.entries.last() {
            if entry.timestamp < last.timestamp {
                entry.timestamp = last.timestamp;
            }
        }

        debug!(
            "Appending {} entry {} for child {}",
            entry.kind.label(),
            entry.id,
            entry.child_id
        );
        self.entries.push(entry.clone());
        entry
    }

    /// All entries for one child, oldest first.
    pub fn by_child(&self, child_id: &str) -> Vec<LogEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.child_id == child_id)
            .cloned()
            .collect()
    }

    /// Number of entries recorded for one child.
    pub fn count_for(&self, child_id: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.child_id == child_id)
            .count()
    }

    /// Timestamp of the newest entry, if any.
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.entries.last().map(|entry| entry.timestamp)
    }

    /// Remove every entry for `child_id`, returning how many went.
    /// Cascade-delete only; there is no single-entry removal.
    pub fn purge(&mut self, child_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.child_id != child_id);
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!("Purged {} entries for child {}", removed, child_id);
        }
        removed
    }
}
