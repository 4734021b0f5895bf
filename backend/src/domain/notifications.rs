//! Transient notification lifecycle: raise, dwell-based expiry, and
//! idempotent dismissal. Notifications are pure session state; nothing
//! here is ever persisted.

use chrono::{DateTime, Duration, Utc};
use log::debug;
use shared::{NotificationItem, Severity};
use uuid::Uuid;

/// How long an item stays visible before auto-dismissal.
pub const DWELL_SECONDS: i64 = 6;

/// Owns the active set of alerts raised by the risk scheduler and by
/// direct high-severity log events.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    items: Vec<NotificationItem>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[NotificationItem] {
        &self.items
    }

    /// Raise a new alert. Repeated identical alerts stack; there is no
    /// merging or deduplication.
    pub fn raise(
        &mut self,
        title: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        now: DateTime<Utc>,
    ) -> NotificationItem {
        let item = NotificationItem {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            message: message.into(),
            severity,
            raised_at: now,
        };
        debug!("Raising {:?} notification: {}", severity, item.title);
        self.items.push(item.clone());
        item
    }

    /// Remove an alert immediately. Dismissing an id that is already
    /// gone is a no-op, never an error.
    pub fn dismiss(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        before != self.items.len()
    }

    /// Remove every alert whose dwell interval has elapsed. Returns how
    /// many were expired.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::seconds(DWELL_SECONDS);
        let before = self.items.len();
        self.items.retain(|item| item.raised_at > cutoff);
        before - self.items.len()
    }
}
