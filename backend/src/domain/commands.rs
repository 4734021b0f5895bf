//! Command and outcome types for engine operations.
//!
//! Commands carry caller intent only; ids, timestamps, and authorship
//! are assigned by the engine, never trusted from the outside.

use shared::{ChildProfile, EntryKind, LogEntry, UserRole};

use super::risk::AssessmentRequest;

/// Sign a caregiver in. Identity is asserted, not verified.
#[derive(Debug, Clone)]
pub struct LoginCommand {
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

/// Create or fully replace a child profile.
#[derive(Debug, Clone)]
pub struct UpsertChildCommand {
    /// `None` creates a new profile; `Some` replaces that record in
    /// full (no field merging).
    pub id: Option<String>,
    pub name: String,
    pub age: u8,
    pub care_notes: String,
    /// Defaults to the signed-in parent's name when absent.
    pub parent_name: Option<String>,
    pub emergency_contact: String,
    /// Requested invite code for a new profile. Honored only if no live
    /// profile already carries it; otherwise a fresh code is generated.
    /// Ignored on replace, since codes are immutable once issued.
    pub invite_code: Option<String>,
}

/// Record one log entry for a child.
#[derive(Debug, Clone)]
pub struct AppendEntryCommand {
    pub child_id: String,
    pub kind: EntryKind,
    pub details: Option<String>,
}

/// Result of appending an entry: the stored record plus, when the
/// cadence fired, the oracle request the session should dispatch.
#[derive(Debug, Clone)]
pub struct AppendEntryOutcome {
    pub entry: LogEntry,
    pub assessment: Option<AssessmentRequest>,
}

/// Result of redeeming an invite code.
#[derive(Debug, Clone)]
pub struct RedeemOutcome {
    pub child: ChildProfile,
    /// `false` when the educator was already connected (re-redeeming is
    /// a no-op success).
    pub newly_connected: bool,
}
