//! The engine facade: composes the entity store, log ledger, risk
//! scheduler, and notification center into the synchronous core the
//! async session wraps.
//!
//! Every operation here runs to completion without suspending, so with
//! the session's mutex around the engine no interleaving of two
//! mutations is ever observable. After each mutation the affected blob
//! is flushed best-effort; a storage failure is logged and swallowed
//! because in-memory state is the source of truth for the session.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::{
    ChildProfile, EntryKind, LogEntry, NotificationItem, Prediction, RiskLevel, Severity,
    StressLevel, User, UserRole,
};

use crate::error::{EngineError, EngineResult};
use crate::oracle;
use crate::storage::{BlobStore, CHILDREN_KEY, CONNECTIONS_KEY, LOGS_KEY, USER_KEY};

use super::commands::{
    AppendEntryCommand, AppendEntryOutcome, LoginCommand, RedeemOutcome, UpsertChildCommand,
};
use super::entity_store::EntityStore;
use super::ids;
use super::invites;
use super::ledger::LogLedger;
use super::notifications::NotificationCenter;
use super::risk::{AssessmentPhase, AssessmentRequest, RiskScheduler};
use super::seed;

/// The care-coordination state engine.
pub struct CareEngine {
    store: Arc<dyn BlobStore>,
    entities: EntityStore,
    ledger: LogLedger,
    scheduler: RiskScheduler,
    notifier: NotificationCenter,
}

impl CareEngine {
    /// An empty engine on a fresh store. Mainly for tests; production
    /// startup goes through [`CareEngine::load`].
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        CareEngine {
            store,
            entities: EntityStore::new(),
            ledger: LogLedger::new(),
            scheduler: RiskScheduler::new(),
            notifier: NotificationCenter::new(),
        }
    }

    /// Load engine state from the four durable blobs. A missing or
    /// unparseable blob falls back to its named default (the demo seed
    /// for children/logs/connections, signed-out for the user), never
    /// a hard failure.
    pub fn load(store: Arc<dyn BlobStore>) -> Self {
        let user: Option<User> = read_blob(store.as_ref(), USER_KEY, || None);
        let children = read_blob(store.as_ref(), CHILDREN_KEY, seed::demo_children);
        let logs = read_blob(store.as_ref(), LOGS_KEY, seed::demo_logs);
        let connections = read_blob(store.as_ref(), CONNECTIONS_KEY, seed::demo_connections);

        let mut engine = CareEngine {
            store,
            entities: EntityStore::restore(user, children, connections),
            ledger: LogLedger::from_entries(logs),
            scheduler: RiskScheduler::new(),
            notifier: NotificationCenter::new(),
        };
        engine.entities.ensure_active_selection();
        engine
    }

    // ---- caregiver session ----

    /// Sign a caregiver in. The session context is constructed fresh:
    /// any previous active-child selection is dropped and re-derived
    /// for the new role.
    pub fn login(&mut self, command: LoginCommand) -> EngineResult<User> {
        let name = command.name.trim().to_string();
        if name.is_empty() {
            return Err(EngineError::validation("Caregiver name cannot be empty"));
        }
        let email = command.email.trim().to_string();
        if email.is_empty() {
            return Err(EngineError::validation("Email cannot be empty"));
        }

        let user = User {
            id: ids::user_id(Utc::now().timestamp_millis()),
            name,
            email,
            role: command.role,
        };
        self.entities.login(user.clone());
        self.entities.set_active_child(None);
        self.entities.ensure_active_selection();
        self.persist_user();
        Ok(user)
    }

    /// Tear the session down. The user record is destroyed, not
    /// retained, and the durable user blob is cleared with it.
    pub fn logout(&mut self) {
        self.entities.logout();
        self.persist_user();
    }

    pub fn current_user(&self) -> Option<&User> {
        self.entities.current_user()
    }

    // ---- child profiles ----

    pub fn visible_children(&self) -> Vec<&ChildProfile> {
        self.entities.visible_children()
    }

    pub fn active_child(&self) -> Option<&ChildProfile> {
        self.entities.active_child()
    }

    pub fn connections(&self) -> &[String] {
        self.entities.connections()
    }

    /// Create a profile or replace one in full. Parent-only. Invite
    /// codes are assigned here exactly once: a requested code is only
    /// honored while unused, and a replace never rotates the existing
    /// code.
    pub fn upsert_child(&mut self, command: UpsertChildCommand) -> EngineResult<ChildProfile> {
        let user = self.require_role(UserRole::Parent)?.clone();

        let name = command.name.trim().to_string();
        if name.is_empty() {
            return Err(EngineError::validation("Child name cannot be empty"));
        }
        if name.len() > 100 {
            return Err(EngineError::validation(
                "Child name cannot exceed 100 characters",
            ));
        }

        let existing = command
            .id
            .as_deref()
            .and_then(|id| self.entities.child(id))
            .cloned();

        let profile = match existing {
            Some(existing) => ChildProfile {
                id: existing.id.clone(),
                name,
                age: command.age,
                care_notes: command.care_notes,
                invite_code: existing.invite_code,
                parent_name: command.parent_name.unwrap_or(existing.parent_name),
                emergency_contact: command.emergency_contact,
            },
            None => {
                let invite_code =
                    self.assign_invite_code(&name, command.invite_code.as_deref());
                ChildProfile {
                    id: command
                        .id
                        .unwrap_or_else(|| ids::child_id(Utc::now().timestamp_millis())),
                    name,
                    age: command.age,
                    care_notes: command.care_notes,
                    invite_code,
                    parent_name: command.parent_name.unwrap_or(user.name),
                    emergency_contact: command.emergency_contact,
                }
            }
        };

        info!("Saving profile for child {} ({})", profile.name, profile.id);
        self.entities.upsert_child(profile.clone());
        self.entities.ensure_active_selection();
        self.persist_children();
        Ok(profile)
    }

    /// Delete a child and cascade. Parent-only. The profile, its log
    /// entries, its connection-set entry, its scheduler bookkeeping,
    /// and (if selected) the active selection all go in this single
    /// mutation, so no dangling reference is ever observable.
    pub fn delete_child(&mut self, child_id: &str) -> EngineResult<ChildProfile> {
        self.require_role(UserRole::Parent)?;

        let removed = self
            .entities
            .remove_child(child_id)
            .ok_or_else(|| EngineError::UnknownChild(child_id.to_string()))?;
        self.ledger.purge(child_id);
        self.scheduler.forget(child_id);
        self.entities.ensure_active_selection();

        self.persist_children();
        self.persist_logs();
        self.persist_connections();
        info!("Deleted child {} and cascaded log and connection removal", removed.name);
        Ok(removed)
    }

    /// Replace the connection set wholesale, validating that every id
    /// resolves to a live profile. Duplicates collapse, keeping first
    /// occurrence order.
    pub fn set_connections(&mut self, ids: Vec<String>) -> EngineResult<()> {
        for id in &ids {
            if self.entities.child(id).is_none() {
                return Err(EngineError::UnknownChild(id.clone()));
            }
        }
        let mut unique: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        self.entities.set_connections(unique);
        self.entities.ensure_active_selection();
        self.persist_connections();
        Ok(())
    }

    /// Explicit user switch of the child in view.
    pub fn select_child(&mut self, child_id: &str) -> EngineResult<ChildProfile> {
        self.require_user()?;
        let child = self.resolve_visible_child(child_id)?.clone();
        self.entities.set_active_child(Some(child.id.clone()));
        self.scheduler.on_child_activated(&child.id);
        Ok(child)
    }

    // ---- connection protocol ----

    /// The invite code issued for a child at creation. Codes never
    /// rotate: this returns the same value for the profile's lifetime.
    /// Parent-only, like the profile fields it sits beside.
    pub fn invite_code(&self, child_id: &str) -> EngineResult<String> {
        self.require_role(UserRole::Parent)?;
        self.entities
            .child(child_id)
            .map(|child| child.invite_code.clone())
            .ok_or_else(|| EngineError::UnknownChild(child_id.to_string()))
    }

    /// Redeem an invite code for the signed-in educator. Matching is
    /// exact string equality after normalization; a miss reports only
    /// "invalid code", never whether the code used to exist. Success is
    /// idempotent and activates the connected child.
    pub fn redeem_invite(&mut self, code: &str) -> EngineResult<RedeemOutcome> {
        self.require_role(UserRole::Educator)?;

        let normalized = invites::normalize(code);
        let child = match self.entities.child_by_invite_code(&normalized) {
            Some(child) => child.clone(),
            None => {
                info!("Invite redemption failed: no live profile matches");
                return Err(EngineError::InvalidInviteCode);
            }
        };

        let newly_connected = self.entities.connect(&child.id);
        self.entities.set_active_child(Some(child.id.clone()));
        self.scheduler.on_child_activated(&child.id);
        self.notifier.raise(
            "Connected",
            format!("Connected to {}.", child.name),
            Severity::Success,
            Utc::now(),
        );
        self.persist_connections();
        Ok(RedeemOutcome {
            child,
            newly_connected,
        })
    }

    // ---- log ledger ----

    pub fn entries_for(&self, child_id: &str) -> Vec<LogEntry> {
        self.ledger.by_child(child_id)
    }

    pub fn active_entries(&self) -> Vec<LogEntry> {
        match self.entities.active_child_id() {
            Some(id) => self.ledger.by_child(id),
            None => Vec::new(),
        }
    }

    /// Append a log entry for a child visible to the signed-in
    /// caregiver. Stress alerts fire synchronously before this returns;
    /// if the append lands on the active child and hits the assessment
    /// cadence, the returned outcome carries the oracle request the
    /// session should dispatch.
    pub fn append_entry(&mut self, command: AppendEntryCommand) -> EngineResult<AppendEntryOutcome> {
        let user = self.require_user()?.clone();
        let child = self.resolve_visible_child(&command.child_id)?.clone();
        validate_entry(&command.kind, user.role)?;

        let entry = self.ledger.append(LogEntry {
            id: String::new(),
            child_id: child.id.clone(),
            timestamp: Utc::now(),
            author_role: user.role,
            author_name: Some(user.name),
            kind: command.kind,
            details: command.details.filter(|details| !details.trim().is_empty()),
        });

        if let EntryKind::StressIndicator { stress_level } = &entry.kind {
            match stress_level {
                StressLevel::Overwhelmed => {
                    self.notifier.raise(
                        "High Stress Alert",
                        format!("{} is reported as Overwhelmed.", child.name),
                        Severity::Critical,
                        Utc::now(),
                    );
                }
                StressLevel::Stressed => {
                    self.notifier.raise(
                        "Stress Indicator Logged",
                        format!("{} is showing signs of stress.", child.name),
                        Severity::Info,
                        Utc::now(),
                    );
                }
                _ => {}
            }
        }
        self.persist_logs();

        let assessment = if self.entities.active_child_id() == Some(child.id.as_str()) {
            let count = self.ledger.count_for(&child.id);
            if self.scheduler.on_entries_changed(&child.id, count) {
                self.scheduler.begin(&child.id, count);
                Some(self.build_assessment_request(&child))
            } else {
                None
            }
        } else {
            None
        };

        Ok(AppendEntryOutcome { entry, assessment })
    }

    // ---- risk assessment ----

    /// Caregiver-initiated re-assessment of the active child. Bypasses
    /// the cadence, but is ignored while a call is already outstanding
    /// and when there is nothing to assess.
    pub fn manual_refresh(&mut self) -> EngineResult<Option<AssessmentRequest>> {
        self.require_user()?;
        let child = match self.entities.active_child() {
            Some(child) => child.clone(),
            None => return Ok(None),
        };

        let count = self.ledger.count_for(&child.id);
        if count == 0 {
            return Ok(None);
        }
        if !self.scheduler.can_refresh(&child.id) {
            debug!("Manual refresh ignored; assessment already in flight");
            return Ok(None);
        }

        self.scheduler.begin(&child.id, count);
        Ok(Some(self.build_assessment_request(&child)))
    }

    /// Deliver an oracle completion. Results for a child that is no
    /// longer active are discarded wholesale. There is no cancellation
    /// for in-flight calls, so this is where cross-child alert leakage
    /// is stopped. High and Critical outcomes raise an alert; failures
    /// settle silently on the fallback prediction.
    pub fn complete_assessment(
        &mut self,
        child_id: &str,
        outcome: anyhow::Result<Prediction>,
    ) {
        if self.entities.active_child_id() != Some(child_id) {
            warn!("Discarding assessment for {}: no longer the active child", child_id);
            self.scheduler.discard(child_id);
            return;
        }
        let child_name = match self.entities.child(child_id) {
            Some(child) => child.name.clone(),
            None => {
                self.scheduler.discard(child_id);
                return;
            }
        };

        match outcome {
            Ok(prediction) => {
                let level = prediction.risk_level;
                self.scheduler.complete_success(child_id, prediction);
                if level.is_alert_worthy() {
                    let title = if level == RiskLevel::Critical {
                        "Critical AI Prediction"
                    } else {
                        "High Risk Alert"
                    };
                    self.notifier.raise(
                        title,
                        format!(
                            "AI predicts a {} risk of meltdown for {} based on recent patterns.",
                            level, child_name
                        ),
                        Severity::Critical,
                        Utc::now(),
                    );
                }
            }
            Err(err) => {
                warn!("Risk assessment for {} failed: {:#}", child_id, err);
                self.scheduler.complete_failure(child_id);
            }
        }
    }

    /// Latest known prediction for the active child, if any.
    pub fn latest_prediction(&self) -> Option<&Prediction> {
        self.entities
            .active_child_id()
            .and_then(|id| self.scheduler.latest(id))
    }

    /// Assessment phase of the active child (idle when none selected).
    pub fn assessment_phase(&self) -> AssessmentPhase {
        self.entities
            .active_child_id()
            .map(|id| self.scheduler.phase(id))
            .unwrap_or_default()
    }

    // ---- notifications ----

    pub fn notifications(&self) -> &[NotificationItem] {
        self.notifier.items()
    }

    pub fn dismiss_notification(&mut self, id: &str) -> bool {
        self.notifier.dismiss(id)
    }

    /// Expire notifications past their dwell interval. Returns how many
    /// went.
    pub fn sweep_notifications(&mut self) -> usize {
        self.notifier.sweep_expired(Utc::now())
    }

    // ---- internals ----

    fn require_user(&self) -> EngineResult<&User> {
        self.entities
            .current_user()
            .ok_or(EngineError::NotAuthenticated)
    }

    fn require_role(&self, role: UserRole) -> EngineResult<&User> {
        let user = self.require_user()?;
        if user.role != role {
            return Err(EngineError::RoleDenied(role));
        }
        Ok(user)
    }

    /// Resolve a child id within the caregiver's visible scope. An id
    /// outside that scope is indistinguishable from one that never
    /// existed.
    fn resolve_visible_child(&self, child_id: &str) -> EngineResult<&ChildProfile> {
        if !self.entities.is_visible(child_id) {
            return Err(EngineError::UnknownChild(child_id.to_string()));
        }
        self.entities
            .child(child_id)
            .ok_or_else(|| EngineError::UnknownChild(child_id.to_string()))
    }

    fn assign_invite_code(&self, child_name: &str, requested: Option<&str>) -> String {
        if let Some(requested) = requested {
            let normalized = invites::normalize(requested);
            if !normalized.is_empty() && !self.entities.invite_code_in_use(&normalized) {
                return normalized;
            }
            warn!("Requested invite code is unavailable; generating a fresh one");
        }
        invites::generate(child_name, |code| self.entities.invite_code_in_use(code))
    }

    fn build_assessment_request(&self, child: &ChildProfile) -> AssessmentRequest {
        let entries = self.ledger.by_child(&child.id);
        AssessmentRequest {
            child_id: child.id.clone(),
            child_name: child.name.clone(),
            entry_count: entries.len(),
            log_window: oracle::format_log_window(&entries),
        }
    }

    fn persist_user(&self) {
        persist(self.store.as_ref(), USER_KEY, &self.entities.current_user());
    }

    fn persist_children(&self) {
        persist(self.store.as_ref(), CHILDREN_KEY, &self.entities.children());
    }

    fn persist_logs(&self) {
        persist(self.store.as_ref(), LOGS_KEY, &self.ledger.entries());
    }

    fn persist_connections(&self) {
        persist(self.store.as_ref(), CONNECTIONS_KEY, &self.entities.connections());
    }
}

fn validate_entry(kind: &EntryKind, role: UserRole) -> EngineResult<()> {
    match kind {
        EntryKind::Mood {
            sleep_quality: Some(quality),
            ..
        } => {
            if role != UserRole::Parent {
                return Err(EngineError::validation(
                    "Sleep quality can only be recorded by a parent",
                ));
            }
            if !(1..=5).contains(quality) {
                return Err(EngineError::validation(
                    "Sleep quality must be between 1 and 5",
                ));
            }
        }
        EntryKind::Activity { activity_name } | EntryKind::Achievement { activity_name } => {
            if activity_name.trim().is_empty() {
                return Err(EngineError::validation("Activity name cannot be empty"));
            }
        }
        _ => {}
    }
    Ok(())
}

/// Best-effort blob write: failures are logged, never raised.
fn persist<T: Serialize>(store: &dyn BlobStore, key: &str, value: &T) {
    let bytes = match serde_json::to_vec(value) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("Serializing blob '{}' failed: {}", key, err);
            return;
        }
    };
    if let Err(err) = store.put(key, &bytes) {
        warn!("Best-effort write of blob '{}' failed: {:#}", key, err);
    }
}

/// Read one blob, falling back to its named default when missing or
/// unparseable.
fn read_blob<T: DeserializeOwned>(
    store: &dyn BlobStore,
    key: &str,
    default: impl FnOnce() -> T,
) -> T {
    match store.get(key) {
        Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(err) => {
                warn!("Blob '{}' is unreadable ({}); using default", key, err);
                default()
            }
        },
        Ok(None) => default(),
        Err(err) => {
            warn!("Reading blob '{}' failed ({:#}); using default", key, err);
            default()
        }
    }
}
