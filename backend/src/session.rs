//! Async facade over the engine.
//!
//! All mutation funnels through one mutex, so engine operations stay
//! atomic with respect to each other. The oracle call is the only
//! suspending operation: it runs on a spawned task that re-locks the
//! engine only after the future resolves and delivers the outcome as a
//! discrete later state update. A `watch` counter bumps on every state
//! change so a presentation layer can redraw without polling.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::debug;
use shared::{ChildProfile, LogEntry, NotificationItem, Prediction, User};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::commands::{
    AppendEntryCommand, AppendEntryOutcome, LoginCommand, RedeemOutcome, UpsertChildCommand,
};
use crate::domain::engine::CareEngine;
use crate::domain::risk::AssessmentRequest;
use crate::error::EngineResult;
use crate::oracle::RiskOracle;

/// How often expired notifications are swept out.
const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// The running care-coordination session. Construct via
/// [`crate::bootstrap`] or [`CareSession::new`] inside a tokio runtime.
pub struct CareSession {
    engine: Arc<Mutex<CareEngine>>,
    oracle: Arc<dyn RiskOracle>,
    changes: Arc<watch::Sender<u64>>,
    janitor: JoinHandle<()>,
}

impl CareSession {
    /// Wrap an engine and start the notification janitor. Must be
    /// called from within a tokio runtime.
    pub fn new(engine: CareEngine, oracle: Arc<dyn RiskOracle>) -> Self {
        let engine = Arc::new(Mutex::new(engine));
        let (changes, _) = watch::channel(0u64);
        let changes = Arc::new(changes);

        let janitor = tokio::spawn({
            let engine = Arc::clone(&engine);
            let changes = Arc::clone(&changes);
            async move {
                let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
                loop {
                    ticker.tick().await;
                    let removed = engine.lock().unwrap().sweep_notifications();
                    if removed > 0 {
                        bump(&changes);
                    }
                }
            }
        });

        CareSession {
            engine,
            oracle,
            changes,
            janitor,
        }
    }

    /// Receiver that ticks after every state change; redraw on tick.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    // ---- caregiver session ----

    pub fn login(&self, command: LoginCommand) -> EngineResult<User> {
        let result = self.engine.lock().unwrap().login(command);
        bump(&self.changes);
        result
    }

    pub fn logout(&self) {
        self.engine.lock().unwrap().logout();
        bump(&self.changes);
    }

    pub fn current_user(&self) -> Option<User> {
        self.engine.lock().unwrap().current_user().cloned()
    }

    // ---- children and connections ----

    pub fn visible_children(&self) -> Vec<ChildProfile> {
        self.engine
            .lock()
            .unwrap()
            .visible_children()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn active_child(&self) -> Option<ChildProfile> {
        self.engine.lock().unwrap().active_child().cloned()
    }

    pub fn upsert_child(&self, command: UpsertChildCommand) -> EngineResult<ChildProfile> {
        let result = self.engine.lock().unwrap().upsert_child(command);
        bump(&self.changes);
        result
    }

    pub fn delete_child(&self, child_id: &str) -> EngineResult<ChildProfile> {
        let result = self.engine.lock().unwrap().delete_child(child_id);
        bump(&self.changes);
        result
    }

    pub fn select_child(&self, child_id: &str) -> EngineResult<ChildProfile> {
        let result = self.engine.lock().unwrap().select_child(child_id);
        bump(&self.changes);
        result
    }

    pub fn invite_code(&self, child_id: &str) -> EngineResult<String> {
        self.engine.lock().unwrap().invite_code(child_id)
    }

    pub fn redeem_invite(&self, code: &str) -> EngineResult<RedeemOutcome> {
        let result = self.engine.lock().unwrap().redeem_invite(code);
        bump(&self.changes);
        result
    }

    // ---- log ledger ----

    pub fn active_entries(&self) -> Vec<LogEntry> {
        self.engine.lock().unwrap().active_entries()
    }

    /// Append an entry. If the cadence fires, the oracle call is
    /// dispatched here without blocking the caller.
    pub fn append_entry(&self, command: AppendEntryCommand) -> EngineResult<AppendEntryOutcome> {
        let outcome = self.engine.lock().unwrap().append_entry(command);
        bump(&self.changes);
        if let Ok(outcome) = &outcome {
            if let Some(request) = outcome.assessment.clone() {
                self.dispatch(request);
            }
        }
        outcome
    }

    // ---- risk assessment ----

    /// Caregiver-initiated re-assessment. Returns whether a call was
    /// actually started (refreshing while one is outstanding is a
    /// silent no-op).
    pub fn manual_refresh(&self) -> EngineResult<bool> {
        let request = self.engine.lock().unwrap().manual_refresh()?;
        match request {
            Some(request) => {
                self.dispatch(request);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn latest_prediction(&self) -> Option<Prediction> {
        self.engine.lock().unwrap().latest_prediction().cloned()
    }

    // ---- notifications ----

    pub fn notifications(&self) -> Vec<NotificationItem> {
        self.engine.lock().unwrap().notifications().to_vec()
    }

    pub fn dismiss_notification(&self, id: &str) {
        self.engine.lock().unwrap().dismiss_notification(id);
        bump(&self.changes);
    }

    // ---- internals ----

    /// Fire-and-forget oracle call. The engine lock is only taken again
    /// once the future resolves; the completion (or the decision to
    /// discard it) happens inside the engine.
    fn dispatch(&self, request: AssessmentRequest) {
        debug!(
            "Dispatching assessment for {} at {} entries",
            request.child_id, request.entry_count
        );
        let engine = Arc::clone(&self.engine);
        let oracle = Arc::clone(&self.oracle);
        let changes = Arc::clone(&self.changes);

        tokio::spawn(async move {
            let outcome = oracle.assess(&request).await;
            engine
                .lock()
                .unwrap()
                .complete_assessment(&request.child_id, outcome);
            bump(&changes);
        });
    }
}

impl Drop for CareSession {
    fn drop(&mut self) {
        self.janitor.abort();
    }
}

fn bump(changes: &watch::Sender<u64>) {
    changes.send_modify(|version| *version = version.wrapping_add(1));
}
