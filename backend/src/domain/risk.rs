//! Risk-assessment scheduling.
//!
//! Each child moves through `Idle → Assessing → Settled`, returning to
//! `Idle` whenever new entries arrive. The scheduler decides *when* the
//! oracle is consulted; actually dispatching the call is the session's
//! job, and the completion comes back later through the engine.

use std::collections::HashMap;

use log::{debug, info, warn};
use shared::Prediction;

/// How many entries between assessments: re-assess on every strict
/// multiple of this count.
pub const ASSESSMENT_CADENCE: usize = 3;

/// Upper bound on how many recent entries are shown to the oracle.
pub const ASSESSMENT_WINDOW: usize = 20;

/// Per-child position in the assessment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssessmentPhase {
    #[default]
    Idle,
    Assessing,
    Settled,
}

/// A prepared oracle invocation for one child. Carries everything the
/// oracle boundary needs so no engine state is touched while the call
/// is in flight.
#[derive(Debug, Clone)]
pub struct AssessmentRequest {
    pub child_id: String,
    pub child_name: String,
    /// Entry count that triggered this request.
    pub entry_count: usize,
    /// The most recent entries, already formatted as one text block.
    pub log_window: String,
}

/// Cadence bookkeeping and latest-known predictions, per child.
#[derive(Debug, Default)]
pub struct RiskScheduler {
    phases: HashMap<String, AssessmentPhase>,
    /// Entry count of the last attempt, successful or not. Cleared when
    /// a child drops below the cadence floor or becomes active again.
    last_attempted: HashMap<String, usize>,
    latest: HashMap<String, Prediction>,
}

impl RiskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self, child_id: &str) -> AssessmentPhase {
        self.phases.get(child_id).copied().unwrap_or_default()
    }

    /// Latest known prediction for a child (may be the fallback).
    pub fn latest(&self, child_id: &str) -> Option<&Prediction> {
        self.latest.get(child_id)
    }

    /// Entries changed for the active child: decide whether the oracle
    /// should be consulted at the new count.
    ///
    /// Dormant below the cadence floor (and retry bookkeeping resets
    /// there). While a call is outstanding the trigger is dropped, not
    /// queued. Otherwise assess on an unattempted strict multiple of
    /// the cadence, or whenever no assessment result exists yet.
    pub fn on_entries_changed(&mut self, child_id: &str, count: usize) -> bool {
        if count < ASSESSMENT_CADENCE {
            self.phases.insert(child_id.to_string(), AssessmentPhase::Idle);
            self.last_attempted.remove(child_id);
            return false;
        }

        if self.phase(child_id) == AssessmentPhase::Assessing {
            debug!(
                "Assessment already outstanding for {}; dropping trigger at count {}",
                child_id, count
            );
            return false;
        }

        // New entries always pull a settled child back to idle.
        self.phases.insert(child_id.to_string(), AssessmentPhase::Idle);

        let on_cadence = count % ASSESSMENT_CADENCE == 0
            && self.last_attempted.get(child_id) != Some(&count);
        let never_assessed = !self.latest.contains_key(child_id);

        on_cadence || never_assessed
    }

    /// A caregiver switched to this child: retry bookkeeping starts
    /// over so the new view can assess without waiting for the next
    /// cadence point.
    pub fn on_child_activated(&mut self, child_id: &str) {
        self.last_attempted.remove(child_id);
    }

    /// Whether a manual refresh may start now. Manual refresh bypasses
    /// the cadence but never overlaps an outstanding call.
    pub fn can_refresh(&self, child_id: &str) -> bool {
        self.phase(child_id) != AssessmentPhase::Assessing
    }

    /// Mark an oracle call as outstanding at this entry count.
    pub fn begin(&mut self, child_id: &str, count: usize) {
        info!("Beginning risk assessment for {} at {} entries", child_id, count);
        self.phases
            .insert(child_id.to_string(), AssessmentPhase::Assessing);
        self.last_attempted.insert(child_id.to_string(), count);
    }

    /// Store a successful assessment as the latest known prediction.
    pub fn complete_success(&mut self, child_id: &str, prediction: Prediction) {
        info!(
            "Assessment for {} settled: {} risk ({})",
            child_id, prediction.risk_level, prediction.risk_score
        );
        self.latest.insert(child_id.to_string(), prediction);
        self.phases
            .insert(child_id.to_string(), AssessmentPhase::Settled);
    }

    /// Settle on the fixed fallback so the presentation layer never
    /// shows a blank state. No notification is raised for this path.
    pub fn complete_failure(&mut self, child_id: &str) -> Prediction {
        warn!("Assessment for {} failed; settling on fallback", child_id);
        let fallback = Prediction::unavailable();
        self.latest.insert(child_id.to_string(), fallback.clone());
        self.phases
            .insert(child_id.to_string(), AssessmentPhase::Settled);
        fallback
    }

    /// Throw away a completion that no longer applies (the active child
    /// changed while the call was in flight). The phase returns to idle
    /// so future triggers are not blocked; the stored prediction is
    /// untouched.
    pub fn discard(&mut self, child_id: &str) {
        debug!("Discarding stale assessment result for {}", child_id);
        if self.phase(child_id) == AssessmentPhase::Assessing {
            self.phases.insert(child_id.to_string(), AssessmentPhase::Idle);
        }
    }

    /// Drop all bookkeeping for a deleted child.
    pub fn forget(&mut self, child_id: &str) {
        self.phases.remove(child_id);
        self.last_attempted.remove(child_id);
        self.latest.remove(child_id);
    }
}
