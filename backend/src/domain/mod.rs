//! # Domain layer
//!
//! Business logic of the care-coordination engine, independent of any
//! UI or storage mechanism:
//!
//! - **entity_store**: caregiver session, child profiles, the educator
//!   connection set, and the sticky active-child selection rule.
//! - **ledger**: the append-only log of mood / stress / activity
//!   entries, ordered chronologically per child.
//! - **invites**: invite-code generation and normalization for the
//!   educator connection protocol.
//! - **risk**: the per-child assessment state machine that decides when
//!   the prediction oracle is consulted and what happens with results.
//! - **notifications**: transient alert lifecycle (raise, dwell expiry,
//!   idempotent dismiss).
//! - **engine**: the facade composing all of the above into the
//!   synchronous, atomically-mutating core the session wraps.

pub mod commands;
pub mod engine;
pub mod entity_store;
pub mod ids;
pub mod invites;
pub mod ledger;
pub mod notifications;
pub mod risk;
pub mod seed;

pub use commands::*;
pub use engine::CareEngine;
