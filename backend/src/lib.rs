//! # Careloop backend
//!
//! Care-coordination state engine for caregivers jointly tracking a
//! child's mood, stress, and activity, with a predictive meltdown-risk
//! signal derived from recent history.
//!
//! The backend is UI-agnostic and splits into:
//! - **domain**: the entity store, append-only log ledger, invite-code
//!   connection protocol, risk-assessment scheduler, and notification
//!   center, composed by [`CareEngine`].
//! - **storage**: a synchronous key-value blob store the engine flushes
//!   to best-effort after every mutation.
//! - **oracle**: the asynchronous risk-prediction boundary (live Gemini
//!   client or a deterministic offline stand-in).
//! - **session**: the async facade that serializes mutations, dispatches
//!   oracle calls without blocking, and signals state changes to a UI.
//!
//! All mutation happens on one logical thread: [`session::CareSession`]
//! holds the engine behind a mutex and only the oracle call ever
//! suspends, delivering its outcome as a discrete later state update.

pub mod config;
pub mod domain;
pub mod error;
pub mod oracle;
pub mod session;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;
use log::info;

pub use config::EngineConfig;
pub use domain::engine::CareEngine;
pub use error::{EngineError, EngineResult};
pub use session::CareSession;

/// Initialize the backend: open the durable store, load (or seed) engine
/// state, pick an oracle from the configuration, and wrap everything in
/// an async session. Must run inside a tokio runtime.
pub async fn bootstrap(config: EngineConfig) -> Result<CareSession> {
    info!("Opening data directory {}", config.data_dir.display());
    let store = Arc::new(storage::FsBlobStore::new(&config.data_dir)?);

    info!("Loading engine state");
    let engine = CareEngine::load(store);

    let oracle = oracle::from_config(&config);
    Ok(CareSession::new(engine, oracle))
}
