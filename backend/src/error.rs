use shared::UserRole;
use thiserror::Error;

/// Typed failures surfaced by engine operations.
///
/// Every variant is a synchronous validation rejection: no partial
/// mutation has occurred when one of these is returned. External
/// failures (oracle, storage) never appear here; they degrade to
/// fallback values inside the engine instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("no caregiver is signed in")]
    NotAuthenticated,

    #[error("this operation requires the {0} role")]
    RoleDenied(UserRole),

    /// The child id does not resolve to a profile visible to the
    /// current caregiver. Deliberately indistinguishable from a child
    /// that never existed.
    #[error("child unavailable: {0}")]
    UnknownChild(String),

    /// Redemption found no live profile with the given code. Never
    /// reveals whether the code used to exist.
    #[error("invalid invite code")]
    InvalidInviteCode,

    #[error("{0}")]
    Validation(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }
}
