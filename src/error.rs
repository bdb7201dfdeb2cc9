//! Bot error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    /// Registration: the submitted email matched no roster row.
    #[error("Email not found in roster")]
    EmailNotInRoster,

    /// Redemption: the platform identity has no local user record.
    #[error("User not registered")]
    NotRegistered,

    /// Redemption: the user is registered but their national key matched
    /// no roster row. Indicates a data-integrity gap between the identity
    /// store and the roster.
    #[error("National key not found in roster")]
    NotInRoster,

    /// Redemption: wrong token, already-used token, or wrong user. The
    /// reasons are deliberately collapsed into one variant so replies can
    /// never leak which part was wrong.
    #[error("Invalid or already-used token")]
    InvalidToken,

    /// A user with this external identity already exists.
    #[error("User already exists")]
    Conflict,

    /// A collaborator call failed (roster fetch, email send, platform API).
    #[error("External service failure: {0}")]
    External(String),

    /// The platform refused an operation for lack of rights.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BotError {
    /// Whether this error is one of the expected denial outcomes that gets
    /// its own localized reply, as opposed to an operational failure.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            BotError::EmailNotInRoster
                | BotError::NotRegistered
                | BotError::NotInRoster
                | BotError::InvalidToken
        )
    }
}
