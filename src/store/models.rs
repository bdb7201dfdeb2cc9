//! Data models for bot storage

use chrono::{DateTime, Utc};

/// Unique user identifier (surrogate key, immutable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Unique verification attempt identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(pub i64);

/// A local identity record mapping a platform identity to a roster identity
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    /// Platform identity, unique and immutable
    pub external_id: String,
    /// National-key correlating this user to a roster row. Set on first
    /// registration and deliberately never overwritten by re-registration.
    pub national_key: String,
    pub created_at: DateTime<Utc>,
}

/// A single-use verification token issuance
#[derive(Debug, Clone)]
pub struct VerificationAttempt {
    pub id: AttemptId,
    pub user_id: UserId,
    pub token: String,
    pub created_at: DateTime<Utc>,
    /// None while unconsumed; stamped exactly once on successful redemption,
    /// after which the attempt is permanently inert.
    pub used_at: Option<DateTime<Utc>>,
}
