//! Storage abstractions for the bot

pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use models::*;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use crate::error::BotError;
use crate::token::generate_token;

/// Result type for store operations
pub type StoreResult<T> = Result<T, BotError>;

/// Trait for local identity records
pub trait UserStore: Send + Sync {
    /// Create a new user. Fails with [`BotError::Conflict`] if the external
    /// identity already exists; callers should prefer [`get_or_create_user`].
    ///
    /// [`get_or_create_user`]: UserStore::get_or_create_user
    fn create_user(&self, external_id: &str, national_key: &str) -> StoreResult<User>;

    /// Get a user by their platform identity
    fn get_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>>;

    /// Idempotent create: returns the existing row if the external identity
    /// is already known, even when a different national key is passed (the
    /// original key is preserved).
    fn get_or_create_user(&self, external_id: &str, national_key: &str) -> StoreResult<User> {
        if let Some(user) = self.get_user_by_external_id(external_id)? {
            return Ok(user);
        }

        match self.create_user(external_id, national_key) {
            Ok(user) => Ok(user),
            // Lost a create/create race; the winner's row is authoritative.
            Err(BotError::Conflict) => self
                .get_user_by_external_id(external_id)?
                .ok_or_else(|| BotError::Internal("user missing after conflict".to_string())),
            Err(e) => Err(e),
        }
    }
}

/// Trait for single-use verification tokens
pub trait TokenLedger: Send + Sync {
    /// Persist a new unconsumed attempt with the given token
    fn create_attempt(&self, user_id: UserId, token: &str) -> StoreResult<VerificationAttempt>;

    /// Generate a fresh token and persist an attempt for it. Collisions are
    /// not checked.
    fn issue_token(&self, user_id: UserId) -> StoreResult<String> {
        let token = generate_token();
        self.create_attempt(user_id, &token)?;
        Ok(token)
    }

    /// Consume an unconsumed attempt matching both the user and the exact
    /// token string. Returns the pre-consumption record, or None when there
    /// is no match (wrong token, already used, or wrong user -- callers must
    /// not distinguish these to the end user).
    ///
    /// The check-then-update is only as atomic as the underlying storage's
    /// serialization (a single connection lock for [`SqliteStore`]).
    fn redeem_token(&self, user_id: UserId, token: &str)
        -> StoreResult<Option<VerificationAttempt>>;
}

impl<T: UserStore + ?Sized> UserStore for Arc<T> {
    fn create_user(&self, external_id: &str, national_key: &str) -> StoreResult<User> {
        (**self).create_user(external_id, national_key)
    }

    fn get_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>> {
        (**self).get_user_by_external_id(external_id)
    }

    fn get_or_create_user(&self, external_id: &str, national_key: &str) -> StoreResult<User> {
        (**self).get_or_create_user(external_id, national_key)
    }
}

impl<T: TokenLedger + ?Sized> TokenLedger for Arc<T> {
    fn create_attempt(&self, user_id: UserId, token: &str) -> StoreResult<VerificationAttempt> {
        (**self).create_attempt(user_id, token)
    }

    fn issue_token(&self, user_id: UserId) -> StoreResult<String> {
        (**self).issue_token(user_id)
    }

    fn redeem_token(
        &self,
        user_id: UserId,
        token: &str,
    ) -> StoreResult<Option<VerificationAttempt>> {
        (**self).redeem_token(user_id, token)
    }
}
