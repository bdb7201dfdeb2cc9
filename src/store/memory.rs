//! In-memory storage implementation, used by tests and local development

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use chrono::Utc;

use super::{AttemptId, StoreResult, TokenLedger, User, UserId, UserStore, VerificationAttempt};
use crate::error::BotError;

/// In-memory store implementing both UserStore and TokenLedger
pub struct InMemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    attempts: RwLock<Vec<VerificationAttempt>>,
    next_user_id: AtomicI64,
    next_attempt_id: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            attempts: RwLock::new(Vec::new()),
            next_user_id: AtomicI64::new(1),
            next_attempt_id: AtomicI64::new(1),
        }
    }

    /// Number of attempts recorded for a user (for test assertions)
    pub fn attempt_count(&self, user_id: UserId) -> usize {
        self.attempts
            .read()
            .unwrap()
            .iter()
            .filter(|a| a.user_id == user_id)
            .count()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for InMemoryStore {
    fn create_user(&self, external_id: &str, national_key: &str) -> StoreResult<User> {
        let mut users = self.users.write().unwrap();

        if users.values().any(|u| u.external_id == external_id) {
            return Err(BotError::Conflict);
        }

        let id = UserId(self.next_user_id.fetch_add(1, Ordering::SeqCst));
        let user = User {
            id,
            external_id: external_id.to_string(),
            national_key: national_key.to_string(),
            created_at: Utc::now(),
        };
        users.insert(id, user.clone());
        Ok(user)
    }

    fn get_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.external_id == external_id)
            .cloned())
    }
}

impl TokenLedger for InMemoryStore {
    fn create_attempt(&self, user_id: UserId, token: &str) -> StoreResult<VerificationAttempt> {
        let attempt = VerificationAttempt {
            id: AttemptId(self.next_attempt_id.fetch_add(1, Ordering::SeqCst)),
            user_id,
            token: token.to_string(),
            created_at: Utc::now(),
            used_at: None,
        };
        self.attempts.write().unwrap().push(attempt.clone());
        Ok(attempt)
    }

    fn redeem_token(
        &self,
        user_id: UserId,
        token: &str,
    ) -> StoreResult<Option<VerificationAttempt>> {
        let mut attempts = self.attempts.write().unwrap();

        let Some(attempt) = attempts
            .iter_mut()
            .find(|a| a.user_id == user_id && a.token == token && a.used_at.is_none())
        else {
            return Ok(None);
        };

        let original = attempt.clone();
        attempt.used_at = Some(Utc::now());
        Ok(Some(original))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_idempotent() {
        let store = InMemoryStore::new();

        let first = store.get_or_create_user("U1", "111").unwrap();
        let second = store.get_or_create_user("U1", "222").unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.national_key, "111");
    }

    #[test]
    fn test_token_single_use() {
        let store = InMemoryStore::new();

        let user = store.create_user("U1", "111").unwrap();
        let token = store.issue_token(user.id).unwrap();

        assert!(store.redeem_token(user.id, &token).unwrap().is_some());
        assert!(store.redeem_token(user.id, &token).unwrap().is_none());
    }

    #[test]
    fn test_token_wrong_user() {
        let store = InMemoryStore::new();

        let u1 = store.create_user("U1", "111").unwrap();
        let u2 = store.create_user("U2", "222").unwrap();
        let token = store.issue_token(u1.id).unwrap();

        assert!(store.redeem_token(u2.id, &token).unwrap().is_none());
    }
}
