//! SQLite-based storage implementation

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{AttemptId, StoreResult, TokenLedger, User, UserId, UserStore, VerificationAttempt};
use crate::error::BotError;

/// SQLite-based store implementing both UserStore and TokenLedger.
///
/// The connection is behind a Mutex, so all storage access is serialized
/// process-wide; the single-writer model the rest of the bot assumes.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, BotError> {
        let conn = Connection::open(path).map_err(|e| BotError::Internal(e.to_string()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA auto_vacuum = INCREMENTAL;",
        )
        .map_err(|e| BotError::Internal(e.to_string()))?;

        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create the schema idempotently. There is no migration system; the
    /// schema is small and append-only.
    fn init_schema(conn: &Connection) -> Result<(), BotError> {
        tracing::debug!("Initializing database schema");

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id TEXT NOT NULL UNIQUE,
                national_key TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS verification_attempts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                token TEXT NOT NULL,
                created_at TEXT NOT NULL,
                used_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_attempts_user_id
                ON verification_attempts(user_id);
            "#,
        )
        .map_err(|e| BotError::Internal(e.to_string()))?;

        Ok(())
    }

    fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
        let id: i64 = row.get(0)?;
        let external_id: String = row.get(1)?;
        let national_key: String = row.get(2)?;
        let created_at: String = row.get(3)?;
        Ok(User {
            id: UserId(id),
            external_id,
            national_key,
            created_at: parse_timestamp(&created_at),
        })
    }

    fn attempt_from_row(row: &Row<'_>) -> rusqlite::Result<VerificationAttempt> {
        let id: i64 = row.get(0)?;
        let user_id: i64 = row.get(1)?;
        let token: String = row.get(2)?;
        let created_at: String = row.get(3)?;
        let used_at: Option<String> = row.get(4)?;
        Ok(VerificationAttempt {
            id: AttemptId(id),
            user_id: UserId(user_id),
            token,
            created_at: parse_timestamp(&created_at),
            used_at: used_at.as_deref().map(parse_timestamp),
        })
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl UserStore for SqliteStore {
    fn create_user(&self, external_id: &str, national_key: &str) -> StoreResult<User> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO users (external_id, national_key, created_at) VALUES (?1, ?2, ?3)",
            params![external_id, national_key, now],
        )
        .map_err(|e| {
            if let rusqlite::Error::SqliteFailure(ref err, _) = e {
                if err.code == rusqlite::ErrorCode::ConstraintViolation {
                    return BotError::Conflict;
                }
            }
            BotError::Internal(e.to_string())
        })?;

        let id = conn.last_insert_rowid();

        conn.query_row(
            "SELECT id, external_id, national_key, created_at FROM users WHERE id = ?1",
            params![id],
            Self::user_from_row,
        )
        .map_err(|e| BotError::Internal(e.to_string()))
    }

    fn get_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT id, external_id, national_key, created_at FROM users WHERE external_id = ?1",
            params![external_id],
            Self::user_from_row,
        )
        .optional()
        .map_err(|e| BotError::Internal(e.to_string()))
    }
}

impl TokenLedger for SqliteStore {
    fn create_attempt(&self, user_id: UserId, token: &str) -> StoreResult<VerificationAttempt> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO verification_attempts (user_id, token, created_at) VALUES (?1, ?2, ?3)",
            params![user_id.0, token, now],
        )
        .map_err(|e| BotError::Internal(e.to_string()))?;

        let id = conn.last_insert_rowid();

        conn.query_row(
            "SELECT id, user_id, token, created_at, used_at
             FROM verification_attempts WHERE id = ?1",
            params![id],
            Self::attempt_from_row,
        )
        .map_err(|e| BotError::Internal(e.to_string()))
    }

    fn redeem_token(
        &self,
        user_id: UserId,
        token: &str,
    ) -> StoreResult<Option<VerificationAttempt>> {
        let conn = self.conn.lock().unwrap();

        // Check-then-update; the Mutex serializes redemptions so both steps
        // observe a consistent row.
        let attempt = conn
            .query_row(
                "SELECT id, user_id, token, created_at, used_at
                 FROM verification_attempts
                 WHERE user_id = ?1 AND token = ?2 AND used_at IS NULL",
                params![user_id.0, token],
                Self::attempt_from_row,
            )
            .optional()
            .map_err(|e| BotError::Internal(e.to_string()))?;

        let Some(attempt) = attempt else {
            return Ok(None);
        };

        let now = Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE verification_attempts SET used_at = ?1 WHERE id = ?2",
            params![now, attempt.id.0],
        )
        .map_err(|e| BotError::Internal(e.to_string()))?;

        Ok(Some(attempt))
    }
}
