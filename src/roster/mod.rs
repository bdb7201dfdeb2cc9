//! Roster cache: a time-boxed, manually-refreshable snapshot of the external
//! membership roster, with lookups by email and by national key.
//!
//! The external roster is the source of truth; this module never writes to
//! it. Refresh failures retain the previous snapshot, so a transient outage
//! never blanks out known-good data.

pub mod sheets;

pub use sheets::SheetsFetcher;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::BotError;

/// Column headers of the external roster sheet
pub mod columns {
    pub const FULL_NAME: &str = "Ime i prezime";
    pub const NATIONAL_KEY: &str = "OIB";
    pub const CATEGORY: &str = "Trenutna vrsta članstva";
    pub const SECTION: &str = "Matična sekcija";
    pub const PRIMARY_EMAIL: &str = "KSET e-pošta";
    pub const ALT_EMAIL: &str = "Privatna e-pošta";
}

/// One row of the external roster, typed at the cache boundary so the rest
/// of the bot never deals in raw column names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterRow {
    pub full_name: String,
    pub national_key: String,
    /// Membership-category label, e.g. "Aktivna"
    pub category: String,
    /// Section/division label, e.g. "Računarska"
    pub section: String,
    pub primary_email: String,
    pub alt_email: String,
}

impl RosterRow {
    /// Map a raw header->cell record into a typed row. Unknown columns are
    /// ignored; missing columns become empty strings.
    pub fn from_record(record: &HashMap<String, String>) -> Self {
        let get = |key: &str| record.get(key).cloned().unwrap_or_default();

        Self {
            full_name: get(columns::FULL_NAME),
            national_key: get(columns::NATIONAL_KEY),
            category: get(columns::CATEGORY),
            section: get(columns::SECTION),
            primary_email: get(columns::PRIMARY_EMAIL),
            alt_email: get(columns::ALT_EMAIL),
        }
    }
}

/// Trait for fetching the full roster from the external source
#[async_trait]
pub trait RosterFetcher: Send + Sync {
    /// Fetch all rows of the roster sheet, in sheet order
    async fn fetch_rows(&self) -> Result<Vec<RosterRow>, BotError>;
}

/// Cached snapshot of the roster, populated lazily on first access or
/// explicitly by the periodic refresh task.
pub struct RosterCache {
    fetcher: Box<dyn RosterFetcher>,
    snapshot: RwLock<Arc<Vec<RosterRow>>>,
}

impl RosterCache {
    pub fn new(fetcher: impl RosterFetcher + 'static) -> Self {
        Self {
            fetcher: Box::new(fetcher),
            snapshot: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Current snapshot; triggers a refresh only when the cache is empty.
    pub async fn rows(&self) -> Arc<Vec<RosterRow>> {
        if self.snapshot.read().unwrap().is_empty() {
            self.refresh().await;
        }

        self.snapshot.read().unwrap().clone()
    }

    /// Re-fetch the entire roster and replace the snapshot. A fetch failure
    /// is logged and the previous snapshot retained; never propagated.
    pub async fn refresh(&self) {
        tracing::info!("Refreshing roster cache");

        match self.fetcher.fetch_rows().await {
            Ok(rows) => {
                tracing::info!(rows = rows.len(), "Roster cache refreshed");
                *self.snapshot.write().unwrap() = Arc::new(rows);
            }
            Err(e) => {
                tracing::error!(error = %e, "Roster refresh failed; keeping previous snapshot");
            }
        }
    }

    /// Case-insensitive, trimmed match against either email column.
    /// First match wins.
    pub async fn find_by_email(&self, email: &str) -> Option<RosterRow> {
        let needle = email.trim().to_lowercase();
        let rows = self.rows().await;

        rows.iter()
            .find(|row| {
                row.primary_email.trim().to_lowercase() == needle
                    || row.alt_email.trim().to_lowercase() == needle
            })
            .cloned()
    }

    /// Trimmed exact match against the national-key column. First match wins.
    pub async fn find_by_national_key(&self, key: &str) -> Option<RosterRow> {
        let needle = key.trim();
        let rows = self.rows().await;

        rows.iter()
            .find(|row| row.national_key.trim() == needle)
            .cloned()
    }
}
