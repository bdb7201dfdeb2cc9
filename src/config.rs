//! Bot configuration, loaded from environment variables at bootstrap.
//! Missing required variables are fatal.

use std::time::Duration;

use anyhow::{bail, Result};

use crate::email::SmtpConfig;

const TRUEISH: [&str; 5] = ["true", "1", "t", "y", "yes"];

#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the SQLite database file
    pub database_url: String,

    /// Spreadsheet holding the membership roster
    pub spreadsheet_id: String,
    /// Name of the sheet/tab with everybody's rows
    pub spreadsheet_sheet: String,
    /// API key for the spreadsheet values endpoint
    pub sheets_api_key: String,

    /// SMTP configuration; verification emails go to the console when absent
    pub smtp: Option<SmtpConfig>,

    /// Community name used in email templates
    pub community_name: String,

    /// Cadence of roster refresh + member role sync
    pub sync_period: Duration,
    /// Cadence of role bootstrap re-runs
    pub role_bootstrap_period: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: require("DATABASE_URL")?,
            spreadsheet_id: require("SPREADSHEET_ID")?,
            spreadsheet_sheet: require("SPREADSHEET_SHEET")?,
            sheets_api_key: require("SHEETS_API_KEY")?,
            smtp: smtp_from_env()?,
            community_name: get_env("COMMUNITY_NAME").unwrap_or_else(|| "Discord".to_string()),
            sync_period: Duration::from_secs(10 * 60),
            role_bootstrap_period: Duration::from_secs(24 * 60 * 60),
        })
    }
}

/// Non-empty env var, or None
fn get_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn require(key: &str) -> Result<String> {
    match get_env(key) {
        Some(value) => Ok(value),
        None => bail!("Missing required environment variable {}", key),
    }
}

/// SMTP config is all-or-nothing: no SMTP_HOST means console delivery, but
/// a partially configured transport is a bootstrap error.
fn smtp_from_env() -> Result<Option<SmtpConfig>> {
    let Some(host) = get_env("SMTP_HOST") else {
        return Ok(None);
    };

    let port = match get_env("SMTP_PORT") {
        Some(raw) => match raw.parse::<u16>() {
            Ok(port) => port,
            Err(_) => bail!("SMTP_PORT is not a valid port number: {}", raw),
        },
        None => 465,
    };

    let secure = get_env("SMTP_SECURE")
        .map(|s| TRUEISH.contains(&s.trim().to_lowercase().as_str()))
        .unwrap_or(false);

    Ok(Some(SmtpConfig {
        host,
        port,
        secure,
        username: require("SMTP_USER")?,
        password: require("SMTP_PASS")?,
        from_email: require("FROM_EMAIL")?,
        from_name: get_env("FROM_NAME"),
    }))
}
