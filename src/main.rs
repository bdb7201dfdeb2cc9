//! Membership-verification bot entrypoint
//!
//! Wires the SQLite store, roster cache, email transport, and role
//! reconciler together, runs the startup bootstrap, and starts the
//! supervised periodic tasks plus the interaction dispatch loop.
//!
//! The chat transport is a collaborator behind the `PlatformClient` trait;
//! this binary runs against the console implementation, which logs outbound
//! operations. A real deployment plugs a gateway adapter into the event
//! channel instead.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rosterbot::{
    bot::InteractionEvent, Bot, Config, ConsolePlatform, ConsoleSender, EmailSender,
    RoleReconciler, RosterCache, SheetsFetcher, SmtpSender, SqliteStore, VerificationEngine,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rosterbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(database = %config.database_url, "Loaded configuration");

    let store = Arc::new(
        SqliteStore::open(&config.database_url).context("Failed to open database")?,
    );

    let roster = Arc::new(RosterCache::new(SheetsFetcher::new(
        config.spreadsheet_id.clone(),
        config.spreadsheet_sheet.clone(),
        config.sheets_api_key.clone(),
    )));

    let email: Box<dyn EmailSender> = match config.smtp.clone() {
        Some(smtp) => Box::new(
            SmtpSender::new(smtp)
                .map_err(|e| anyhow::anyhow!(e))
                .context("Failed to set up SMTP transport")?,
        ),
        None => {
            tracing::warn!("No SMTP configuration; emails will be printed to the console");
            Box::new(ConsoleSender::new())
        }
    };

    let platform = Arc::new(ConsolePlatform::new());
    let reconciler = Arc::new(RoleReconciler::new());

    // Startup bootstrap: roles first, then one full member sync
    reconciler.ensure_roles(&*platform, &roster).await;
    reconciler.sync_all(&*platform, &roster, &store).await;

    {
        let roster = roster.clone();
        let reconciler = reconciler.clone();
        let platform = platform.clone();
        let store = store.clone();
        rosterbot::tasks::spawn_supervised("roster-sync", config.sync_period, move || {
            let roster = roster.clone();
            let reconciler = reconciler.clone();
            let platform = platform.clone();
            let store = store.clone();
            async move {
                roster.refresh().await;
                reconciler.sync_all(&*platform, &roster, &store).await;
                Ok(())
            }
        });
    }

    {
        let roster = roster.clone();
        let reconciler = reconciler.clone();
        let platform = platform.clone();
        rosterbot::tasks::spawn_supervised(
            "role-bootstrap",
            config.role_bootstrap_period,
            move || {
                let roster = roster.clone();
                let reconciler = reconciler.clone();
                let platform = platform.clone();
                async move {
                    reconciler.ensure_roles(&*platform, &roster).await;
                    Ok(())
                }
            },
        );
    }

    let engine = VerificationEngine::new(
        store.clone(),
        email,
        roster.clone(),
        config.community_name.clone(),
    );
    let bot = Bot::new(engine, reconciler, platform);

    // The gateway adapter owns the sender side; keeping it alive here keeps
    // the dispatch loop running.
    let (_events_tx, events_rx) = mpsc::channel::<InteractionEvent>(64);

    tracing::info!("Bot is ready");
    bot.run(events_rx).await;

    Ok(())
}
