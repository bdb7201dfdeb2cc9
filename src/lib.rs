//! Membership-verification bot
//!
//! Members register with an email address, receive a one-time token, and
//! submit it back through the bot to be matched against an external
//! membership roster and granted the corresponding roles.
//!
//! The chat transport, the roster spreadsheet, and outbound email are
//! collaborators behind narrow trait seams ([`platform::PlatformClient`],
//! [`roster::RosterFetcher`], [`email::EmailSender`]); everything else --
//! identity store, token ledger, roster cache, verification engine, role
//! reconciler -- lives here.

pub mod bot;
pub mod config;
pub mod email;
pub mod error;
pub mod platform;
pub mod roles;
pub mod roster;
pub mod store;
pub mod tasks;
pub mod token;
pub mod verify;

pub use bot::{Bot, Interaction, InteractionEvent};
pub use config::Config;
pub use email::{ConsoleSender, EmailSender, SmtpConfig, SmtpSender};
pub use error::BotError;
pub use platform::{ConsolePlatform, PlatformClient};
pub use roles::{RoleReconciler, RoleRegistry};
pub use roster::{RosterCache, RosterFetcher, RosterRow, SheetsFetcher};
pub use store::{InMemoryStore, SqliteStore, TokenLedger, UserStore};
pub use verify::VerificationEngine;
