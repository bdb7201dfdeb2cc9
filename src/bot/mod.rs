//! Interaction dispatch and command handlers
//!
//! Inbound platform events carry either a command name or a submitted-form
//! payload plus the invoking user's identity. Every handler failure is
//! caught at the dispatch boundary and converted to a user-visible reply;
//! nothing here ever crashes the process.

pub mod messages;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::email::EmailSender;
use crate::error::BotError;
use crate::platform::{FormSpec, GuildId, InteractionId, PlatformClient};
use crate::roles::RoleReconciler;
use crate::store::{TokenLedger, UserStore};
use crate::verify::VerificationEngine;

pub const PING_COMMAND: &str = "ping";
pub const REGISTER_COMMAND: &str = "prijavi-se";
pub const REDEEM_COMMAND: &str = "predaj-kod";

pub const REGISTER_FORM_ID: &str = "registerModal";
pub const REDEEM_FORM_ID: &str = "codeSubmitModal";

/// The invoking user's context, shared by all event kinds
#[derive(Debug, Clone)]
pub struct Interaction {
    pub id: InteractionId,
    /// Platform identity of the invoking user
    pub user: String,
    pub guild: Option<GuildId>,
}

/// An inbound platform event
#[derive(Debug, Clone)]
pub enum InteractionEvent {
    Command {
        name: String,
        interaction: Interaction,
    },
    FormSubmit {
        form_id: String,
        value: String,
        interaction: Interaction,
    },
}

impl InteractionEvent {
    fn interaction(&self) -> &Interaction {
        match self {
            InteractionEvent::Command { interaction, .. } => interaction,
            InteractionEvent::FormSubmit { interaction, .. } => interaction,
        }
    }
}

pub struct Bot<S, E, P> {
    engine: VerificationEngine<S, E>,
    reconciler: Arc<RoleReconciler>,
    platform: Arc<P>,
}

impl<S, E, P> Bot<S, E, P>
where
    S: UserStore + TokenLedger,
    E: EmailSender,
    P: PlatformClient,
{
    pub fn new(
        engine: VerificationEngine<S, E>,
        reconciler: Arc<RoleReconciler>,
        platform: Arc<P>,
    ) -> Self {
        Self {
            engine,
            reconciler,
            platform,
        }
    }

    /// Consume events until the channel closes
    pub async fn run(&self, mut events: mpsc::Receiver<InteractionEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
    }

    /// Dispatch boundary: handler errors become replies, never panics or
    /// process exits. Denial outcomes get their localized message; anything
    /// else is logged and answered with the generic retry message.
    pub async fn handle_event(&self, event: InteractionEvent) {
        tracing::trace!(?event, "Received interaction");

        let interaction = event.interaction().clone();

        if let Err(e) = self.dispatch(event).await {
            let message = if e.is_denial() {
                messages::denial(&e)
            } else {
                tracing::error!(user = %interaction.user, error = %e, "Error handling interaction");
                messages::GENERIC_FAILURE
            };

            if let Err(reply_err) = self.platform.reply(&interaction.id, message, true).await {
                tracing::error!(error = %reply_err, "Error replying to interaction");
            }
        }
    }

    async fn dispatch(&self, event: InteractionEvent) -> Result<(), BotError> {
        match event {
            InteractionEvent::Command { name, interaction } => {
                tracing::debug!(command = %name, user = %interaction.user, "Received command");
                match name.as_str() {
                    PING_COMMAND => self.platform.reply(&interaction.id, "Pong!", true).await,
                    REGISTER_COMMAND => self.show_register_form(&interaction.id).await,
                    REDEEM_COMMAND => self.show_redeem_form(&interaction.id).await,
                    _ => {
                        tracing::warn!(command = %name, "Unknown command");
                        Ok(())
                    }
                }
            }
            InteractionEvent::FormSubmit {
                form_id,
                value,
                interaction,
            } => match form_id.as_str() {
                REGISTER_FORM_ID => self.handle_register_submit(&interaction, &value).await,
                REDEEM_FORM_ID => self.handle_redeem_submit(&interaction, &value).await,
                _ => {
                    tracing::warn!(form_id = %form_id, "Unknown form");
                    Ok(())
                }
            },
        }
    }

    async fn show_register_form(&self, interaction: &InteractionId) -> Result<(), BotError> {
        self.platform
            .show_form(
                interaction,
                FormSpec {
                    form_id: REGISTER_FORM_ID.to_string(),
                    title: "Registriraj se".to_string(),
                    label: "Email koji je predan u formi za članove".to_string(),
                    placeholder: "ime.prezime@kset.org / moj-email@gmail.com".to_string(),
                },
            )
            .await
    }

    async fn show_redeem_form(&self, interaction: &InteractionId) -> Result<(), BotError> {
        self.platform
            .show_form(
                interaction,
                FormSpec {
                    form_id: REDEEM_FORM_ID.to_string(),
                    title: "Predaj kod".to_string(),
                    label: "Upiši kod koji ti je poslan na email".to_string(),
                    placeholder: "abcdefg-1234567".to_string(),
                },
            )
            .await
    }

    async fn handle_register_submit(
        &self,
        interaction: &Interaction,
        value: &str,
    ) -> Result<(), BotError> {
        let email = value.trim();
        tracing::debug!(user = %interaction.user, "Registration form submitted");

        self.engine.register(&interaction.user, email).await?;

        self.platform
            .reply(&interaction.id, messages::TOKEN_SENT, true)
            .await
    }

    async fn handle_redeem_submit(
        &self,
        interaction: &Interaction,
        value: &str,
    ) -> Result<(), BotError> {
        let token = value.trim().to_lowercase();
        tracing::debug!(user = %interaction.user, "Verification token submitted");

        let redemption = self.engine.redeem(&interaction.user, &token).await?;

        let Some(guild) = &interaction.guild else {
            return Err(BotError::Internal(
                "redeem interaction outside a guild".to_string(),
            ));
        };

        // Display name first. Missing rights are logged and swallowed;
        // any other failure aborts with its own reply.
        if !redemption.row.full_name.trim().is_empty() {
            let result = self
                .platform
                .set_member_display_name(
                    guild,
                    &interaction.user,
                    redemption.row.full_name.trim(),
                    "Actual user's name",
                )
                .await;

            match result {
                Ok(()) => {}
                Err(BotError::PermissionDenied(reason)) => {
                    tracing::error!(user = %interaction.user, reason, "Failed to set display name");
                }
                Err(e) => {
                    tracing::error!(user = %interaction.user, error = %e, "Failed to set display name");
                    return self
                        .platform
                        .reply(&interaction.id, messages::NAME_FAILURE, true)
                        .await;
                }
            }
        }

        // Redemption grants only; revocation is the bulk sync's job
        if let Err(e) = self
            .reconciler
            .grant_roles(&*self.platform, guild, &interaction.user, &redemption.row)
            .await
        {
            tracing::error!(user = %interaction.user, error = %e, "Failed to add roles");
            return self
                .platform
                .reply(&interaction.id, messages::ROLES_FAILURE, true)
                .await;
        }

        tracing::info!(user = %interaction.user, "User successfully verified");

        self.platform
            .reply(&interaction.id, messages::REDEEM_SUCCESS, true)
            .await
    }
}
