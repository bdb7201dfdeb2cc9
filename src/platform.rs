//! Chat-platform client contract
//!
//! The actual chat transport is a collaborator, not part of this crate; the
//! core only depends on the operations below. Every operation is fallible
//! and independently catchable.

use async_trait::async_trait;

use crate::error::BotError;

/// A community instance (guild/server) identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GuildId(pub String);

/// A platform-assigned role identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleId(pub String);

/// An identifier for an in-flight interaction, used to address replies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionId(pub String);

/// A member of a community instance, with their current role ids
#[derive(Debug, Clone)]
pub struct Member {
    pub external_id: String,
    pub role_ids: Vec<RoleId>,
}

/// A role as reported by the platform
#[derive(Debug, Clone)]
pub struct PlatformRole {
    pub id: RoleId,
    pub name: String,
}

/// Parameters for creating a platform role
#[derive(Debug, Clone)]
pub struct CreateRole {
    pub name: String,
    pub color: Option<String>,
    pub reason: Option<String>,
}

/// A short form shown to the user to collect one text input
#[derive(Debug, Clone)]
pub struct FormSpec {
    pub form_id: String,
    pub title: String,
    pub label: String,
    pub placeholder: String,
}

#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Reply to an interaction with a text message
    async fn reply(
        &self,
        interaction: &InteractionId,
        message: &str,
        ephemeral: bool,
    ) -> Result<(), BotError>;

    /// Show a short single-input form to the invoking user
    async fn show_form(&self, interaction: &InteractionId, form: FormSpec) -> Result<(), BotError>;

    /// List all community instances the bot can access
    async fn guilds(&self) -> Result<Vec<GuildId>, BotError>;

    /// Fetch all members of a community instance
    async fn members(&self, guild: &GuildId) -> Result<Vec<Member>, BotError>;

    /// List all roles of a community instance
    async fn roles(&self, guild: &GuildId) -> Result<Vec<PlatformRole>, BotError>;

    /// Create a role, returning the platform's view of it
    async fn create_role(
        &self,
        guild: &GuildId,
        role: CreateRole,
    ) -> Result<PlatformRole, BotError>;

    /// Add roles to a member in one batched call
    async fn add_member_roles(
        &self,
        guild: &GuildId,
        member: &str,
        roles: &[RoleId],
        reason: &str,
    ) -> Result<(), BotError>;

    /// Remove roles from a member in one batched call
    async fn remove_member_roles(
        &self,
        guild: &GuildId,
        member: &str,
        roles: &[RoleId],
        reason: &str,
    ) -> Result<(), BotError>;

    /// Set a member's display name
    async fn set_member_display_name(
        &self,
        guild: &GuildId,
        member: &str,
        name: &str,
        reason: &str,
    ) -> Result<(), BotError>;

    /// Make the bot's own role appear separately in the member list. The
    /// platform needs this for permission propagation; failure is non-fatal.
    async fn hoist_own_role(&self, guild: &GuildId) -> Result<(), BotError>;
}

/// Platform client that logs every outbound operation and owns no guilds.
/// Lets the bot run end to end locally without a chat transport.
pub struct ConsolePlatform;

impl ConsolePlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsolePlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformClient for ConsolePlatform {
    async fn reply(
        &self,
        interaction: &InteractionId,
        message: &str,
        ephemeral: bool,
    ) -> Result<(), BotError> {
        tracing::info!(interaction = %interaction.0, ephemeral, "REPLY: {}", message);
        Ok(())
    }

    async fn show_form(&self, interaction: &InteractionId, form: FormSpec) -> Result<(), BotError> {
        tracing::info!(interaction = %interaction.0, form_id = %form.form_id, "FORM: {}", form.title);
        Ok(())
    }

    async fn guilds(&self) -> Result<Vec<GuildId>, BotError> {
        Ok(Vec::new())
    }

    async fn members(&self, _guild: &GuildId) -> Result<Vec<Member>, BotError> {
        Ok(Vec::new())
    }

    async fn roles(&self, _guild: &GuildId) -> Result<Vec<PlatformRole>, BotError> {
        Ok(Vec::new())
    }

    async fn create_role(
        &self,
        guild: &GuildId,
        role: CreateRole,
    ) -> Result<PlatformRole, BotError> {
        tracing::info!(guild = %guild.0, name = %role.name, "CREATE ROLE");
        Ok(PlatformRole {
            id: RoleId(format!("console-{}", role.name)),
            name: role.name,
        })
    }

    async fn add_member_roles(
        &self,
        guild: &GuildId,
        member: &str,
        roles: &[RoleId],
        reason: &str,
    ) -> Result<(), BotError> {
        tracing::info!(guild = %guild.0, member, ?roles, reason, "ADD ROLES");
        Ok(())
    }

    async fn remove_member_roles(
        &self,
        guild: &GuildId,
        member: &str,
        roles: &[RoleId],
        reason: &str,
    ) -> Result<(), BotError> {
        tracing::info!(guild = %guild.0, member, ?roles, reason, "REMOVE ROLES");
        Ok(())
    }

    async fn set_member_display_name(
        &self,
        guild: &GuildId,
        member: &str,
        name: &str,
        reason: &str,
    ) -> Result<(), BotError> {
        tracing::info!(guild = %guild.0, member, name, reason, "SET DISPLAY NAME");
        Ok(())
    }

    async fn hoist_own_role(&self, guild: &GuildId) -> Result<(), BotError> {
        tracing::info!(guild = %guild.0, "HOIST OWN ROLE");
        Ok(())
    }
}
