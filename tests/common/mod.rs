//! Common test doubles for bot integration tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use rosterbot::platform::{
    CreateRole, FormSpec, GuildId, InteractionId, Member, PlatformClient, PlatformRole, RoleId,
};
use rosterbot::{BotError, EmailSender, RosterFetcher, RosterRow};

/// Email sender that captures every message, exposing the last token sent.
/// Sends fail while the toggle is set.
#[derive(Default, Clone)]
pub struct MockEmailSender {
    pub sent: Arc<RwLock<Vec<(String, String, String)>>>,
    pub fail: Arc<AtomicBool>,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract the token from the last email sent to an address
    pub fn last_token(&self, email: &str) -> Option<String> {
        self.sent
            .read()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _, _)| to == email)
            .and_then(|(_, _, body)| {
                body.lines()
                    .find(|line| line.len() == 15 && line.as_bytes().get(7) == Some(&b'-'))
                    .map(|line| line.to_string())
            })
    }
}

impl EmailSender for MockEmailSender {
    fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err("SMTP unavailable".to_string());
        }
        self.sent.write().unwrap().push((
            to.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}

/// Roster fetcher over a fixed row set, with a failure toggle
pub struct StaticRoster {
    rows: Vec<RosterRow>,
    pub fail: Arc<AtomicBool>,
}

impl StaticRoster {
    pub fn new(rows: Vec<RosterRow>) -> Self {
        Self {
            rows,
            fail: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl RosterFetcher for StaticRoster {
    async fn fetch_rows(&self) -> Result<Vec<RosterRow>, BotError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BotError::External("sheet unavailable".to_string()));
        }
        Ok(self.rows.clone())
    }
}

/// One recorded outbound platform call
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    Reply { message: String },
    ShowForm { form_id: String },
    AddRoles { member: String, roles: Vec<RoleId> },
    RemoveRoles { member: String, roles: Vec<RoleId> },
    SetDisplayName { member: String, name: String },
    CreateRole { name: String },
}

/// Platform client that records every call against a single fake guild
pub struct RecordingPlatform {
    pub guild: GuildId,
    pub members: RwLock<Vec<Member>>,
    pub guild_roles: RwLock<Vec<PlatformRole>>,
    pub calls: RwLock<Vec<PlatformCall>>,
    /// When true, display-name calls fail with PermissionDenied
    pub deny_display_name: AtomicBool,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self {
            guild: GuildId("guild-1".to_string()),
            members: RwLock::new(Vec::new()),
            guild_roles: RwLock::new(Vec::new()),
            calls: RwLock::new(Vec::new()),
            deny_display_name: AtomicBool::new(false),
        }
    }

    pub fn add_member(&self, external_id: &str, role_ids: Vec<RoleId>) {
        self.members.write().unwrap().push(Member {
            external_id: external_id.to_string(),
            role_ids,
        });
    }

    pub fn add_guild_role(&self, id: &str, name: &str) {
        self.guild_roles.write().unwrap().push(PlatformRole {
            id: RoleId(id.to_string()),
            name: name.to_string(),
        });
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn role_mutation_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, PlatformCall::AddRoles { .. } | PlatformCall::RemoveRoles { .. }))
            .count()
    }

    fn record(&self, call: PlatformCall) {
        self.calls.write().unwrap().push(call);
    }
}

impl Default for RecordingPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformClient for RecordingPlatform {
    async fn reply(
        &self,
        _interaction: &InteractionId,
        message: &str,
        _ephemeral: bool,
    ) -> Result<(), BotError> {
        self.record(PlatformCall::Reply {
            message: message.to_string(),
        });
        Ok(())
    }

    async fn show_form(
        &self,
        _interaction: &InteractionId,
        form: FormSpec,
    ) -> Result<(), BotError> {
        self.record(PlatformCall::ShowForm {
            form_id: form.form_id,
        });
        Ok(())
    }

    async fn guilds(&self) -> Result<Vec<GuildId>, BotError> {
        Ok(vec![self.guild.clone()])
    }

    async fn members(&self, _guild: &GuildId) -> Result<Vec<Member>, BotError> {
        Ok(self.members.read().unwrap().clone())
    }

    async fn roles(&self, _guild: &GuildId) -> Result<Vec<PlatformRole>, BotError> {
        Ok(self.guild_roles.read().unwrap().clone())
    }

    async fn create_role(
        &self,
        _guild: &GuildId,
        role: CreateRole,
    ) -> Result<PlatformRole, BotError> {
        let created = PlatformRole {
            id: RoleId(format!("role-{}", role.name)),
            name: role.name.clone(),
        };
        self.guild_roles.write().unwrap().push(created.clone());
        self.record(PlatformCall::CreateRole { name: role.name });
        Ok(created)
    }

    async fn add_member_roles(
        &self,
        _guild: &GuildId,
        member: &str,
        roles: &[RoleId],
        _reason: &str,
    ) -> Result<(), BotError> {
        self.record(PlatformCall::AddRoles {
            member: member.to_string(),
            roles: roles.to_vec(),
        });

        let mut members = self.members.write().unwrap();
        if let Some(m) = members.iter_mut().find(|m| m.external_id == member) {
            for role in roles {
                if !m.role_ids.contains(role) {
                    m.role_ids.push(role.clone());
                }
            }
        }
        Ok(())
    }

    async fn remove_member_roles(
        &self,
        _guild: &GuildId,
        member: &str,
        roles: &[RoleId],
        _reason: &str,
    ) -> Result<(), BotError> {
        self.record(PlatformCall::RemoveRoles {
            member: member.to_string(),
            roles: roles.to_vec(),
        });

        let mut members = self.members.write().unwrap();
        if let Some(m) = members.iter_mut().find(|m| m.external_id == member) {
            m.role_ids.retain(|r| !roles.contains(r));
        }
        Ok(())
    }

    async fn set_member_display_name(
        &self,
        _guild: &GuildId,
        member: &str,
        name: &str,
        _reason: &str,
    ) -> Result<(), BotError> {
        if self.deny_display_name.load(Ordering::SeqCst) {
            return Err(BotError::PermissionDenied(
                "missing manage-nicknames".to_string(),
            ));
        }

        self.record(PlatformCall::SetDisplayName {
            member: member.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    async fn hoist_own_role(&self, _guild: &GuildId) -> Result<(), BotError> {
        Ok(())
    }
}

/// Roster rows used across the integration tests
pub fn sample_roster() -> Vec<RosterRow> {
    vec![
        RosterRow {
            full_name: "Ana Anić".to_string(),
            national_key: "11111111111".to_string(),
            category: "Aktivna".to_string(),
            section: "Računarska".to_string(),
            primary_email: "ana@kset.org".to_string(),
            alt_email: "ana.anic@gmail.com".to_string(),
        },
        RosterRow {
            full_name: "Ivo Ivić".to_string(),
            national_key: "22222222222".to_string(),
            category: "Redovna".to_string(),
            section: "Foto".to_string(),
            primary_email: "ivo@kset.org".to_string(),
            alt_email: String::new(),
        },
    ]
}
