//! Role reconciliation: maps roster categories and sections to platform
//! roles, bootstraps missing roles, and keeps members' role sets in line
//! with the roster.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

use crate::error::BotError;
use crate::platform::{CreateRole, GuildId, PlatformClient, RoleId};
use crate::roster::{RosterCache, RosterRow};
use crate::store::UserStore;

/// A known role: human-readable label plus the platform role backing it
#[derive(Debug, Clone)]
pub struct RoleDescriptor {
    pub name: String,
    /// Only the built-in category roles carry a color
    pub color: Option<String>,
    /// Platform-assigned id; filled in once the backing role exists
    pub id: Option<RoleId>,
    /// Audit string supplied on role creation
    pub reason: Option<String>,
}

/// Registry of role descriptors keyed by label. All read-modify-write
/// sequences go through the inner lock; readers tolerate eventually
/// consistent views.
pub struct RoleRegistry {
    inner: Mutex<HashMap<String, RoleDescriptor>>,
}

impl RoleRegistry {
    /// Registry seeded with the built-in membership-category roles
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        for (name, color) in [("Narančasti", "#ff8c00"), ("Plavi", "#1976d2")] {
            entries.insert(
                name.to_string(),
                RoleDescriptor {
                    name: name.to_string(),
                    color: Some(color.to_string()),
                    id: None,
                    reason: None,
                },
            );
        }

        Self {
            inner: Mutex::new(entries),
        }
    }

    /// Insert a descriptor for a label not yet known; existing entries are
    /// left untouched.
    pub fn ensure_label(&self, name: &str, reason: String) {
        let mut entries = self.inner.lock().unwrap();
        entries.entry(name.to_string()).or_insert(RoleDescriptor {
            name: name.to_string(),
            color: None,
            id: None,
            reason: Some(reason),
        });
    }

    /// Record the platform id backing a label
    pub fn set_role_id(&self, name: &str, id: RoleId) {
        let mut entries = self.inner.lock().unwrap();
        if let Some(entry) = entries.get_mut(name) {
            entry.id = Some(id);
        }
    }

    /// Platform id for a label, if the backing role exists
    pub fn role_id(&self, name: &str) -> Option<RoleId> {
        self.inner.lock().unwrap().get(name).and_then(|d| d.id.clone())
    }

    /// All platform ids the registry knows about. Used to fence the diff so
    /// roles this bot does not manage are never touched.
    pub fn known_ids(&self) -> HashSet<RoleId> {
        self.inner
            .lock()
            .unwrap()
            .values()
            .filter_map(|d| d.id.clone())
            .collect()
    }

    /// Snapshot of all descriptors, sorted by name for stable iteration
    pub fn snapshot(&self) -> Vec<RoleDescriptor> {
        let mut entries: Vec<_> = self.inner.lock().unwrap().values().cloned().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Lookup key for a membership-category label: a trailing "a" becomes "i"
/// ("Aktivna" -> "Aktivni", "Redovna" -> "Redovni"). Role names use the
/// plural form while the roster stores the singular.
pub fn membership_lookup_key(category: &str) -> String {
    match category.strip_suffix('a') {
        Some(stem) => format!("{}i", stem),
        None => category.to_string(),
    }
}

/// Owns the role registry and drives role bootstrap and member sync
pub struct RoleReconciler {
    registry: RoleRegistry,
}

impl RoleReconciler {
    pub fn new() -> Self {
        Self {
            registry: RoleRegistry::new(),
        }
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    /// Bootstrap: learn section labels from the roster, then make sure every
    /// registry entry has a backing platform role in every guild (adopt by
    /// exact name, else create). Per-guild failures are logged and the other
    /// guilds still processed.
    pub async fn ensure_roles<P: PlatformClient>(&self, platform: &P, roster: &RosterCache) {
        tracing::info!("Initializing roles");

        let rows = roster.rows().await;
        for row in rows.iter() {
            let section = row.section.trim();
            if section.is_empty() {
                continue;
            }
            self.registry
                .ensure_label(section, format!("{} sekcija", section));
        }

        let guilds = match platform.guilds().await {
            Ok(guilds) => guilds,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch guilds; skipping role bootstrap");
                return;
            }
        };

        for guild in &guilds {
            if let Err(e) = self.ensure_guild_roles(platform, guild).await {
                tracing::error!(guild = %guild.0, error = %e, "Role bootstrap failed for guild");
            }
        }

        tracing::info!(roles = self.registry.snapshot().len(), "Roles initialized");
    }

    async fn ensure_guild_roles<P: PlatformClient>(
        &self,
        platform: &P,
        guild: &GuildId,
    ) -> Result<(), BotError> {
        tracing::debug!(guild = %guild.0, "Handling guild");

        let existing = platform.roles(guild).await?;

        for descriptor in self.registry.snapshot() {
            if let Some(role) = existing.iter().find(|r| r.name == descriptor.name) {
                tracing::trace!(name = %role.name, "Role already exists");
                self.registry.set_role_id(&descriptor.name, role.id.clone());
                continue;
            }

            tracing::debug!(name = %descriptor.name, "Creating role");
            let reason = descriptor
                .reason
                .clone()
                .unwrap_or_else(|| format!("{} članovi", descriptor.name));
            let created = platform
                .create_role(
                    guild,
                    CreateRole {
                        name: descriptor.name.clone(),
                        color: descriptor.color.clone(),
                        reason: Some(reason),
                    },
                )
                .await?;
            self.registry.set_role_id(&descriptor.name, created.id);
        }

        // Permission propagation needs the bot's role hoisted; missing
        // rights here must not fail the bootstrap.
        if let Err(e) = platform.hoist_own_role(guild).await {
            tracing::error!(guild = %guild.0, error = %e, "Failed to hoist bot role");
        }

        Ok(())
    }

    /// Target role set for a roster row: the section label's role and the
    /// membership-category label's role (after the lookup-key transform).
    /// Labels without a backing role are filtered out. Pure given the row
    /// and the current registry.
    pub fn target_roles(&self, row: &RosterRow) -> Vec<RoleId> {
        [
            self.registry.role_id(row.section.trim()),
            self.registry
                .role_id(&membership_lookup_key(row.category.trim())),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Minimal add/remove sets to move `current` to `target`. Only ids known
    /// to the registry are considered current, so unrelated roles are never
    /// removed. Sorted for determinism.
    pub fn diff(&self, current: &[RoleId], target: &[RoleId]) -> (Vec<RoleId>, Vec<RoleId>) {
        let known = self.registry.known_ids();
        let current: BTreeSet<_> = current.iter().filter(|id| known.contains(id)).collect();
        let target: BTreeSet<_> = target.iter().collect();

        let to_remove = current.difference(&target).map(|id| (*id).clone()).collect();
        let to_add = target.difference(&current).map(|id| (*id).clone()).collect();
        (to_remove, to_add)
    }

    /// Redemption path: pure grant of the target roles, no removal
    pub async fn grant_roles<P: PlatformClient>(
        &self,
        platform: &P,
        guild: &GuildId,
        member: &str,
        row: &RosterRow,
    ) -> Result<(), BotError> {
        let target = self.target_roles(row);
        tracing::debug!(member, ?target, "Assigning roles to user");

        if target.is_empty() {
            return Ok(());
        }

        platform
            .add_member_roles(guild, member, &target, "Verification successful")
            .await
    }

    /// Bulk sync: reconcile every registered member of every guild with
    /// their roster row. Per-member failures are logged and never abort the
    /// rest of the batch.
    pub async fn sync_all<P, U>(&self, platform: &P, roster: &RosterCache, users: &U)
    where
        P: PlatformClient,
        U: UserStore,
    {
        tracing::info!("Synchronizing member roles");

        let guilds = match platform.guilds().await {
            Ok(guilds) => guilds,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch guilds; skipping role sync");
                return;
            }
        };

        for guild in &guilds {
            let members = match platform.members(guild).await {
                Ok(members) => members,
                Err(e) => {
                    tracing::error!(guild = %guild.0, error = %e, "Failed to fetch members");
                    continue;
                }
            };

            for member in members {
                let user = match users.get_user_by_external_id(&member.external_id) {
                    Ok(Some(user)) => user,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::error!(member = %member.external_id, error = %e, "User lookup failed");
                        continue;
                    }
                };

                let Some(row) = roster.find_by_national_key(&user.national_key).await else {
                    tracing::error!(
                        member = %member.external_id,
                        "Registered user has no roster row"
                    );
                    continue;
                };

                let target = self.target_roles(&row);
                let (to_remove, to_add) = self.diff(&member.role_ids, &target);

                if !to_remove.is_empty() {
                    if let Err(e) = platform
                        .remove_member_roles(guild, &member.external_id, &to_remove, "Roster sync")
                        .await
                    {
                        tracing::error!(member = %member.external_id, error = %e, "Failed to remove roles");
                    }
                }

                if !to_add.is_empty() {
                    if let Err(e) = platform
                        .add_member_roles(guild, &member.external_id, &to_add, "Roster sync")
                        .await
                    {
                        tracing::error!(member = %member.external_id, error = %e, "Failed to add roles");
                    }
                }
            }
        }
    }
}

impl Default for RoleReconciler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: &str, section: &str) -> RosterRow {
        RosterRow {
            category: category.to_string(),
            section: section.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_membership_lookup_key_transform() {
        assert_eq!(membership_lookup_key("Aktivna"), "Aktivni");
        assert_eq!(membership_lookup_key("Redovna"), "Redovni");
        // No trailing "a": label passes through unchanged
        assert_eq!(membership_lookup_key("Alumni"), "Alumni");
    }

    #[test]
    fn test_registry_seeded_with_builtin_categories() {
        let registry = RoleRegistry::new();
        let snapshot = registry.snapshot();
        let names: Vec<_> = snapshot.iter().map(|d| d.name.clone()).collect();
        assert_eq!(names, vec!["Narančasti", "Plavi"]);

        let orange = &snapshot[0];
        assert_eq!(orange.color.as_deref(), Some("#ff8c00"));
        assert!(orange.id.is_none());
    }

    #[test]
    fn test_ensure_label_keeps_existing_entry() {
        let registry = RoleRegistry::new();
        registry.set_role_id("Plavi", RoleId("r1".to_string()));

        registry.ensure_label("Plavi", "should not replace".to_string());
        assert_eq!(registry.role_id("Plavi"), Some(RoleId("r1".to_string())));
    }

    #[test]
    fn test_target_roles_pure_and_filtered() {
        let reconciler = RoleReconciler::new();
        let registry = reconciler.registry();
        registry.ensure_label("Računarska", "Računarska sekcija".to_string());
        registry.set_role_id("Računarska", RoleId("sec".to_string()));
        registry.ensure_label("Aktivni", String::new());
        registry.set_role_id("Aktivni", RoleId("cat".to_string()));

        let r = row("Aktivna", "Računarska");
        let first = reconciler.target_roles(&r);
        let second = reconciler.target_roles(&r);
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![RoleId("sec".to_string()), RoleId("cat".to_string())]
        );

        // Unknown section: filtered down to the category role only
        let r = row("Aktivna", "Nepoznata");
        assert_eq!(reconciler.target_roles(&r), vec![RoleId("cat".to_string())]);
    }

    #[test]
    fn test_diff_never_touches_unknown_roles() {
        let reconciler = RoleReconciler::new();
        reconciler.registry().ensure_label("Foto", String::new());
        reconciler
            .registry()
            .set_role_id("Foto", RoleId("foto".to_string()));

        let current = vec![RoleId("unrelated".to_string()), RoleId("foto".to_string())];
        let target = vec![];

        let (to_remove, to_add) = reconciler.diff(&current, &target);
        assert_eq!(to_remove, vec![RoleId("foto".to_string())]);
        assert!(to_add.is_empty());
    }

    #[test]
    fn test_diff_is_idempotent() {
        let reconciler = RoleReconciler::new();
        let registry = reconciler.registry();
        registry.ensure_label("Foto", String::new());
        registry.set_role_id("Foto", RoleId("foto".to_string()));
        registry.ensure_label("Aktivni", String::new());
        registry.set_role_id("Aktivni", RoleId("akt".to_string()));

        let current = vec![RoleId("foto".to_string())];
        let target = vec![RoleId("akt".to_string())];

        let (to_remove, to_add) = reconciler.diff(&current, &target);
        assert_eq!(to_remove, vec![RoleId("foto".to_string())]);
        assert_eq!(to_add, vec![RoleId("akt".to_string())]);

        // Apply the diff, then diff again: nothing left to do
        let applied = target.clone();
        let (to_remove, to_add) = reconciler.diff(&applied, &target);
        assert!(to_remove.is_empty());
        assert!(to_add.is_empty());
    }
}
