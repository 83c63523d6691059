//! Applies a [`SeedDocument`] to a store.

use crate::document::SeedDocument;
use crate::error::SeedError;
use rootcause::prelude::Report;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, instrument};
use warden_core::{Result, UserId, UserRef};
use warden_store::{AuthStore, Outcome, SeedItemResult, StoreError};

/// A section of a seed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedSection {
    Roles,
    Permissions,
    Users,
    RolePermissions,
    UserRoles,
    UserPermissions,
}

impl fmt::Display for SeedSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Roles => "roles",
            Self::Permissions => "permissions",
            Self::Users => "users",
            Self::RolePermissions => "rolePermissions",
            Self::UserRoles => "userRoles",
            Self::UserPermissions => "userPermissions",
        };
        f.write_str(name)
    }
}

/// An entry that was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub section: SeedSection,
    pub reason: String,
}

/// What a seed run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub roles: usize,
    pub permissions: usize,
    pub users: usize,
    pub role_permissions: usize,
    pub user_roles: usize,
    pub user_permissions: usize,
    pub skipped: Vec<SkippedItem>,
}

impl SeedReport {
    /// Number of skipped entries in `section`.
    #[must_use]
    pub fn skipped_in(&self, section: SeedSection) -> usize {
        self.skipped
            .iter()
            .filter(|item| item.section == section)
            .count()
    }

    fn skip(&mut self, section: SeedSection, reason: impl Into<String>) {
        let reason = reason.into();
        debug!(%section, %reason, "skipping seed entry");
        self.skipped.push(SkippedItem { section, reason });
    }

    /// Counts an applied link or records a skipped one.
    fn record(&mut self, section: SeedSection, outcome: Outcome) -> bool {
        match outcome {
            Outcome::Applied => true,
            Outcome::NotFound(unresolved) => {
                self.skip(section, unresolved.to_string());
                false
            }
        }
    }
}

fn store_failed(section: SeedSection) -> impl FnOnce(Report<StoreError>) -> SeedError {
    move |e| SeedError::Store {
        section,
        details: e.to_string(),
    }
}

/// Writes seed documents through an [`AuthStore`].
#[derive(Debug, Clone, Copy)]
pub struct Seeder<'a> {
    store: &'a AuthStore,
}

impl<'a> Seeder<'a> {
    #[must_use]
    pub fn new(store: &'a AuthStore) -> Self {
        Self { store }
    }

    /// Applies `document`.
    ///
    /// Sections run in dependency order: roles, permissions, users, then
    /// the link sections. Entries whose references cannot be resolved are
    /// skipped and reported. A store failure aborts the run; entries
    /// already written stay written.
    #[instrument(skip_all)]
    pub async fn run(&self, document: &SeedDocument) -> Result<SeedReport, SeedError> {
        let mut report = SeedReport::default();

        for role in &document.roles {
            self.store
                .upsert_role(role)
                .await
                .map_err(store_failed(SeedSection::Roles))?;
            report.roles += 1;
        }

        let results = self
            .store
            .seed_permissions(&document.permissions)
            .await
            .map_err(store_failed(SeedSection::Permissions))?;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                SeedItemResult::Upserted(_) => report.permissions += 1,
                SeedItemResult::Skipped => report.skip(
                    SeedSection::Permissions,
                    format!("entry {index} has no name or slug"),
                ),
            }
        }

        let mut user_ids: HashMap<&str, UserId> = HashMap::new();
        for user in &document.users {
            let id = self
                .store
                .create_user(user)
                .await
                .map_err(store_failed(SeedSection::Users))?;
            if let Some(email) = user.email.as_deref().filter(|e| !e.is_empty()) {
                user_ids.insert(email, id);
            }
            report.users += 1;
        }

        for link in &document.role_permissions {
            let outcome = self
                .store
                .attach_permission_to_role(&link.role, &link.permission)
                .await
                .map_err(store_failed(SeedSection::RolePermissions))?;
            if report.record(SeedSection::RolePermissions, outcome) {
                report.role_permissions += 1;
            }
        }

        for link in &document.user_roles {
            let Some(user_id) = resolve_user(&user_ids, &link.user) else {
                report.skip(SeedSection::UserRoles, unknown_user(&link.user));
                continue;
            };
            let outcome = self
                .store
                .assign_role(user_id, &link.role)
                .await
                .map_err(store_failed(SeedSection::UserRoles))?;
            if report.record(SeedSection::UserRoles, outcome) {
                report.user_roles += 1;
            }
        }

        for link in &document.user_permissions {
            let Some(user_id) = resolve_user(&user_ids, &link.user) else {
                report.skip(SeedSection::UserPermissions, unknown_user(&link.user));
                continue;
            };
            let outcome = self
                .store
                .give_permission_to(user_id, &link.permission)
                .await
                .map_err(store_failed(SeedSection::UserPermissions))?;
            if report.record(SeedSection::UserPermissions, outcome) {
                report.user_permissions += 1;
            }
        }

        info!(
            roles = report.roles,
            permissions = report.permissions,
            users = report.users,
            skipped = report.skipped.len(),
            "seed applied"
        );
        Ok(report)
    }
}

fn resolve_user(user_ids: &HashMap<&str, UserId>, user: &UserRef) -> Option<UserId> {
    match user {
        UserRef::ById(id) => Some(*id),
        UserRef::ByEmail(email) => user_ids.get(email.as_str()).copied(),
    }
}

fn unknown_user(user: &UserRef) -> String {
    format!("user '{user}' was not created by this seed")
}
