//! Seed documents.

use crate::error::SeedError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use warden_core::{PermissionRef, Result, RoleRef, UserRef};
use warden_store::{NewRole, NewUser, PermissionSeed};

/// Links a permission to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissionLink {
    pub role: RoleRef,
    pub permission: PermissionRef,
}

/// Gives a role to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoleLink {
    pub user: UserRef,
    pub role: RoleRef,
}

/// Grants a permission directly to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissionLink {
    pub user: UserRef,
    pub permission: PermissionRef,
}

/// Everything a seed run writes. Every section is optional.
///
/// Users in link sections are a numeric id or an email; emails resolve
/// only against the `users` of the same document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedDocument {
    pub roles: Vec<NewRole>,
    pub permissions: Vec<PermissionSeed>,
    pub users: Vec<NewUser>,
    pub role_permissions: Vec<RolePermissionLink>,
    pub user_roles: Vec<UserRoleLink>,
    pub user_permissions: Vec<UserPermissionLink>,
}

/// The permission list seeded when no file is given.
#[must_use]
pub fn default_permissions() -> Vec<PermissionSeed> {
    ["View Any", "View", "Create", "Update", "Delete"]
        .into_iter()
        .map(PermissionSeed::from)
        .collect()
}

impl SeedDocument {
    /// Parses a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, SeedError> {
        let document = serde_json::from_str(json).map_err(|e| SeedError::Parse {
            details: e.to_string(),
        })?;
        Ok(document)
    }

    /// Reads and parses a JSON document.
    pub fn from_path(path: &Path) -> Result<Self, SeedError> {
        let json = std::fs::read_to_string(path).map_err(|e| SeedError::ReadFile {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    /// A small admin/editor setup for trying the store out.
    #[must_use]
    pub fn sample() -> Self {
        let role_link = |role: &str, permission: &str| RolePermissionLink {
            role: role.into(),
            permission: permission.into(),
        };

        let mut role_permissions: Vec<_> = ["view-any", "view", "create", "update", "delete", "publish"]
            .into_iter()
            .map(|permission| role_link("admin", permission))
            .collect();
        role_permissions.extend(
            ["view", "create", "update"]
                .into_iter()
                .map(|permission| role_link("editor", permission)),
        );

        Self {
            roles: vec![
                NewRole::new("Admin", "admin"),
                NewRole::new("Editor", "editor"),
            ],
            permissions: ["View Any", "View", "Create", "Update", "Delete", "Publish"]
                .into_iter()
                .map(PermissionSeed::from)
                .collect(),
            users: vec![
                NewUser::with_email("admin@example.com"),
                NewUser::with_email("editor@example.com"),
            ],
            role_permissions,
            user_roles: vec![
                UserRoleLink {
                    user: UserRef::ByEmail("admin@example.com".to_string()),
                    role: "admin".into(),
                },
                UserRoleLink {
                    user: UserRef::ByEmail("editor@example.com".to_string()),
                    role: "editor".into(),
                },
            ],
            user_permissions: Vec::new(),
        }
    }
}
