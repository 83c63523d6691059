//! Domain records and operation results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use warden_core::{PermissionId, RoleId, UserId};

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned id.
    pub id: UserId,
    /// Email address, unique when present.
    pub email: Option<String>,
    /// Identifier from an external identity system, unique when present.
    pub external_id: Option<String>,
    /// When the row was inserted.
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
}

impl NewUser {
    /// A user identified by email only.
    #[must_use]
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            external_id: None,
        }
    }

    /// A user identified by external id only.
    #[must_use]
    pub fn with_external_id(external_id: impl Into<String>) -> Self {
        Self {
            email: None,
            external_id: Some(external_id.into()),
        }
    }
}

/// A stored role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for upserting a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRole {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewRole {
    /// Creates role fields without a description.
    #[must_use]
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            description: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A stored permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for upserting a permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPermission {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewPermission {
    /// Creates permission fields without a description.
    #[must_use]
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            description: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Kind of entity a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Role,
    Permission,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Role => write!(f, "role"),
            Self::Permission => write!(f, "permission"),
        }
    }
}

/// A name reference that matched no row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unresolved {
    /// What was being looked up.
    pub kind: EntityKind,
    /// The reference as given.
    pub reference: String,
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' not found", self.kind, self.reference)
    }
}

/// Result of a mutation addressed by reference.
///
/// Not finding the referenced role or permission is a normal outcome,
/// distinct from a storage failure.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome {
    /// The references resolved and the mutation ran (possibly as a no-op).
    Applied,
    /// A name reference resolved to nothing; nothing was written.
    NotFound(Unresolved),
}

impl Outcome {
    /// Returns true if the mutation ran.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// Returns the unresolved reference, if any.
    #[must_use]
    pub fn unresolved(&self) -> Option<&Unresolved> {
        match self {
            Self::Applied => None,
            Self::NotFound(unresolved) => Some(unresolved),
        }
    }

    pub(crate) fn not_found(kind: EntityKind, reference: impl fmt::Display) -> Self {
        Self::NotFound(Unresolved {
            kind,
            reference: reference.to_string(),
        })
    }
}
