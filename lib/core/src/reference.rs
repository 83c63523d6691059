//! Polymorphic references to stored entities.
//!
//! Callers name a role or permission either by its numeric id or by a
//! string that is matched against the slug or the name. The string form is
//! resolved by the store; the id form is used as-is.

use crate::id::{ParseIdError, PermissionId, RoleId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A reference to a role or permission by id or by slug-or-name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef<I> {
    /// A concrete row id; no lookup is performed.
    ById(I),
    /// A string matched exactly against the slug or the name.
    ByName(String),
}

/// Reference to a role.
pub type RoleRef = EntityRef<RoleId>;

/// Reference to a permission.
pub type PermissionRef = EntityRef<PermissionId>;

impl<I: Copy> EntityRef<I> {
    /// Returns the id if this is an id reference.
    #[must_use]
    pub fn as_id(&self) -> Option<I> {
        match self {
            Self::ById(id) => Some(*id),
            Self::ByName(_) => None,
        }
    }
}

impl<I> EntityRef<I> {
    /// Returns the name if this is a name reference.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::ById(_) => None,
            Self::ByName(name) => Some(name),
        }
    }
}

impl<I: fmt::Display> fmt::Display for EntityRef<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ById(id) => write!(f, "{id}"),
            Self::ByName(name) => write!(f, "{name}"),
        }
    }
}

impl<I> From<&str> for EntityRef<I> {
    fn from(name: &str) -> Self {
        Self::ByName(name.to_string())
    }
}

impl<I> From<String> for EntityRef<I> {
    fn from(name: String) -> Self {
        Self::ByName(name)
    }
}

impl From<RoleId> for RoleRef {
    fn from(id: RoleId) -> Self {
        Self::ById(id)
    }
}

impl From<PermissionId> for PermissionRef {
    fn from(id: PermissionId) -> Self {
        Self::ById(id)
    }
}

/// Reference to a user, by id or by email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    /// A concrete user id.
    ById(UserId),
    /// An email address.
    ByEmail(String),
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ById(id) => write!(f, "{id}"),
            Self::ByEmail(email) => write!(f, "{email}"),
        }
    }
}

impl From<UserId> for UserRef {
    fn from(id: UserId) -> Self {
        Self::ById(id)
    }
}

impl FromStr for UserRef {
    type Err = ParseIdError;

    /// Anything that parses as a user id is an id; everything else is an email.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<UserId>() {
            Ok(id) => Self::ById(id),
            Err(_) => Self::ByEmail(s.to_string()),
        })
    }
}
