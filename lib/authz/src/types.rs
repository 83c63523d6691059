//! Identity and decision types.

use crate::error::AuthzError;
use std::fmt;
use warden_core::{Result, UserId};

/// The caller as seen by a request layer.
///
/// A request layer may know who is calling without having resolved them
/// to a stored user; such identities carry no `user_id` and are denied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    /// The stored user, if resolved.
    pub user_id: Option<UserId>,
    /// The caller's email, if known.
    pub email: Option<String>,
}

impl Identity {
    /// An identity resolved to a stored user.
    #[must_use]
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            email: None,
        }
    }

    /// Sets the email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Why a gate denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No identity, or an identity without a user id.
    Unauthenticated,
    /// None of the gate's references matched.
    NoMatch,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "unauthenticated"),
            Self::NoMatch => write!(f, "no matching grant"),
        }
    }
}

/// Result of a gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    /// Returns true if the gate passed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Maps a denial to [`AuthzError::AccessDenied`].
    ///
    /// `required` describes what the gate accepts and ends up in the
    /// error message.
    pub fn into_result(self, required: impl fmt::Display) -> Result<(), AuthzError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(_) => Err(AuthzError::AccessDenied {
                required: required.to_string(),
            }
            .into()),
        }
    }
}
