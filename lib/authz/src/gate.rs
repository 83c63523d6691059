//! Role and permission gates.

use crate::error::AuthzError;
use crate::source::AccessSource;
use crate::types::{Decision, DenyReason, Identity};
use std::fmt;
use tracing::{debug, instrument};
use warden_core::{EntityRef, PermissionRef, Result, RoleRef, UserId};

fn authenticated(identity: Option<&Identity>) -> Option<UserId> {
    identity.and_then(|identity| identity.user_id)
}

fn describe<I: fmt::Display>(refs: &[EntityRef<I>]) -> String {
    refs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Passes callers holding any of a set of roles.
#[derive(Debug, Clone)]
pub struct RoleGate<S> {
    source: S,
    roles: Vec<RoleRef>,
}

impl<S: AccessSource> RoleGate<S> {
    /// Builds a gate accepting any of `roles`. An empty list never passes.
    pub fn any_of(source: S, roles: impl IntoIterator<Item = impl Into<RoleRef>>) -> Self {
        Self {
            source,
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// The accepted roles.
    #[must_use]
    pub fn roles(&self) -> &[RoleRef] {
        &self.roles
    }

    /// Checks the caller against the gate.
    ///
    /// Roles are tried in order and the first match allows. The source is
    /// not queried for an unauthenticated caller.
    #[instrument(skip(self), fields(roles = %describe(&self.roles)))]
    pub async fn check(&self, identity: Option<&Identity>) -> Result<Decision, AuthzError> {
        let Some(user_id) = authenticated(identity) else {
            debug!("no authenticated user");
            return Ok(Decision::Deny(DenyReason::Unauthenticated));
        };

        for role in &self.roles {
            if self.source.has_role(user_id, role).await? {
                debug!(%user_id, %role, "role gate passed");
                return Ok(Decision::Allow);
            }
        }

        debug!(%user_id, "role gate denied");
        Ok(Decision::Deny(DenyReason::NoMatch))
    }

    /// Checks the caller and maps a denial to [`AuthzError::AccessDenied`].
    pub async fn require(&self, identity: Option<&Identity>) -> Result<(), AuthzError> {
        self.check(identity).await?.into_result(describe(&self.roles))
    }
}

/// Passes callers holding any of a set of permissions, directly or
/// through a role.
#[derive(Debug, Clone)]
pub struct PermissionGate<S> {
    source: S,
    permissions: Vec<PermissionRef>,
}

impl<S: AccessSource> PermissionGate<S> {
    /// Builds a gate accepting any of `permissions`. An empty list never
    /// passes.
    pub fn any_of(
        source: S,
        permissions: impl IntoIterator<Item = impl Into<PermissionRef>>,
    ) -> Self {
        Self {
            source,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// The accepted permissions.
    #[must_use]
    pub fn permissions(&self) -> &[PermissionRef] {
        &self.permissions
    }

    /// Checks the caller against the gate.
    #[instrument(skip(self), fields(permissions = %describe(&self.permissions)))]
    pub async fn check(&self, identity: Option<&Identity>) -> Result<Decision, AuthzError> {
        let Some(user_id) = authenticated(identity) else {
            debug!("no authenticated user");
            return Ok(Decision::Deny(DenyReason::Unauthenticated));
        };

        for permission in &self.permissions {
            if self.source.has_permission_to(user_id, permission).await? {
                debug!(%user_id, %permission, "permission gate passed");
                return Ok(Decision::Allow);
            }
        }

        debug!(%user_id, "permission gate denied");
        Ok(Decision::Deny(DenyReason::NoMatch))
    }

    /// Checks the caller and maps a denial to [`AuthzError::AccessDenied`].
    pub async fn require(&self, identity: Option<&Identity>) -> Result<(), AuthzError> {
        self.check(identity)
            .await?
            .into_result(describe(&self.permissions))
    }
}

/// Returns true if the caller holds any of `roles`.
pub async fn has_any_role<S: AccessSource + ?Sized>(
    source: &S,
    identity: Option<&Identity>,
    roles: &[RoleRef],
) -> Result<bool, AuthzError> {
    let Some(user_id) = authenticated(identity) else {
        return Ok(false);
    };
    for role in roles {
        if source.has_role(user_id, role).await? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Returns true if the caller holds any of `permissions`.
pub async fn has_any_permission<S: AccessSource + ?Sized>(
    source: &S,
    identity: Option<&Identity>,
    permissions: &[PermissionRef],
) -> Result<bool, AuthzError> {
    let Some(user_id) = authenticated(identity) else {
        return Ok(false);
    };
    for permission in permissions {
        if source.has_permission_to(user_id, permission).await? {
            return Ok(true);
        }
    }
    Ok(false)
}
