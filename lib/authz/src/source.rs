//! Where gates get their answers.

use crate::error::AuthzError;
use async_trait::async_trait;
use warden_core::{PermissionRef, Result, RoleRef, UserId};
use warden_store::AuthStore;

/// Read-only role and permission checks.
///
/// [`AuthStore`] is the production implementation.
#[async_trait]
pub trait AccessSource: Send + Sync {
    /// Returns true if the user holds the role.
    async fn has_role(&self, user_id: UserId, role: &RoleRef) -> Result<bool, AuthzError>;

    /// Returns true if the user holds the permission directly or through a
    /// role.
    async fn has_permission_to(
        &self,
        user_id: UserId,
        permission: &PermissionRef,
    ) -> Result<bool, AuthzError>;
}

#[async_trait]
impl AccessSource for AuthStore {
    async fn has_role(&self, user_id: UserId, role: &RoleRef) -> Result<bool, AuthzError> {
        AuthStore::has_role(self, user_id, role)
            .await
            .map_err(|e| {
                AuthzError::CheckFailed {
                    details: e.to_string(),
                }
                .into()
            })
    }

    async fn has_permission_to(
        &self,
        user_id: UserId,
        permission: &PermissionRef,
    ) -> Result<bool, AuthzError> {
        AuthStore::has_permission_to(self, user_id, permission)
            .await
            .map_err(|e| {
                AuthzError::CheckFailed {
                    details: e.to_string(),
                }
                .into()
            })
    }
}
