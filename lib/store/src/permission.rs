//! Permission operations: upsert, lookup, direct grants and effective
//! permission resolution.

use crate::error::{StoreError, query_failed};
use crate::model::{EntityKind, NewPermission, Outcome, Permission};
use crate::store::AuthStore;
use chrono::{DateTime, Utc};
use rootcause::prelude::Report;
use sqlx::FromRow;
use tracing::{debug, instrument};
use warden_core::{EntityRef, PermissionId, PermissionRef, UserId};

/// Row type for permission queries.
#[derive(FromRow)]
struct PermissionRow {
    id: i64,
    name: String,
    slug: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<PermissionRow> for Permission {
    fn from(row: PermissionRow) -> Self {
        Self {
            id: PermissionId::new(row.id),
            name: row.name,
            slug: row.slug,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

/// Where a permission check found its grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GrantSource {
    Direct,
    Role,
}

impl AuthStore {
    /// Returns the id of the permission with `permission.slug`, inserting
    /// it if absent. Atomic against concurrent upserts of the same slug.
    #[instrument(skip(self), fields(slug = %permission.slug))]
    pub async fn upsert_permission(
        &self,
        permission: &NewPermission,
    ) -> Result<PermissionId, Report<StoreError>> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO permissions (name, slug, description, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (slug) DO UPDATE SET slug = excluded.slug
            RETURNING id
            "#,
        )
        .bind(permission.name.as_str())
        .bind(permission.slug.as_str())
        .bind(permission.description.as_deref())
        .bind(Utc::now())
        .fetch_one(self.database().pool())
        .await
        .map_err(query_failed("upsert_permission"))?;

        let id = PermissionId::new(id);
        debug!(%id, "permission upserted");
        Ok(id)
    }

    /// Looks up a permission by reference.
    #[instrument(skip(self))]
    pub async fn find_permission(
        &self,
        permission: &PermissionRef,
    ) -> Result<Option<Permission>, Report<StoreError>> {
        let Some(id) = self.resolve_permission_id(permission).await? else {
            return Ok(None);
        };

        let row: Option<PermissionRow> = sqlx::query_as(
            r#"
            SELECT id, name, slug, description, created_at
            FROM permissions
            WHERE id = ?
            "#,
        )
        .bind(id.get())
        .fetch_optional(self.database().pool())
        .await
        .map_err(query_failed("find_permission"))?;

        Ok(row.map(Permission::from))
    }

    /// Lists every permission, ordered by slug.
    pub async fn list_permissions(&self) -> Result<Vec<Permission>, Report<StoreError>> {
        let rows: Vec<PermissionRow> = sqlx::query_as(
            r#"
            SELECT id, name, slug, description, created_at
            FROM permissions
            ORDER BY slug ASC
            "#,
        )
        .fetch_all(self.database().pool())
        .await
        .map_err(query_failed("list_permissions"))?;

        Ok(rows.into_iter().map(Permission::from).collect())
    }

    /// Grants a permission directly to a user. Granting twice is a no-op.
    #[instrument(skip(self))]
    pub async fn give_permission_to(
        &self,
        user_id: UserId,
        permission: &PermissionRef,
    ) -> Result<Outcome, Report<StoreError>> {
        let Some(permission_id) = self.resolve_permission_id(permission).await? else {
            debug!("permission not found");
            return Ok(Outcome::not_found(EntityKind::Permission, permission));
        };

        sqlx::query(
            r#"
            INSERT INTO user_permissions (user_id, permission_id)
            VALUES (?, ?)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id.get())
        .bind(permission_id.get())
        .execute(self.database().pool())
        .await
        .map_err(query_failed("give_permission_to"))?;

        debug!(%permission_id, "permission granted");
        Ok(Outcome::Applied)
    }

    /// Revokes a direct grant. Revoking a permission that was never granted
    /// is a no-op. Permissions inherited through roles are unaffected.
    #[instrument(skip(self))]
    pub async fn revoke_permission_to(
        &self,
        user_id: UserId,
        permission: &PermissionRef,
    ) -> Result<Outcome, Report<StoreError>> {
        let Some(permission_id) = self.resolve_permission_id(permission).await? else {
            debug!("permission not found");
            return Ok(Outcome::not_found(EntityKind::Permission, permission));
        };

        let result =
            sqlx::query("DELETE FROM user_permissions WHERE user_id = ? AND permission_id = ?")
                .bind(user_id.get())
                .bind(permission_id.get())
                .execute(self.database().pool())
                .await
                .map_err(query_failed("revoke_permission_to"))?;

        debug!(%permission_id, removed = result.rows_affected(), "permission revoked");
        Ok(Outcome::Applied)
    }

    /// Returns true if the user has the permission, either granted directly
    /// or inherited through any role they hold.
    ///
    /// The direct grant is checked first; the role join only runs when
    /// there is no direct grant.
    #[instrument(skip(self))]
    pub async fn has_permission_to(
        &self,
        user_id: UserId,
        permission: &PermissionRef,
    ) -> Result<bool, Report<StoreError>> {
        for source in [GrantSource::Direct, GrantSource::Role] {
            if self.has_grant(source, user_id, permission).await? {
                debug!(?source, "permission granted");
                return Ok(true);
            }
        }

        debug!("permission not held");
        Ok(false)
    }

    async fn has_grant(
        &self,
        source: GrantSource,
        user_id: UserId,
        permission: &PermissionRef,
    ) -> Result<bool, Report<StoreError>> {
        let pool = self.database().pool();
        let found = match (source, permission) {
            (GrantSource::Direct, EntityRef::ById(permission_id)) => {
                sqlx::query_scalar::<_, bool>(
                    r#"
                    SELECT EXISTS (
                        SELECT 1 FROM user_permissions
                        WHERE user_id = ? AND permission_id = ?
                    )
                    "#,
                )
                .bind(user_id.get())
                .bind(permission_id.get())
                .fetch_one(pool)
                .await
            }
            (GrantSource::Direct, EntityRef::ByName(name)) => {
                sqlx::query_scalar::<_, bool>(
                    r#"
                    SELECT EXISTS (
                        SELECT 1 FROM user_permissions up
                        JOIN permissions p ON up.permission_id = p.id
                        WHERE up.user_id = ? AND (p.slug = ? OR p.name = ?)
                    )
                    "#,
                )
                .bind(user_id.get())
                .bind(name.as_str())
                .bind(name.as_str())
                .fetch_one(pool)
                .await
            }
            (GrantSource::Role, EntityRef::ById(permission_id)) => {
                sqlx::query_scalar::<_, bool>(
                    r#"
                    SELECT EXISTS (
                        SELECT 1 FROM user_roles ur
                        JOIN role_permissions rp ON ur.role_id = rp.role_id
                        WHERE ur.user_id = ? AND rp.permission_id = ?
                    )
                    "#,
                )
                .bind(user_id.get())
                .bind(permission_id.get())
                .fetch_one(pool)
                .await
            }
            (GrantSource::Role, EntityRef::ByName(name)) => {
                sqlx::query_scalar::<_, bool>(
                    r#"
                    SELECT EXISTS (
                        SELECT 1 FROM user_roles ur
                        JOIN role_permissions rp ON ur.role_id = rp.role_id
                        JOIN permissions p ON rp.permission_id = p.id
                        WHERE ur.user_id = ? AND (p.slug = ? OR p.name = ?)
                    )
                    "#,
                )
                .bind(user_id.get())
                .bind(name.as_str())
                .bind(name.as_str())
                .fetch_one(pool)
                .await
            }
        };

        let found = found.map_err(query_failed("has_permission_to"))?;
        Ok(found)
    }

    /// Lists a user's effective permissions: direct grants and permissions
    /// inherited through roles, without duplicates, ordered by slug.
    #[instrument(skip(self))]
    pub async fn permissions_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Permission>, Report<StoreError>> {
        let rows: Vec<PermissionRow> = sqlx::query_as(
            r#"
            SELECT p.id, p.name, p.slug, p.description, p.created_at
            FROM permissions p
            WHERE p.id IN (
                SELECT permission_id FROM user_permissions WHERE user_id = ?
            )
            OR p.id IN (
                SELECT rp.permission_id
                FROM role_permissions rp
                JOIN user_roles ur ON ur.role_id = rp.role_id
                WHERE ur.user_id = ?
            )
            ORDER BY p.slug ASC
            "#,
        )
        .bind(user_id.get())
        .bind(user_id.get())
        .fetch_all(self.database().pool())
        .await
        .map_err(query_failed("permissions_for_user"))?;

        Ok(rows.into_iter().map(Permission::from).collect())
    }
}
