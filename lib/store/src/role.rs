//! Role operations: upsert, lookup, membership and role permissions.

use crate::error::{StoreError, query_failed};
use crate::model::{EntityKind, NewRole, Outcome, Role};
use crate::store::AuthStore;
use chrono::{DateTime, Utc};
use rootcause::prelude::Report;
use sqlx::FromRow;
use tracing::{debug, instrument};
use warden_core::{EntityRef, PermissionRef, RoleId, RoleRef, UserId};

/// Row type for role queries.
#[derive(FromRow)]
struct RoleRow {
    id: i64,
    name: String,
    slug: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Self {
            id: RoleId::new(row.id),
            name: row.name,
            slug: row.slug,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

impl AuthStore {
    /// Returns the id of the role with `role.slug`, inserting it if absent.
    ///
    /// An existing role keeps its name and description. The statement is
    /// atomic against concurrent upserts of the same slug.
    #[instrument(skip(self), fields(slug = %role.slug))]
    pub async fn upsert_role(&self, role: &NewRole) -> Result<RoleId, Report<StoreError>> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO roles (name, slug, description, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (slug) DO UPDATE SET slug = excluded.slug
            RETURNING id
            "#,
        )
        .bind(role.name.as_str())
        .bind(role.slug.as_str())
        .bind(role.description.as_deref())
        .bind(Utc::now())
        .fetch_one(self.database().pool())
        .await
        .map_err(query_failed("upsert_role"))?;

        let id = RoleId::new(id);
        debug!(%id, "role upserted");
        Ok(id)
    }

    /// Looks up a role by reference.
    #[instrument(skip(self))]
    pub async fn find_role(&self, role: &RoleRef) -> Result<Option<Role>, Report<StoreError>> {
        let Some(id) = self.resolve_role_id(role).await? else {
            return Ok(None);
        };

        let row: Option<RoleRow> = sqlx::query_as(
            r#"
            SELECT id, name, slug, description, created_at
            FROM roles
            WHERE id = ?
            "#,
        )
        .bind(id.get())
        .fetch_optional(self.database().pool())
        .await
        .map_err(query_failed("find_role"))?;

        Ok(row.map(Role::from))
    }

    /// Lists every role, ordered by slug.
    pub async fn list_roles(&self) -> Result<Vec<Role>, Report<StoreError>> {
        let rows: Vec<RoleRow> = sqlx::query_as(
            r#"
            SELECT id, name, slug, description, created_at
            FROM roles
            ORDER BY slug ASC
            "#,
        )
        .fetch_all(self.database().pool())
        .await
        .map_err(query_failed("list_roles"))?;

        Ok(rows.into_iter().map(Role::from).collect())
    }

    /// Lists the roles a user holds, ordered by slug.
    #[instrument(skip(self))]
    pub async fn roles_for_user(&self, user_id: UserId) -> Result<Vec<Role>, Report<StoreError>> {
        let rows: Vec<RoleRow> = sqlx::query_as(
            r#"
            SELECT r.id, r.name, r.slug, r.description, r.created_at
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = ?
            ORDER BY r.slug ASC
            "#,
        )
        .bind(user_id.get())
        .fetch_all(self.database().pool())
        .await
        .map_err(query_failed("roles_for_user"))?;

        Ok(rows.into_iter().map(Role::from).collect())
    }

    /// Gives a user a role. Assigning a role twice is a no-op.
    #[instrument(skip(self))]
    pub async fn assign_role(
        &self,
        user_id: UserId,
        role: &RoleRef,
    ) -> Result<Outcome, Report<StoreError>> {
        let Some(role_id) = self.resolve_role_id(role).await? else {
            debug!("role not found");
            return Ok(Outcome::not_found(EntityKind::Role, role));
        };

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            VALUES (?, ?)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id.get())
        .bind(role_id.get())
        .execute(self.database().pool())
        .await
        .map_err(query_failed("assign_role"))?;

        debug!(%role_id, "role assigned");
        Ok(Outcome::Applied)
    }

    /// Takes a role away from a user. Removing a role the user does not
    /// hold is a no-op.
    ///
    /// A name reference removes exactly one role, the one with that slug
    /// if any, otherwise the lowest id with that name. [`has_role`] by
    /// name matches every held role whose slug or name equals the
    /// reference. A user holding a role named `ops` and another role
    /// slugged `ops` therefore still passes `has_role("ops")` after one
    /// `remove_role("ops")`.
    ///
    /// [`has_role`]: Self::has_role
    #[instrument(skip(self))]
    pub async fn remove_role(
        &self,
        user_id: UserId,
        role: &RoleRef,
    ) -> Result<Outcome, Report<StoreError>> {
        let Some(role_id) = self.resolve_role_id(role).await? else {
            debug!("role not found");
            return Ok(Outcome::not_found(EntityKind::Role, role));
        };

        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = ? AND role_id = ?")
            .bind(user_id.get())
            .bind(role_id.get())
            .execute(self.database().pool())
            .await
            .map_err(query_failed("remove_role"))?;

        debug!(%role_id, removed = result.rows_affected(), "role removed");
        Ok(Outcome::Applied)
    }

    /// Returns true if the user directly holds the role.
    #[instrument(skip(self))]
    pub async fn has_role(&self, user_id: UserId, role: &RoleRef) -> Result<bool, Report<StoreError>> {
        let held: bool = match role {
            EntityRef::ById(role_id) => sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM user_roles
                    WHERE user_id = ? AND role_id = ?
                )
                "#,
            )
            .bind(user_id.get())
            .bind(role_id.get())
            .fetch_one(self.database().pool())
            .await,
            EntityRef::ByName(name) => sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM user_roles ur
                    JOIN roles r ON ur.role_id = r.id
                    WHERE ur.user_id = ? AND (r.slug = ? OR r.name = ?)
                )
                "#,
            )
            .bind(user_id.get())
            .bind(name.as_str())
            .bind(name.as_str())
            .fetch_one(self.database().pool())
            .await,
        }
        .map_err(query_failed("has_role"))?;

        debug!(held, "role check");
        Ok(held)
    }

    /// Grants a permission to every holder of a role. Attaching twice is a
    /// no-op.
    ///
    /// The role is resolved first; if it is not found the permission
    /// reference is not looked up.
    #[instrument(skip(self))]
    pub async fn attach_permission_to_role(
        &self,
        role: &RoleRef,
        permission: &PermissionRef,
    ) -> Result<Outcome, Report<StoreError>> {
        let Some(role_id) = self.resolve_role_id(role).await? else {
            debug!("role not found");
            return Ok(Outcome::not_found(EntityKind::Role, role));
        };
        let Some(permission_id) = self.resolve_permission_id(permission).await? else {
            debug!("permission not found");
            return Ok(Outcome::not_found(EntityKind::Permission, permission));
        };

        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            VALUES (?, ?)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role_id.get())
        .bind(permission_id.get())
        .execute(self.database().pool())
        .await
        .map_err(query_failed("attach_permission_to_role"))?;

        debug!(%role_id, %permission_id, "permission attached to role");
        Ok(Outcome::Applied)
    }

    /// Removes a permission from a role. Detaching an absent link is a
    /// no-op.
    #[instrument(skip(self))]
    pub async fn detach_permission_from_role(
        &self,
        role: &RoleRef,
        permission: &PermissionRef,
    ) -> Result<Outcome, Report<StoreError>> {
        let Some(role_id) = self.resolve_role_id(role).await? else {
            return Ok(Outcome::not_found(EntityKind::Role, role));
        };
        let Some(permission_id) = self.resolve_permission_id(permission).await? else {
            return Ok(Outcome::not_found(EntityKind::Permission, permission));
        };

        sqlx::query("DELETE FROM role_permissions WHERE role_id = ? AND permission_id = ?")
            .bind(role_id.get())
            .bind(permission_id.get())
            .execute(self.database().pool())
            .await
            .map_err(query_failed("detach_permission_from_role"))?;

        debug!(%role_id, %permission_id, "permission detached from role");
        Ok(Outcome::Applied)
    }
}
