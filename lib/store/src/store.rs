//! The authorization store: the domain API over the database.
//!
//! Operations are split by entity across `user`, `role`, `permission`
//! and `seed`; this module holds the handle itself and reference
//! resolution shared by all of them.

use crate::config::StoreConfig;
use crate::db::{Database, Table};
use crate::error::{StoreError, query_failed};
use rootcause::prelude::Report;
use std::path::Path;
use tracing::instrument;
use warden_core::{EntityRef, PermissionId, PermissionRef, RoleId, RoleRef};

/// Single source of truth for users, roles, permissions and their links.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct AuthStore {
    db: Database,
}

impl AuthStore {
    /// Opens the store at the path resolved from `config`.
    ///
    /// See [`StoreConfig::resolve_db_path`] for the precedence rules.
    pub async fn open(config: &StoreConfig) -> Result<Self, Report<StoreError>> {
        let path = config.resolve_db_path(None)?;
        Self::open_at(&path, config).await
    }

    /// Opens the store at an explicit path, applying migrations.
    pub async fn open_at(path: &Path, config: &StoreConfig) -> Result<Self, Report<StoreError>> {
        let db = Database::open(path, config).await?;
        Ok(Self { db })
    }

    /// Closes the store. Clones sharing the pool stop working too.
    pub async fn close(self) {
        self.db.close().await;
    }

    /// Returns the store access layer.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Returns the absolute path of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.db.path()
    }

    /// Checks connectivity.
    pub async fn health_check(&self) -> Result<(), Report<StoreError>> {
        self.db.health_check().await
    }

    /// Counts the rows of a schema table.
    pub async fn count_rows(&self, table: Table) -> Result<i64, Report<StoreError>> {
        self.db.count_rows(table).await
    }

    /// Resolves a role reference to an id.
    ///
    /// Id references are returned without a lookup. Name references match
    /// the slug or the name exactly; a slug match wins over a name match on
    /// a different row.
    #[instrument(skip(self), level = "trace")]
    pub(crate) async fn resolve_role_id(
        &self,
        role: &RoleRef,
    ) -> Result<Option<RoleId>, Report<StoreError>> {
        let name = match role {
            EntityRef::ById(id) => return Ok(Some(*id)),
            EntityRef::ByName(name) => name.as_str(),
        };

        let id: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM roles
            WHERE slug = ? OR name = ?
            ORDER BY slug = ? DESC, id ASC
            LIMIT 1
            "#,
        )
        .bind(name)
        .bind(name)
        .bind(name)
        .fetch_optional(self.db.pool())
        .await
        .map_err(query_failed("resolve_role"))?;

        Ok(id.map(RoleId::new))
    }

    /// Resolves a permission reference to an id, with the same rules as
    /// roles.
    #[instrument(skip(self), level = "trace")]
    pub(crate) async fn resolve_permission_id(
        &self,
        permission: &PermissionRef,
    ) -> Result<Option<PermissionId>, Report<StoreError>> {
        let name = match permission {
            EntityRef::ById(id) => return Ok(Some(*id)),
            EntityRef::ByName(name) => name.as_str(),
        };

        let id: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM permissions
            WHERE slug = ? OR name = ?
            ORDER BY slug = ? DESC, id ASC
            LIMIT 1
            "#,
        )
        .bind(name)
        .bind(name)
        .bind(name)
        .fetch_optional(self.db.pool())
        .await
        .map_err(query_failed("resolve_permission"))?;

        Ok(id.map(PermissionId::new))
    }
}
