//! Store access layer.
//!
//! Owns the SQLite connection pool and the schema lifecycle. Domain code
//! issues its own parameterized queries against [`Database::pool`].

use crate::config::StoreConfig;
use crate::error::{StoreError, query_failed};
use rootcause::prelude::Report;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// A migrated SQLite database shared by every store operation.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    path: PathBuf,
}

impl Database {
    /// Opens (creating if necessary) the database at `path` and applies
    /// pending migrations.
    ///
    /// The parent directory is created when missing. Foreign keys are
    /// enforced on every connection.
    #[instrument(skip(config), fields(path = %path.display()))]
    pub async fn open(path: &Path, config: &StoreConfig) -> Result<Self, Report<StoreError>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Connection {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?;

        let db = Self {
            pool,
            path: path.to_path_buf(),
        };
        db.migrate().await?;

        info!("database ready");
        Ok(db)
    }

    /// Applies the embedded schema migrations. Already-applied migrations
    /// are skipped.
    pub async fn migrate(&self) -> Result<(), Report<StoreError>> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration {
                details: e.to_string(),
            })?;

        debug!("migrations applied");
        Ok(())
    }

    /// Checks connectivity.
    pub async fn health_check(&self) -> Result<(), Report<StoreError>> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(query_failed("health_check"))?;
        Ok(())
    }

    /// Counts the rows of a schema table.
    pub async fn count_rows(&self, table: Table) -> Result<i64, Report<StoreError>> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.as_str());
        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(query_failed("count_rows"))?;
        Ok(count)
    }

    /// Closes every pooled connection. Further queries fail.
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("database closed");
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the absolute path of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The relations of the authorization schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Users,
    Roles,
    Permissions,
    UserRoles,
    UserPermissions,
    RolePermissions,
}

impl Table {
    /// Returns the SQL table name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Roles => "roles",
            Self::Permissions => "permissions",
            Self::UserRoles => "user_roles",
            Self::UserPermissions => "user_permissions",
            Self::RolePermissions => "role_permissions",
        }
    }
}
