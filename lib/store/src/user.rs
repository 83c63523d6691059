//! User operations.

use crate::error::{StoreError, query_failed};
use crate::model::{NewUser, User};
use crate::store::AuthStore;
use chrono::{DateTime, Utc};
use rootcause::prelude::Report;
use sqlx::FromRow;
use tracing::{debug, instrument};
use warden_core::UserId;

/// Row type for user queries.
#[derive(FromRow)]
struct UserRow {
    id: i64,
    email: Option<String>,
    external_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            email: row.email,
            external_id: row.external_id,
            created_at: row.created_at,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl AuthStore {
    /// Returns the id of the user with the given email or external id,
    /// creating the user if neither matches.
    ///
    /// Email is checked before external id. Empty strings count as absent.
    /// The insert is constraint-backed: when a concurrent caller inserts
    /// the same email first, its row is returned instead of a duplicate.
    #[instrument(skip(self))]
    pub async fn create_user(&self, user: &NewUser) -> Result<UserId, Report<StoreError>> {
        let email = non_empty(user.email.as_deref());
        let external_id = non_empty(user.external_id.as_deref());

        if let Some(id) = self.existing_user_id(email, external_id).await? {
            debug!(%id, "user already exists");
            return Ok(id);
        }

        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO users (email, external_id, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT DO NOTHING
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(external_id)
        .bind(Utc::now())
        .fetch_optional(self.database().pool())
        .await
        .map_err(query_failed("create_user"))?;

        if let Some(id) = inserted {
            let id = UserId::new(id);
            debug!(%id, "user created");
            return Ok(id);
        }

        self.existing_user_id(email, external_id)
            .await?
            .ok_or_else(|| {
                StoreError::Query {
                    operation: "create_user",
                    details: "insert conflicted but no matching user was found".to_string(),
                }
                .into()
            })
    }

    async fn existing_user_id(
        &self,
        email: Option<&str>,
        external_id: Option<&str>,
    ) -> Result<Option<UserId>, Report<StoreError>> {
        if let Some(email) = email {
            let id: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
                .bind(email)
                .fetch_optional(self.database().pool())
                .await
                .map_err(query_failed("find_user"))?;
            if let Some(id) = id {
                return Ok(Some(UserId::new(id)));
            }
        }

        if let Some(external_id) = external_id {
            let id: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE external_id = ?")
                .bind(external_id)
                .fetch_optional(self.database().pool())
                .await
                .map_err(query_failed("find_user"))?;
            if let Some(id) = id {
                return Ok(Some(UserId::new(id)));
            }
        }

        Ok(None)
    }

    /// Finds a user by email address.
    #[instrument(skip(self))]
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Report<StoreError>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, email, external_id, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(self.database().pool())
        .await
        .map_err(query_failed("find_user_by_email"))?;

        Ok(row.map(User::from))
    }

    /// Finds a user by id.
    #[instrument(skip(self))]
    pub async fn find_user(&self, id: UserId) -> Result<Option<User>, Report<StoreError>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, email, external_id, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.get())
        .fetch_optional(self.database().pool())
        .await
        .map_err(query_failed("find_user"))?;

        Ok(row.map(User::from))
    }
}
