//! Bulk permission seeding.

use crate::error::StoreError;
use crate::model::NewPermission;
use crate::store::AuthStore;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use warden_core::{PermissionId, slugify};

/// One entry of a permission seed list.
///
/// Deserialises from either a bare string (the permission name) or an
/// object with optional `name`, `slug` and `description`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermissionSeed {
    /// A display name; the slug is derived from it.
    Name(String),
    /// Explicit fields.
    Detailed {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        slug: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl PermissionSeed {
    /// Derives the permission fields, or `None` if no name and slug can be
    /// derived.
    ///
    /// The name falls back to the slug; the slug falls back to the slug of
    /// the name. Empty strings count as absent.
    #[must_use]
    pub fn normalize(&self) -> Option<NewPermission> {
        let (name, slug, description) = match self {
            Self::Name(name) => (name.as_str(), slugify(name), None),
            Self::Detailed {
                name,
                slug,
                description,
            } => {
                let name_or_slug = present(name).or(present(slug)).unwrap_or_default();
                let slug = match present(slug) {
                    Some(slug) => slug.to_string(),
                    None => slugify(present(name).unwrap_or_default()),
                };
                (name_or_slug, slug, present(description))
            }
        };

        if name.is_empty() || slug.is_empty() {
            return None;
        }

        Some(NewPermission {
            name: name.to_string(),
            slug,
            description: description.map(str::to_string),
        })
    }
}

impl From<&str> for PermissionSeed {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

/// What happened to one seed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedItemResult {
    /// The permission exists with this id (inserted now or earlier).
    Upserted(PermissionId),
    /// Nothing could be derived from the entry; it was not written.
    Skipped,
}

impl SeedItemResult {
    /// Returns true if the entry was skipped.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

impl AuthStore {
    /// Upserts each permission in `items`, in order.
    ///
    /// Entries with no derivable name and slug are skipped and reported as
    /// such. A storage failure stops the batch and is returned; entries
    /// before it remain written.
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn seed_permissions(
        &self,
        items: &[PermissionSeed],
    ) -> Result<Vec<SeedItemResult>, Report<StoreError>> {
        let mut results = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let Some(permission) = item.normalize() else {
                debug!(index, ?item, "skipping permission seed with no name or slug");
                results.push(SeedItemResult::Skipped);
                continue;
            };

            let id = self.upsert_permission(&permission).await?;
            results.push(SeedItemResult::Upserted(id));
        }

        debug!(
            skipped = results.iter().filter(|r| r.is_skipped()).count(),
            "permissions seeded"
        );
        Ok(results)
    }
}
