//! Declarative seeding for the warden authorization store.
//!
//! A [`SeedDocument`] lists roles, permissions, users and the links between
//! them. [`Seeder`] writes it through the store's public operations in
//! dependency order and reports what was applied and what was skipped.

mod document;
mod error;
mod seeder;

pub use document::{
    RolePermissionLink, SeedDocument, UserPermissionLink, UserRoleLink, default_permissions,
};
pub use error::SeedError;
pub use seeder::{SeedReport, SeedSection, Seeder, SkippedItem};
