//! Core domain types and utilities for the warden authorization store.
//!
//! This crate provides the foundational types shared by every warden crate:
//! strongly-typed row identifiers, polymorphic id-or-name references, slug
//! derivation, and the `Result` alias used for error propagation.

pub mod error;
pub mod id;
pub mod reference;
pub mod slug;

pub use error::Result;
pub use id::{ParseIdError, PermissionId, RoleId, UserId};
pub use reference::{EntityRef, PermissionRef, RoleRef, UserRef};
pub use slug::slugify;
