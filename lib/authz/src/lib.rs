//! Guard predicates for warden.
//!
//! A request layer builds a [`RoleGate`] or [`PermissionGate`] once and
//! checks it against the caller's [`Identity`] on every request. A gate
//! passes when any of its references matches. Missing identities are
//! denied before the store is consulted.

mod error;
mod gate;
mod source;
mod types;

pub use error::AuthzError;
pub use gate::{PermissionGate, RoleGate, has_any_permission, has_any_role};
pub use source::AccessSource;
pub use types::{Decision, DenyReason, Identity};
