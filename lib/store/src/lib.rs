//! Relational authorization store for warden.
//!
//! Users, roles and permissions live in a single SQLite database together
//! with the three link tables that connect them. [`AuthStore`] is the only
//! way in: it resolves id-or-name references, keeps every mutation
//! idempotent, and answers role and permission checks.

mod config;
mod db;
mod error;
mod model;
mod permission;
mod role;
mod seed;
mod store;
mod user;

pub use config::{DEFAULT_DB_FILE, ENV_PREFIX, StoreConfig};
pub use db::{Database, Table};
pub use error::StoreError;
pub use model::{
    EntityKind, NewPermission, NewRole, NewUser, Outcome, Permission, Role, Unresolved, User,
};
pub use seed::{PermissionSeed, SeedItemResult};
pub use store::AuthStore;
