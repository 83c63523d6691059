//! Command-line arguments.

use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use warden_core::UserRef;

/// Manage a warden authorization database.
#[derive(Debug, Parser)]
#[command(name = "warden", version, about)]
pub struct Cli {
    /// Database file. Overrides RBAC_DB_PATH; defaults to ./rbac.db.
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the database and apply the schema.
    Migrate,

    /// Seed permissions from a JSON array, or the default list.
    Permissions {
        /// JSON file holding an array of names or permission objects.
        #[arg(long, value_name = "FILE")]
        from: Option<PathBuf>,
    },

    /// Seed roles, permissions, users and links from a JSON document, or
    /// the built-in sample.
    Seed {
        /// JSON seed document.
        #[arg(long, visible_alias = "from", value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Check whether a user holds a role or permission. Exits 1 on deny.
    #[command(group(ArgGroup::new("target").required(true).args(["role", "permission"])))]
    Check {
        /// User id or email.
        #[arg(long)]
        user: UserRef,

        /// Role slug, name or id.
        #[arg(long)]
        role: Option<String>,

        /// Permission slug, name or id.
        #[arg(long)]
        permission: Option<String>,
    },
}
