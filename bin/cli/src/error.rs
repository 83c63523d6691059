//! CLI error types.

use std::fmt;
use std::path::PathBuf;

/// Errors surfaced by `warden` subcommands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// Configuration could not be loaded.
    Config {
        /// Error details.
        details: String,
    },
    /// The store failed.
    Store {
        /// Error details.
        details: String,
    },
    /// A seed file or seed run failed.
    Seed {
        /// Error details.
        details: String,
    },
    /// A permission list file could not be read or parsed.
    PermissionList {
        /// Permission list file.
        path: PathBuf,
        /// Error details.
        details: String,
    },
    /// A guard check could not be answered.
    Check {
        /// Error details.
        details: String,
    },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "configuration error: {details}"),
            Self::Store { details } => write!(f, "store error: {details}"),
            Self::Seed { details } => write!(f, "seed error: {details}"),
            Self::PermissionList { path, details } => {
                write!(
                    f,
                    "failed to load permissions from '{}': {details}",
                    path.display()
                )
            }
            Self::Check { details } => write!(f, "check failed: {details}"),
        }
    }
}

impl std::error::Error for CliError {}
