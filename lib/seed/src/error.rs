//! Seeding error types.

use crate::seeder::SeedSection;
use std::fmt;
use std::path::PathBuf;

/// Errors that abort a seed run or stop a document from loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedError {
    /// The seed file could not be read.
    ReadFile {
        /// Seed file that failed to read.
        path: PathBuf,
        /// Error details.
        details: String,
    },
    /// The seed data is not a valid document.
    Parse {
        /// Error details.
        details: String,
    },
    /// The store failed while writing a section.
    Store {
        /// Section being written.
        section: SeedSection,
        /// Error details.
        details: String,
    },
}

impl fmt::Display for SeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, details } => {
                write!(f, "failed to read seed file '{}': {}", path.display(), details)
            }
            Self::Parse { details } => write!(f, "invalid seed data: {}", details),
            Self::Store { section, details } => {
                write!(f, "seeding {} failed: {}", section, details)
            }
        }
    }
}

impl std::error::Error for SeedError {}
