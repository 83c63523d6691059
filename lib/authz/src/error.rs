//! Authorization error types.

use std::fmt;

/// Authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// The access source could not answer the check.
    CheckFailed {
        /// Error details.
        details: String,
    },
    /// The caller was denied.
    AccessDenied {
        /// The references the gate accepts, as listed.
        required: String,
    },
}

impl fmt::Display for AuthzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CheckFailed { details } => {
                write!(f, "authorization check failed: {}", details)
            }
            Self::AccessDenied { required } => {
                write!(f, "access denied: requires any of [{}]", required)
            }
        }
    }
}

impl std::error::Error for AuthzError {}
