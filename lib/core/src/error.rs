//! The `Result` alias shared by warden crates.
//!
//! Errors are plain enums owned by the crate that raises them (store,
//! authz, seed, cli). They travel wrapped in a rootcause [`Report`].

use rootcause::Report;

/// `Result` carrying a [`Report`] of context `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
