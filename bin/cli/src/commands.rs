//! Subcommand implementations.

use crate::cli::{Cli, Command};
use crate::error::CliError;
use rootcause::prelude::Report;
use std::path::Path;
use std::process::ExitCode;
use std::str::FromStr;
use tracing::debug;
use warden_authz::{Decision, DenyReason, Identity, PermissionGate, RoleGate};
use warden_core::{EntityRef, PermissionId, RoleId, UserId, UserRef};
use warden_seed::{SeedDocument, Seeder, default_permissions};
use warden_store::{AuthStore, PermissionSeed, StoreConfig};

/// Runs the parsed command and returns the process exit code.
pub async fn run(cli: Cli) -> Result<ExitCode, Report<CliError>> {
    let config = StoreConfig::from_env().map_err(|e| CliError::Config {
        details: e.to_string(),
    })?;
    let path = config
        .resolve_db_path(cli.db.as_deref())
        .map_err(|e| CliError::Config {
            details: e.to_string(),
        })?;
    debug!(path = %path.display(), "opening store");

    let store = AuthStore::open_at(&path, &config)
        .await
        .map_err(|e| CliError::Store {
            details: e.to_string(),
        })?;

    let result = match cli.command {
        Command::Migrate => {
            println!("Migrated: {}", store.path().display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Permissions { from } => seed_permissions(&store, from.as_deref()).await,
        Command::Seed { file } => seed(&store, file.as_deref()).await,
        Command::Check {
            user,
            role,
            permission,
        } => check(&store, &user, role, permission).await,
    };

    store.close().await;
    result
}

async fn seed_permissions(
    store: &AuthStore,
    from: Option<&Path>,
) -> Result<ExitCode, Report<CliError>> {
    let items = match from {
        Some(path) => read_permission_list(path)?,
        None => default_permissions(),
    };

    let results = store
        .seed_permissions(&items)
        .await
        .map_err(|e| CliError::Store {
            details: e.to_string(),
        })?;
    for (index, result) in results.iter().enumerate() {
        if result.is_skipped() {
            eprintln!("skipped permissions: entry {index} has no name or slug");
        }
    }
    debug!(
        skipped = results.iter().filter(|r| r.is_skipped()).count(),
        "permission list applied"
    );

    println!("Permissions seeded");
    Ok(ExitCode::SUCCESS)
}

fn read_permission_list(path: &Path) -> Result<Vec<PermissionSeed>, Report<CliError>> {
    let list_error = |details: String| CliError::PermissionList {
        path: path.to_path_buf(),
        details,
    };

    let json = std::fs::read_to_string(path).map_err(|e| list_error(e.to_string()))?;
    let items = serde_json::from_str(&json).map_err(|e| list_error(e.to_string()))?;
    Ok(items)
}

async fn seed(store: &AuthStore, file: Option<&Path>) -> Result<ExitCode, Report<CliError>> {
    let document = match file {
        Some(path) => SeedDocument::from_path(path).map_err(|e| CliError::Seed {
            details: e.to_string(),
        })?,
        None => SeedDocument::sample(),
    };

    let report = Seeder::new(store)
        .run(&document)
        .await
        .map_err(|e| CliError::Seed {
            details: e.to_string(),
        })?;
    for item in &report.skipped {
        eprintln!("skipped {}: {}", item.section, item.reason);
    }

    println!("Sample RBAC data seeded");
    Ok(ExitCode::SUCCESS)
}

async fn check(
    store: &AuthStore,
    user: &UserRef,
    role: Option<String>,
    permission: Option<String>,
) -> Result<ExitCode, Report<CliError>> {
    let user_id = resolve_user(store, user).await?;
    let identity = user_id.map(Identity::user);

    let decision = match (role, permission) {
        (Some(role), _) => {
            RoleGate::any_of(store.clone(), [parse_ref::<RoleId>(&role)])
                .check(identity.as_ref())
                .await
        }
        (None, Some(permission)) => {
            PermissionGate::any_of(store.clone(), [parse_ref::<PermissionId>(&permission)])
                .check(identity.as_ref())
                .await
        }
        (None, None) => Ok(Decision::Deny(DenyReason::NoMatch)),
    }
    .map_err(|e| CliError::Check {
        details: e.to_string(),
    })?;

    if decision.is_allowed() {
        println!("allow");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("deny");
        Ok(ExitCode::FAILURE)
    }
}

/// Maps a user reference to a stored user id. Unknown users map to `None`.
async fn resolve_user(store: &AuthStore, user: &UserRef) -> Result<Option<UserId>, Report<CliError>> {
    let found = match user {
        UserRef::ById(id) => store.find_user(*id).await,
        UserRef::ByEmail(email) => store.find_user_by_email(email).await,
    }
    .map_err(|e| CliError::Store {
        details: e.to_string(),
    })?;

    Ok(found.map(|user| user.id))
}

/// Reads an argument as an id when it parses as one, otherwise as a name.
fn parse_ref<I: FromStr>(value: &str) -> EntityRef<I> {
    match value.parse::<I>() {
        Ok(id) => EntityRef::ById(id),
        Err(_) => EntityRef::ByName(value.to_string()),
    }
}
