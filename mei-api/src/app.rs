//! Startup wiring: storage backend, bracket table and shared state.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use mei_core::MeiRepository;
use mei_core::calculations::{BracketTable, QuotaGate};
use mei_core::db::RepositoryRegistry;
use mei_data::BracketLoader;
use mei_db_sqlite::SqliteRepositoryFactory;
use tracing::info;

use crate::config::AppConfig;
use crate::state::AppState;

/// Every storage backend this binary can open.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// The built-in table, extended with the years in `file` when given.
pub fn load_brackets(file: Option<&Path>) -> Result<BracketTable> {
    let builtin = BracketTable::builtin();
    let Some(path) = file else {
        return Ok(builtin.clone());
    };

    let reader = File::open(path)
        .with_context(|| format!("cannot open bracket file '{}'", path.display()))?;
    let records = BracketLoader::parse(reader)
        .with_context(|| format!("cannot parse bracket file '{}'", path.display()))?;
    let table = BracketLoader::load(builtin, &records)
        .with_context(|| format!("invalid bracket data in '{}'", path.display()))?;

    info!(path = %path.display(), years = ?table.years(), "bracket table extended");
    Ok(table)
}

pub async fn build_state(config: &AppConfig) -> Result<AppState> {
    let registry = build_registry();
    let repo: Arc<dyn MeiRepository> = registry
        .create(&config.database)
        .await
        .with_context(|| {
            format!(
                "cannot open '{}' database at '{}'",
                config.database.backend, config.database.connection_string
            )
        })?
        .into();

    let brackets = load_brackets(config.brackets.file.as_deref())?;

    let quota = config.quota_config();
    info!(
        metering_enabled = quota.metering_enabled,
        free_limit = quota.free_limit,
        latest_year = brackets.latest().year,
        "state ready"
    );

    Ok(AppState::new(
        repo,
        brackets,
        QuotaGate::new(quota),
        config.auth.clone(),
    ))
}
