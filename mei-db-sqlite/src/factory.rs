use async_trait::async_trait;
use mei_core::db::{DbConfig, RepositoryFactory};
use mei_core::{MeiRepository, RepositoryError};
use tracing::info;

use crate::repository::SqliteRepository;

/// Registers the `"sqlite"` backend:
///
/// ```rust,no_run
/// use mei_core::db::RepositoryRegistry;
/// use mei_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// `config.connection_string` is a file path (created if missing), a
    /// `sqlite:` URL, or `:memory:`. Migrations run before returning.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn MeiRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string).await?;
        repo.run_migrations().await?;
        info!(database = %config.connection_string, "sqlite repository ready");
        Ok(Box::new(repo))
    }
}
