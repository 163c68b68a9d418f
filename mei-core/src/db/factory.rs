use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::repository::{MeiRepository, RepositoryError};

/// Which storage backend to open and how to reach it.
///
/// `connection_string` is handed to the factory untouched:
///
/// | backend  | connection_string examples            |
/// |----------|---------------------------------------|
/// | `sqlite` | `calcula-mei.db`, `:memory:`          |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub backend: String,
    #[serde(rename = "url")]
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

/// Implemented once per backend crate and registered at startup.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Lowercase name matched against [`DbConfig::backend`].
    fn backend_name(&self) -> &'static str;

    /// Opens the store and returns a repository ready for use, schema included.
    async fn create(&self, config: &DbConfig) -> Result<Box<dyn MeiRepository>, RepositoryError>;
}

/// Backend factories keyed by name.
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Replaces any factory already registered under the same name.
    pub fn register(&mut self, factory: Box<dyn RepositoryFactory>) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// # Errors
    /// * [`RepositoryError::Configuration`] if no factory matches
    ///   `config.backend`.
    /// * Whatever the matching factory returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn MeiRepository>, RepositoryError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                RepositoryError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// tests
// ─────────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;

    use crate::models::{
        CalculationKind, NewSavedCalculation, NewUser, Plan, SavedCalculation, User,
    };

    use super::{DbConfig, MeiRepository, RepositoryError, RepositoryFactory, RepositoryRegistry};

    // ── stub repository ──────────────────────────────────────────────────
    // Only routing is under test here; no method is ever called.
    struct StubRepository;

    #[async_trait]
    impl MeiRepository for StubRepository {
        async fn get_user(&self, _id: &str) -> Result<User, RepositoryError> {
            unimplemented!()
        }
        async fn upsert_user(&self, _user: NewUser) -> Result<User, RepositoryError> {
            unimplemented!()
        }
        async fn set_user_plan(&self, _id: &str, _plan: Plan) -> Result<User, RepositoryError> {
            unimplemented!()
        }
        async fn count_calculations_since(
            &self,
            _user_id: &str,
            _since: DateTime<Utc>,
        ) -> Result<u32, RepositoryError> {
            unimplemented!()
        }
        async fn count_calculations_by_kind(
            &self,
            _user_id: &str,
        ) -> Result<Vec<(CalculationKind, u32)>, RepositoryError> {
            unimplemented!()
        }
        async fn create_calculation(
            &self,
            _calc: NewSavedCalculation,
        ) -> Result<SavedCalculation, RepositoryError> {
            unimplemented!()
        }
        async fn reserve_calculation(
            &self,
            _calc: NewSavedCalculation,
            _since: DateTime<Utc>,
            _limit: u32,
        ) -> Result<Option<SavedCalculation>, RepositoryError> {
            unimplemented!()
        }
        async fn get_calculation(
            &self,
            _user_id: &str,
            _id: i64,
        ) -> Result<SavedCalculation, RepositoryError> {
            unimplemented!()
        }
        async fn list_calculations(
            &self,
            _user_id: &str,
            _kind: Option<CalculationKind>,
        ) -> Result<Vec<SavedCalculation>, RepositoryError> {
            unimplemented!()
        }
        async fn delete_calculation(&self, _user_id: &str, _id: i64) -> Result<(), RepositoryError> {
            unimplemented!()
        }
    }

    // ── stub factories ───────────────────────────────────────────────────
    struct StubFactory {
        name: &'static str,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl RepositoryFactory for StubFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn MeiRepository>, RepositoryError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Box::new(StubRepository))
        }
    }

    struct FailingFactory;

    #[async_trait]
    impl RepositoryFactory for FailingFactory {
        fn backend_name(&self) -> &'static str {
            "failing"
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn MeiRepository>, RepositoryError> {
            Err(RepositoryError::Connection("disk unavailable".to_string()))
        }
    }

    fn stub_factory(name: &'static str) -> (Box<dyn RepositoryFactory>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Box::new(StubFactory {
                name,
                called: flag.clone(),
            }),
            flag,
        )
    }

    fn config(backend: &str) -> DbConfig {
        DbConfig {
            backend: backend.to_string(),
            connection_string: ":memory:".to_string(),
        }
    }

    // ── DbConfig ─────────────────────────────────────────────────────────
    #[test]
    fn dbconfig_default_is_sqlite_memory() {
        let cfg = DbConfig::default();
        assert_eq!(cfg.backend, "sqlite");
        assert_eq!(cfg.connection_string, ":memory:");
    }

    #[test]
    fn dbconfig_reads_url_key() {
        let cfg: DbConfig = serde_json::from_str(r#"{"url": "mei.db"}"#).unwrap();
        assert_eq!(cfg.backend, "sqlite");
        assert_eq!(cfg.connection_string, "mei.db");
    }

    // ── registration ─────────────────────────────────────────────────────
    #[test]
    fn new_registry_has_no_backends() {
        assert!(RepositoryRegistry::new().available_backends().is_empty());
    }

    #[test]
    fn available_backends_is_sorted() {
        let mut reg = RepositoryRegistry::new();
        let (f1, _) = stub_factory("sqlite");
        let (f2, _) = stub_factory("postgres");
        reg.register(f1);
        reg.register(f2);
        assert_eq!(reg.available_backends(), vec!["postgres", "sqlite"]);
    }

    #[test]
    fn duplicate_registration_replaces_previous() {
        let mut reg = RepositoryRegistry::new();
        let (old, _) = stub_factory("sqlite");
        let (new, _) = stub_factory("sqlite");
        reg.register(old);
        reg.register(new);
        assert_eq!(reg.available_backends(), vec!["sqlite"]);
    }

    // ── dispatch ─────────────────────────────────────────────────────────
    #[tokio::test]
    async fn create_calls_only_the_matching_factory() {
        let mut reg = RepositoryRegistry::new();
        let (sqlite_factory, sqlite_called) = stub_factory("sqlite");
        let (postgres_factory, postgres_called) = stub_factory("postgres");
        reg.register(sqlite_factory);
        reg.register(postgres_factory);

        let result = reg.create(&config("sqlite")).await;

        assert!(result.is_ok());
        assert!(sqlite_called.load(Ordering::SeqCst));
        assert!(!postgres_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unknown_backend_names_requested_and_available() {
        let mut reg = RepositoryRegistry::new();
        let (f, _) = stub_factory("sqlite");
        reg.register(f);

        match reg.create(&config("postgres")).await {
            Err(RepositoryError::Configuration(msg)) => {
                assert!(msg.contains("postgres"));
                assert!(msg.contains("sqlite"));
            }
            Err(other) => panic!("expected Configuration error, got {other:?}"),
            Ok(_) => panic!("expected Configuration error, got a repository"),
        }
    }

    #[tokio::test]
    async fn create_propagates_factory_error() {
        let mut reg = RepositoryRegistry::new();
        reg.register(Box::new(FailingFactory));

        let err = reg.create(&config("failing")).await.err();

        assert_eq!(
            err,
            Some(RepositoryError::Connection("disk unavailable".to_string()))
        );
    }
}
