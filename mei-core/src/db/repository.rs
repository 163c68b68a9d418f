use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{CalculationKind, NewSavedCalculation, NewUser, Plan, SavedCalculation, User};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait MeiRepository: Send + Sync {
    // Users
    async fn get_user(&self, id: &str) -> Result<User, RepositoryError>;

    /// Creates the user if missing. An existing user keeps its plan; its
    /// email is only overwritten when `user.email` is set.
    async fn upsert_user(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn set_user_plan(&self, id: &str, plan: Plan) -> Result<User, RepositoryError>;

    // Usage
    async fn count_calculations_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u32, RepositoryError>;

    async fn count_calculations_by_kind(
        &self,
        user_id: &str,
    ) -> Result<Vec<(CalculationKind, u32)>, RepositoryError>;

    // Saved calculations
    async fn create_calculation(
        &self,
        calc: NewSavedCalculation,
    ) -> Result<SavedCalculation, RepositoryError>;

    /// Records `calc` only if the user has fewer than `limit` calculations
    /// created at or after `since`. The count and the insert happen as one
    /// statement, so concurrent callers cannot both slip under the limit.
    /// Returns `None` when the limit was already reached.
    async fn reserve_calculation(
        &self,
        calc: NewSavedCalculation,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Option<SavedCalculation>, RepositoryError>;

    /// Scoped to `user_id`; another user's record is reported as NotFound.
    async fn get_calculation(
        &self,
        user_id: &str,
        id: i64,
    ) -> Result<SavedCalculation, RepositoryError>;

    /// Newest first.
    async fn list_calculations(
        &self,
        user_id: &str,
        kind: Option<CalculationKind>,
    ) -> Result<Vec<SavedCalculation>, RepositoryError>;

    async fn delete_calculation(&self, user_id: &str, id: i64) -> Result<(), RepositoryError>;
}
