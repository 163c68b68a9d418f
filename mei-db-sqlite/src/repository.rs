use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mei_core::{
    CalculationKind, MeiRepository, NewSavedCalculation, NewUser, Plan, RepositoryError,
    SavedCalculation, User,
};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::debug;

use crate::column::{encode_timestamp, get_json, get_text, get_timestamp};

const MEMORY_URL: &str = "sqlite::memory:";

/// How long a writer waits for another connection's write lock before the
/// statement fails with SQLITE_BUSY.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens `database_url`, which may be a bare file path (created if
    /// missing), a `sqlite:` URL, or `:memory:`.
    ///
    /// An in-memory database lives only as long as its connection, so it
    /// gets a single connection that is never recycled.
    pub async fn new(database_url: &str) -> Result<Self, RepositoryError> {
        let in_memory = matches!(database_url, ":memory:" | MEMORY_URL);

        let parsed = if in_memory {
            SqliteConnectOptions::from_str(MEMORY_URL)
        } else if database_url.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(database_url).map(|o| o.create_if_missing(true))
        } else {
            Ok(SqliteConnectOptions::new()
                .filename(database_url)
                .create_if_missing(true))
        };
        let options = parsed
            .map_err(|e| RepositoryError::Connection(e.to_string()))?
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        debug!(database_url, in_memory, "opened sqlite pool");
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn count_to_u32(count: i64) -> Result<u32, RepositoryError> {
    u32::try_from(count).map_err(|_| RepositoryError::Database(format!("Invalid count: {count}")))
}

fn row_to_user(row: &SqliteRow) -> Result<User, RepositoryError> {
    let plan_str = get_text(row, "plan")?;
    let plan = Plan::parse(&plan_str)
        .ok_or_else(|| RepositoryError::Database(format!("Invalid plan: {plan_str}")))?;

    Ok(User {
        id: get_text(row, "id")?,
        email: row.try_get("email").map_err(db_err)?,
        plan,
        created_at: get_timestamp(row, "created_at")?,
        updated_at: get_timestamp(row, "updated_at")?,
    })
}

fn row_to_calculation(row: &SqliteRow) -> Result<SavedCalculation, RepositoryError> {
    let kind_str = get_text(row, "kind")?;
    let kind = CalculationKind::parse(&kind_str)
        .ok_or_else(|| RepositoryError::Database(format!("Invalid calculation kind: {kind_str}")))?;

    Ok(SavedCalculation {
        id: row.try_get("id").map_err(db_err)?,
        user_id: get_text(row, "user_id")?,
        kind,
        input: get_json(row, "input")?,
        result: get_json(row, "result")?,
        created_at: get_timestamp(row, "created_at")?,
    })
}

const CALCULATION_COLUMNS: &str = "id, user_id, kind, input, result, created_at";

#[async_trait]
impl MeiRepository for SqliteRepository {
    async fn get_user(&self, id: &str) -> Result<User, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, email, plan, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_user(&row)
    }

    async fn upsert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let now = encode_timestamp(Utc::now());

        sqlx::query(
            "INSERT INTO users (id, email, plan, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 email = COALESCE(excluded.email, users.email),
                 updated_at = CASE
                     WHEN excluded.email IS NOT NULL AND excluded.email IS NOT users.email
                     THEN excluded.updated_at
                     ELSE users.updated_at
                 END",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(user.plan.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        self.get_user(&user.id).await
    }

    async fn set_user_plan(&self, id: &str, plan: Plan) -> Result<User, RepositoryError> {
        let result = sqlx::query("UPDATE users SET plan = ?, updated_at = ? WHERE id = ?")
            .bind(plan.as_str())
            .bind(encode_timestamp(Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        debug!(user_id = id, %plan, "plan updated");
        self.get_user(id).await
    }

    async fn count_calculations_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u32, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM calculations WHERE user_id = ? AND created_at >= ?",
        )
        .bind(user_id)
        .bind(encode_timestamp(since))
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        count_to_u32(count)
    }

    async fn count_calculations_by_kind(
        &self,
        user_id: &str,
    ) -> Result<Vec<(CalculationKind, u32)>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT kind, COUNT(*) AS n FROM calculations
             WHERE user_id = ?
             GROUP BY kind
             ORDER BY kind",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut counts = Vec::with_capacity(rows.len());
        for row in rows {
            let kind_str = get_text(&row, "kind")?;
            let kind = CalculationKind::parse(&kind_str).ok_or_else(|| {
                RepositoryError::Database(format!("Invalid calculation kind: {kind_str}"))
            })?;
            let n: i64 = row.try_get("n").map_err(db_err)?;
            counts.push((kind, count_to_u32(n)?));
        }
        Ok(counts)
    }

    async fn create_calculation(
        &self,
        calc: NewSavedCalculation,
    ) -> Result<SavedCalculation, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO calculations (user_id, kind, input, result, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&calc.user_id)
        .bind(calc.kind.as_str())
        .bind(calc.input.to_string())
        .bind(calc.result.to_string())
        .bind(encode_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = result.last_insert_rowid();
        debug!(id, user_id = %calc.user_id, kind = calc.kind.as_str(), "calculation saved");
        self.get_calculation(&calc.user_id, id).await
    }

    async fn reserve_calculation(
        &self,
        calc: NewSavedCalculation,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Option<SavedCalculation>, RepositoryError> {
        // One statement: SQLite holds the write lock across the count and the
        // insert, so two reservations cannot both observe `limit - 1`.
        let result = sqlx::query(
            "INSERT INTO calculations (user_id, kind, input, result, created_at)
             SELECT ?, ?, ?, ?, ?
             WHERE (
                 SELECT COUNT(*) FROM calculations
                 WHERE user_id = ? AND created_at >= ?
             ) < ?",
        )
        .bind(&calc.user_id)
        .bind(calc.kind.as_str())
        .bind(calc.input.to_string())
        .bind(calc.result.to_string())
        .bind(encode_timestamp(Utc::now()))
        .bind(&calc.user_id)
        .bind(encode_timestamp(since))
        .bind(i64::from(limit))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            debug!(user_id = %calc.user_id, limit, "reservation refused");
            return Ok(None);
        }

        let id = result.last_insert_rowid();
        debug!(id, user_id = %calc.user_id, kind = calc.kind.as_str(), "calculation reserved");
        self.get_calculation(&calc.user_id, id).await.map(Some)
    }

    async fn get_calculation(
        &self,
        user_id: &str,
        id: i64,
    ) -> Result<SavedCalculation, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {CALCULATION_COLUMNS} FROM calculations WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_calculation(&row)
    }

    async fn list_calculations(
        &self,
        user_id: &str,
        kind: Option<CalculationKind>,
    ) -> Result<Vec<SavedCalculation>, RepositoryError> {
        let rows = match kind {
            Some(kind) => sqlx::query(&format!(
                "SELECT {CALCULATION_COLUMNS} FROM calculations
                 WHERE user_id = ? AND kind = ?
                 ORDER BY created_at DESC, id DESC"
            ))
            .bind(user_id)
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?,
            None => sqlx::query(&format!(
                "SELECT {CALCULATION_COLUMNS} FROM calculations
                 WHERE user_id = ?
                 ORDER BY created_at DESC, id DESC"
            ))
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?,
        };

        rows.iter().map(row_to_calculation).collect()
    }

    async fn delete_calculation(&self, user_id: &str, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM calculations WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
