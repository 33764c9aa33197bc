use chrono::{DateTime, Utc};
use sqlx::{migrate::Migrator, postgres::PgPoolOptions, types::Json, FromRow, PgPool};
use std::{sync::Arc, time::Duration};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    db::store::{AccountStore, HistoryStore},
    error::{AppError, AppResult},
    models::{Account, EnrichedItem, HistoryRecord, PreferenceAggregate, RecommendFilters},
};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Process-wide PostgreSQL connection, opened on first use.
///
/// A failed attempt leaves the cell empty so the next caller retries; the
/// server keeps serving catalog endpoints while the store is unreachable.
pub struct Database {
    database_url: String,
    pool: OnceCell<PgPool>,
}

impl Database {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            pool: OnceCell::new(),
        }
    }

    /// Returns the pool, connecting and running migrations if this is the first call
    pub async fn ensure_connected(&self) -> AppResult<&PgPool> {
        self.pool
            .get_or_try_init(|| async {
                tracing::info!("Connecting to PostgreSQL");

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .acquire_timeout(Duration::from_secs(5))
                    .connect(&self.database_url)
                    .await
                    .map_err(|e| {
                        tracing::error!(error = %e, "PostgreSQL connection failed");
                        e
                    })?;

                MIGRATOR.run(&pool).await?;

                tracing::info!("PostgreSQL connected");
                Ok::<_, AppError>(pool)
            })
            .await
    }
}

#[derive(FromRow)]
struct AccountRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    preferences: Json<PreferenceAggregate>,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            preferences: row.preferences.0,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct HistoryRow {
    id: Uuid,
    account_id: Uuid,
    filters: Json<RecommendFilters>,
    results: Json<Vec<EnrichedItem>>,
    created_at: DateTime<Utc>,
}

impl From<HistoryRow> for HistoryRecord {
    fn from(row: HistoryRow) -> Self {
        HistoryRecord {
            id: row.id,
            user_id: row.account_id,
            filters: row.filters.0,
            results: row.results.0,
            created_at: row.created_at,
        }
    }
}

/// Account and history storage backed by PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    db: Arc<Database>,
}

impl PgStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl AccountStore for PgStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let pool = self.db.ensure_connected().await?;

        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, name, email, password_hash, preferences, created_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Account::from))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        let pool = self.db.ensure_connected().await?;

        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, name, email, password_hash, preferences, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Account::from))
    }

    async fn insert(&self, account: &Account) -> AppResult<()> {
        let pool = self.db.ensure_connected().await?;

        sqlx::query(
            r#"
            INSERT INTO accounts (id, name, email, password_hash, preferences, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(account.id)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(Json(&account.preferences))
        .bind(account.created_at)
        .execute(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("User already exists. Please login.".to_string())
            }
            other => AppError::Database(other),
        })?;

        Ok(())
    }

    async fn save_preferences(
        &self,
        id: Uuid,
        preferences: &PreferenceAggregate,
    ) -> AppResult<()> {
        let pool = self.db.ensure_connected().await?;

        sqlx::query("UPDATE accounts SET preferences = $1 WHERE id = $2")
            .bind(Json(preferences))
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl HistoryStore for PgStore {
    async fn append(&self, record: &HistoryRecord) -> AppResult<()> {
        let pool = self.db.ensure_connected().await?;

        sqlx::query(
            r#"
            INSERT INTO history (id, account_id, filters, results, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(Json(&record.filters))
        .bind(Json(&record.results))
        .bind(record.created_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn list_for_account(&self, account_id: Uuid) -> AppResult<Vec<HistoryRecord>> {
        let pool = self.db.ensure_connected().await?;

        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, account_id, filters, results, created_at
            FROM history
            WHERE account_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(HistoryRecord::from).collect())
    }
}
