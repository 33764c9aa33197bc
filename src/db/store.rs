use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Account, HistoryRecord, PreferenceAggregate},
};

/// Persistence for accounts and their preference counters
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    /// Looks up an account by its normalized email
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>>;

    /// Inserts a new account.
    ///
    /// Returns `AppError::Conflict` if the email is already taken.
    async fn insert(&self, account: &Account) -> AppResult<()>;

    /// Overwrites the stored preference document (last write wins)
    async fn save_preferences(&self, id: Uuid, preferences: &PreferenceAggregate)
        -> AppResult<()>;
}

/// Append-only storage of recommendation history
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, record: &HistoryRecord) -> AppResult<()>;

    /// All records for an account, newest first
    async fn list_for_account(&self, account_id: Uuid) -> AppResult<Vec<HistoryRecord>>;
}
