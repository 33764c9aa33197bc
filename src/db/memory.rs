use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    db::store::{AccountStore, HistoryStore},
    error::{AppError, AppResult},
    models::{Account, HistoryRecord, PreferenceAggregate},
};

/// In-process store used by unit tests
#[derive(Default)]
pub struct MemoryStore {
    pub accounts: Mutex<Vec<Account>>,
    pub history: Mutex<Vec<HistoryRecord>>,
}

#[async_trait::async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn insert(&self, account: &Account) -> AppResult<()> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.iter().any(|a| a.email == account.email) {
            return Err(AppError::Conflict("User already exists. Please login.".into()));
        }
        accounts.push(account.clone());
        Ok(())
    }

    async fn save_preferences(
        &self,
        id: Uuid,
        preferences: &PreferenceAggregate,
    ) -> AppResult<()> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.iter_mut().find(|a| a.id == id) {
            account.preferences = preferences.clone();
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl HistoryStore for MemoryStore {
    async fn append(&self, record: &HistoryRecord) -> AppResult<()> {
        self.history.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn list_for_account(&self, account_id: Uuid) -> AppResult<Vec<HistoryRecord>> {
        let history = self.history.lock().unwrap();
        let mut records: Vec<_> = history
            .iter()
            .filter(|r| r.user_id == account_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
