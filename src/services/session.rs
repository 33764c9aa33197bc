use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::HistoryStore,
    error::AppResult,
    models::{EnrichedItem, HistoryRecord, RecommendFilters},
    services::preferences::{PreferenceUpdate, PreferenceWriter},
};

/// Keeps a per-account trail of recommendation requests and feeds the
/// preference counters
#[derive(Clone)]
pub struct SessionRecorder {
    history: Arc<dyn HistoryStore>,
    preferences: PreferenceWriter,
}

impl SessionRecorder {
    pub fn new(history: Arc<dyn HistoryStore>, preferences: PreferenceWriter) -> Self {
        Self {
            history,
            preferences,
        }
    }

    /// Appends a history record holding the filters and the first 12 results
    pub async fn record(
        &self,
        account_id: Uuid,
        filters: &RecommendFilters,
        results: &[EnrichedItem],
    ) -> AppResult<HistoryRecord> {
        let record = HistoryRecord::new(account_id, filters.resolved(), results);
        self.history.append(&record).await?;

        tracing::debug!(
            account_id = %account_id,
            history_id = %record.id,
            results = record.results.len(),
            "History recorded"
        );

        Ok(record)
    }

    /// History for an account, newest first
    pub async fn list(&self, account_id: Uuid) -> AppResult<Vec<HistoryRecord>> {
        let mut records = self.history.list_for_account(account_id).await?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// Best-effort bookkeeping after a recommendation response is built.
    ///
    /// The history write is awaited but its failure only logs; the preference
    /// update is queued for the background writer and never awaited.
    pub async fn capture(
        &self,
        account_id: Uuid,
        filters: &RecommendFilters,
        results: &[EnrichedItem],
    ) {
        if let Err(e) = self.record(account_id, filters, results).await {
            tracing::warn!(account_id = %account_id, error = %e, "Could not save history");
        }

        self.preferences.enqueue(PreferenceUpdate::from_results(
            account_id,
            filters.genre(),
            filters.language(),
            results,
        ));
    }
}
