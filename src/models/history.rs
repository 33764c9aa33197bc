use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EnrichedItem, RecommendFilters};

/// Most results kept on a history snapshot
pub const HISTORY_SNAPSHOT_LIMIT: usize = 12;

/// Snapshot of one recommendation request. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filters: RecommendFilters,
    pub results: Vec<EnrichedItem>,
    pub created_at: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn new(user_id: Uuid, filters: RecommendFilters, results: &[EnrichedItem]) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            filters,
            results: results
                .iter()
                .take(HISTORY_SNAPSHOT_LIMIT)
                .cloned()
                .collect(),
            created_at: Utc::now(),
        }
    }
}
