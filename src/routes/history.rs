use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{error::AppResult, middleware::AuthUser, models::HistoryRecord, routes::AppState};

/// The caller's recommendation history, newest first
pub async fn list(
    State(state): State<Arc<AppState>>,
    AuthUser(account_id): AuthUser,
) -> AppResult<Json<Vec<HistoryRecord>>> {
    let records = state.recorder.list(account_id).await?;
    Ok(Json(records))
}
