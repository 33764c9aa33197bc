use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::AuthUser,
    models::{
        BrowseQuery, BrowseResponse, ProviderShelf, RecommendFilters, RecommendResponse,
        RegionQuery, TitleDetail,
    },
    routes::{
        extract::{AppJson, AppPath, AppQuery},
        AppState,
    },
};

/// Enriched recommendations for the caller. History and preference bookkeeping
/// happen after the results are built and never change them.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    AuthUser(account_id): AuthUser,
    AppJson(filters): AppJson<RecommendFilters>,
) -> AppResult<Json<RecommendResponse>> {
    let results = state.pipeline.recommend(&filters).await?;

    tracing::info!(
        account_id = %account_id,
        category = filters.category.as_deref().unwrap_or_default(),
        results = results.len(),
        "Recommendations built"
    );

    if !filters.is_podcast() {
        state.recorder.capture(account_id, &filters, &results).await;
    }

    Ok(Json(RecommendResponse { results }))
}

pub async fn browse(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<BrowseQuery>,
) -> AppResult<Json<BrowseResponse>> {
    let response = state.pipeline.browse(&query).await?;
    Ok(Json(response))
}

pub async fn by_provider(
    State(state): State<Arc<AppState>>,
    AppPath(name): AppPath<String>,
    AppQuery(query): AppQuery<RegionQuery>,
) -> AppResult<Json<ProviderShelf>> {
    let shelf = state.pipeline.by_provider(&name, &query).await?;
    Ok(Json(shelf))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    AppPath((media_type, id)): AppPath<(String, u64)>,
    AppQuery(query): AppQuery<RegionQuery>,
) -> AppResult<Json<TitleDetail>> {
    let detail = state
        .pipeline
        .detail(&media_type, id, query.region.as_deref())
        .await?;
    Ok(Json(detail))
}
