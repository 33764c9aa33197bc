use std::{collections::BTreeMap, sync::Arc, time::Instant};

use crate::{
    error::{AppError, AppResult},
    models::{
        non_empty, BrowseQuery, BrowseResponse, CatalogTitle, EnrichedItem, MediaKind, NextPick,
        ProviderShelf, ProviderTitle, RecommendFilters, RegionQuery, TitleDetail, TitleSummary,
        DEFAULT_REGION,
    },
    services::{
        catalog::{self, CatalogClient, DiscoverFilters},
        lookup,
    },
};

/// Candidates enriched per recommendation request
pub const RECOMMEND_CANDIDATES: usize = 20;
/// Popular titles inspected when browsing by provider
pub const PROVIDER_CANDIDATES: usize = 50;
/// Most summaries a browse page returns
pub const BROWSE_LIMIT: usize = 40;
/// Later items linked from each recommendation
pub const NEXT_PICKS: usize = 3;
/// Provider names quoted in a recommendation reason
const REASON_PROVIDERS: usize = 2;
/// Bucket for provider titles without any genre
const UNCATEGORIZED: &str = "Other";

/// Turns filter sets into catalog queries and enriches the candidates
#[derive(Clone)]
pub struct EnrichmentPipeline {
    catalog: Arc<dyn CatalogClient>,
    image_base: String,
}

impl EnrichmentPipeline {
    pub fn new(catalog: Arc<dyn CatalogClient>, image_base: String) -> Self {
        Self {
            catalog,
            image_base,
        }
    }

    /// Discovers popular titles matching the filters and enriches each with cast,
    /// providers, runtime and a recommendation reason.
    ///
    /// Titles whose detail fetch fails are dropped; order otherwise follows the
    /// catalog's popularity ranking.
    pub async fn recommend(&self, filters: &RecommendFilters) -> AppResult<Vec<EnrichedItem>> {
        if filters.is_podcast() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let kind = MediaKind::from_category(filters.category());
        let discover_filters = self
            .discover_filters(kind, filters.genre(), filters.language(), 1)
            .await;

        let page = catalog::discover(self.catalog.as_ref(), kind, &discover_filters).await?;
        let candidates: Vec<u64> = page
            .results
            .iter()
            .take(RECOMMEND_CANDIDATES)
            .map(|t| t.id)
            .collect();

        tracing::info!(
            kind = %kind,
            candidates = candidates.len(),
            genre_id = ?discover_filters.genre_id,
            language = ?discover_filters.language_code,
            "Enriching recommendation candidates"
        );

        let details = self.fetch_details(kind, candidates).await;

        let region = filters.region();
        let category = filters.category().unwrap_or(kind.as_path());
        let items: Vec<EnrichedItem> = details
            .into_iter()
            .map(|title| {
                let providers = title.provider_names(region);
                let genres = title.genre_names();
                let reason = build_reason(
                    filters.genre(),
                    filters.language(),
                    category,
                    &genres,
                    &providers,
                );

                EnrichedItem {
                    id: title.id,
                    media_type: kind,
                    title: title.display_title(),
                    overview: title.overview(),
                    runtime: title.runtime_minutes(),
                    poster: title.poster_url(&self.image_base),
                    cast: title.top_cast(),
                    providers,
                    genres,
                    popularity: title.popularity(),
                    reason,
                    release_date: title.release_date(),
                    next_picks: Vec::new(),
                }
            })
            .collect();

        tracing::info!(
            results = items.len(),
            processing_time_ms = start.elapsed().as_millis(),
            "Recommendations enriched"
        );

        Ok(attach_next_picks(items))
    }

    /// Lightweight discovery page without per-title detail
    pub async fn browse(&self, query: &BrowseQuery) -> AppResult<BrowseResponse> {
        let kind = MediaKind::from_category(non_empty(query.category.as_deref()));
        let discover_filters = self
            .discover_filters(
                kind,
                non_empty(query.genre.as_deref()),
                non_empty(query.language.as_deref()),
                query.page.unwrap_or(1),
            )
            .await;

        let page = catalog::discover(self.catalog.as_ref(), kind, &discover_filters).await?;

        let results = page
            .results
            .iter()
            .take(BROWSE_LIMIT)
            .map(|title| TitleSummary {
                id: title.id,
                media_type: kind,
                title: title.display_title(),
                overview: title.overview(),
                poster: title.poster_url(&self.image_base),
                popularity: title.popularity(),
            })
            .collect();

        Ok(BrowseResponse {
            results,
            total: page.total_results,
        })
    }

    /// Popular titles offered by one provider, flat and grouped by first genre.
    ///
    /// An unknown provider name yields an empty shelf, not an error.
    pub async fn by_provider(&self, name: &str, query: &RegionQuery) -> AppResult<ProviderShelf> {
        let requested = name.trim().to_lowercase();
        let Some(provider_id) = lookup::provider_id(&requested) else {
            tracing::info!(provider = %name, "Unknown provider requested");
            return Ok(ProviderShelf::default());
        };

        let kind = MediaKind::from_category(non_empty(query.category.as_deref()));
        let region = non_empty(query.region.as_deref()).unwrap_or(DEFAULT_REGION);

        let page = catalog::popular(self.catalog.as_ref(), kind).await?;
        let candidates: Vec<u64> = page
            .results
            .iter()
            .take(PROVIDER_CANDIDATES)
            .map(|t| t.id)
            .collect();

        let details = self.fetch_details(kind, candidates).await;

        let results: Vec<ProviderTitle> = details
            .into_iter()
            .filter(|title| offered_by(title, region, &requested, provider_id))
            .map(|title| ProviderTitle {
                id: title.id,
                media_type: kind,
                title: title.display_title(),
                overview: title.overview(),
                poster: title.poster_url(&self.image_base),
                providers: title.provider_names(region),
                genres: title.genre_names(),
                popularity: title.popularity(),
                runtime: title.runtime_minutes(),
            })
            .collect();

        tracing::info!(
            provider_id = provider_id,
            kind = %kind,
            region = %region,
            matches = results.len(),
            "Provider shelf built"
        );

        Ok(ProviderShelf {
            provider: Some(
                lookup::provider_display_name(provider_id)
                    .map(str::to_string)
                    .unwrap_or_else(|| name.to_string()),
            ),
            media_type: Some(kind),
            total: Some(results.len()),
            categorized: group_by_first_genre(&results),
            results,
        })
    }

    /// Full detail for a single title
    pub async fn detail(
        &self,
        media_type: &str,
        id: u64,
        region: Option<&str>,
    ) -> AppResult<TitleDetail> {
        let kind = MediaKind::from_path(media_type).ok_or_else(|| {
            AppError::Validation(format!("Unsupported media type: {}", media_type))
        })?;
        let region = non_empty(region).unwrap_or(DEFAULT_REGION);

        let (title, raw) = catalog::title_detail(self.catalog.as_ref(), kind, id).await?;

        Ok(TitleDetail {
            id: title.id,
            media_type: kind,
            title: title.display_title(),
            overview: title.overview(),
            runtime: title.runtime_minutes(),
            poster: title.poster_url(&self.image_base),
            cast: title.top_cast(),
            providers: title.provider_names(region),
            genres: title.genre_names(),
            release_date: title.release_date(),
            rating: title.vote_average.unwrap_or(0.0),
            full: raw,
        })
    }

    async fn discover_filters(
        &self,
        kind: MediaKind,
        genre: Option<&str>,
        language: Option<&str>,
        page: u32,
    ) -> DiscoverFilters {
        DiscoverFilters {
            genre_id: lookup::resolve_genre(self.catalog.as_ref(), kind, genre).await,
            language_code: language.and_then(lookup::language_code),
            page,
        }
    }

    /// Fetches detail for every id concurrently and waits for all of them.
    ///
    /// Failed fetches are logged and left out; survivors keep the input order.
    async fn fetch_details(&self, kind: MediaKind, ids: Vec<u64>) -> Vec<CatalogTitle> {
        let mut tasks = Vec::with_capacity(ids.len());

        for id in ids {
            let client = Arc::clone(&self.catalog);
            let task = tokio::spawn(async move {
                catalog::title_detail(client.as_ref(), kind, id)
                    .await
                    .map(|(title, _)| title)
            });
            tasks.push((id, task));
        }

        let mut details = Vec::with_capacity(tasks.len());
        let mut dropped = 0usize;

        for (id, task) in tasks {
            match task.await {
                Ok(Ok(title)) => details.push(title),
                Ok(Err(e)) => {
                    dropped += 1;
                    tracing::warn!(title_id = id, error = %e, "Detail fetch failed, dropping title");
                }
                Err(e) => {
                    dropped += 1;
                    tracing::error!(title_id = id, error = %e, "Detail task join error");
                }
            }
        }

        if dropped > 0 {
            tracing::warn!(
                success_count = details.len(),
                error_count = dropped,
                "Partial detail fetch failure"
            );
        }

        details
    }
}

/// Assembles the one-line explanation shown with each recommendation
pub fn build_reason(
    genre: Option<&str>,
    language: Option<&str>,
    category: &str,
    genres: &[String],
    providers: &[String],
) -> String {
    let mut reasons = Vec::new();

    if let Some(genre) = genre {
        let wanted = genre.to_lowercase();
        if genres.iter().any(|g| g.to_lowercase().contains(&wanted)) {
            reasons.push(format!("matches your {} preference", genre));
        }
    }

    if let Some(language) = language {
        reasons.push(format!("in {}", language));
    }

    if !providers.is_empty() {
        let quoted: Vec<&str> = providers
            .iter()
            .take(REASON_PROVIDERS)
            .map(String::as_str)
            .collect();
        reasons.push(format!("available on {}", quoted.join(", ")));
    }

    if reasons.is_empty() {
        reasons.push(format!("popular {}", category));
    }

    format!("Recommended because {}", reasons.join(", "))
}

/// Links each item to the next items after it in the same batch
pub fn attach_next_picks(mut items: Vec<EnrichedItem>) -> Vec<EnrichedItem> {
    let picks: Vec<NextPick> = items.iter().map(EnrichedItem::as_next_pick).collect();

    for (i, item) in items.iter_mut().enumerate() {
        item.next_picks = picks.iter().skip(i + 1).take(NEXT_PICKS).cloned().collect();
    }

    items
}

fn offered_by(title: &CatalogTitle, region: &str, requested: &str, provider_id: u32) -> bool {
    title.offers(region).iter().any(|offer| {
        let name = offer.provider_name.to_lowercase();
        name == requested
            || offer.provider_id == Some(provider_id)
            || lookup::provider_id(&name) == Some(provider_id)
    })
}

fn group_by_first_genre(titles: &[ProviderTitle]) -> BTreeMap<String, Vec<ProviderTitle>> {
    let mut groups: BTreeMap<String, Vec<ProviderTitle>> = BTreeMap::new();
    for title in titles {
        let key = title
            .genres
            .first()
            .cloned()
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        groups.entry(key).or_default().push(title.clone());
    }
    groups
}
