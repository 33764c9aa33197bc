use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt::Display};

pub mod account;
pub mod history;

pub use account::{Account, AccountSummary, PreferenceAggregate};
pub use history::HistoryRecord;

/// Region used when a request does not name one
pub const DEFAULT_REGION: &str = "US";

/// Catalog classification that selects which endpoints are queried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tv")]
    Series,
}

impl MediaKind {
    /// Maps a free-form category onto a media kind.
    ///
    /// `series`, `tv` and `webseries` select series; everything else is a movie.
    pub fn from_category(category: Option<&str>) -> Self {
        match category.map(|c| c.trim().to_lowercase()).as_deref() {
            Some("series") | Some("tv") | Some("webseries") => MediaKind::Series,
            _ => MediaKind::Movie,
        }
    }

    /// Parses the media type segment used by detail URLs
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment.to_lowercase().as_str() {
            "movie" => Some(MediaKind::Movie),
            "tv" | "series" => Some(MediaKind::Series),
            _ => None,
        }
    }

    /// Path segment TMDB uses for this kind
    pub fn as_path(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_path())
    }
}

/// Filter set submitted to the recommendation endpoint, also stored on history records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendFilters {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

impl RecommendFilters {
    /// Podcasts are not served by the catalog
    pub fn is_podcast(&self) -> bool {
        self.category()
            .is_some_and(|c| c.eq_ignore_ascii_case("podcast"))
    }

    pub fn category(&self) -> Option<&str> {
        non_empty(self.category.as_deref())
    }

    pub fn language(&self) -> Option<&str> {
        non_empty(self.language.as_deref())
    }

    pub fn genre(&self) -> Option<&str> {
        non_empty(self.genre.as_deref())
    }

    pub fn region(&self) -> &str {
        non_empty(self.region.as_deref()).unwrap_or(DEFAULT_REGION)
    }

    /// Copy with the effective region filled in, as persisted on history records
    pub fn resolved(&self) -> Self {
        Self {
            region: Some(self.region().to_string()),
            ..self.clone()
        }
    }
}

/// Query string accepted by the browse endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowseQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
}

/// Query string accepted by the provider and detail endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// A page of `/discover/{kind}` or `/{kind}/popular` results
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogPage {
    pub results: Vec<CatalogTitle>,
    pub total_results: u64,
}

/// `/genre/{kind}/list` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenreList {
    pub genres: Vec<CatalogGenre>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogGenre {
    pub id: u32,
    pub name: String,
}

/// A movie or series as TMDB returns it, from a list page or a detail call.
///
/// Every field is optional upstream; list results carry no credits or providers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogTitle {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub popularity: Option<f64>,
    pub runtime: Option<u32>,
    pub episode_run_time: Vec<u32>,
    pub genres: Vec<CatalogGenre>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub vote_average: Option<f64>,
    pub credits: Option<CatalogCredits>,
    #[serde(rename = "watch/providers")]
    pub watch_providers: Option<WatchProviders>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogCredits {
    pub cast: Vec<CatalogCastMember>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogCastMember {
    pub name: String,
    pub character: Option<String>,
}

/// Watch provider availability keyed by region code
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WatchProviders {
    pub results: HashMap<String, RegionAvailability>,
}

/// Availability buckets for one region
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegionAvailability {
    pub flatrate: Vec<ProviderOffer>,
    pub rent: Vec<ProviderOffer>,
    pub buy: Vec<ProviderOffer>,
    pub ads: Vec<ProviderOffer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderOffer {
    pub provider_id: Option<u32>,
    pub provider_name: String,
}

/// Number of credited actors kept per title
pub const CAST_LIMIT: usize = 10;

impl CatalogTitle {
    /// Movies carry `title`, series carry `name`
    pub fn display_title(&self) -> String {
        non_empty(self.title.as_deref())
            .or_else(|| non_empty(self.name.as_deref()))
            .unwrap_or_default()
            .to_string()
    }

    pub fn overview(&self) -> String {
        self.overview.clone().unwrap_or_default()
    }

    /// Movie runtime, or the first episode runtime for series
    pub fn runtime_minutes(&self) -> Option<u32> {
        self.runtime
            .filter(|r| *r > 0)
            .or_else(|| self.episode_run_time.first().copied().filter(|r| *r > 0))
    }

    pub fn release_date(&self) -> Option<String> {
        non_empty(self.release_date.as_deref())
            .or_else(|| non_empty(self.first_air_date.as_deref()))
            .map(str::to_string)
    }

    pub fn poster_url(&self, image_base: &str) -> Option<String> {
        non_empty(self.poster_path.as_deref()).map(|path| format!("{}{}", image_base, path))
    }

    pub fn popularity(&self) -> f64 {
        self.popularity.unwrap_or(0.0)
    }

    pub fn genre_names(&self) -> Vec<String> {
        self.genres.iter().map(|g| g.name.clone()).collect()
    }

    pub fn top_cast(&self) -> Vec<CastMember> {
        self.credits
            .as_ref()
            .map(|credits| {
                credits
                    .cast
                    .iter()
                    .take(CAST_LIMIT)
                    .map(|c| CastMember {
                        name: c.name.clone(),
                        character: c.character.clone().unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every offer for the region across the streaming, rent, buy and ad-supported buckets
    pub fn offers(&self, region: &str) -> Vec<&ProviderOffer> {
        let Some(availability) = self
            .watch_providers
            .as_ref()
            .and_then(|wp| wp.results.get(region))
        else {
            return Vec::new();
        };

        availability
            .flatrate
            .iter()
            .chain(availability.rent.iter())
            .chain(availability.buy.iter())
            .chain(availability.ads.iter())
            .collect()
    }

    /// Provider names for the region, deduplicated in first-seen order
    pub fn provider_names(&self, region: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for offer in self.offers(region) {
            if !offer.provider_name.is_empty() && !names.contains(&offer.provider_name) {
                names.push(offer.provider_name.clone());
            }
        }
        names
    }
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    pub character: String,
}

/// Short pointer to a later item in the same recommendation batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextPick {
    pub id: u64,
    pub title: String,
    pub poster: Option<String>,
    pub providers: Vec<String>,
}

/// A recommendation augmented with detail-fetched fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedItem {
    pub id: u64,
    pub media_type: MediaKind,
    pub title: String,
    pub overview: String,
    pub runtime: Option<u32>,
    pub poster: Option<String>,
    pub cast: Vec<CastMember>,
    pub providers: Vec<String>,
    pub genres: Vec<String>,
    pub popularity: f64,
    pub reason: String,
    pub release_date: Option<String>,
    #[serde(default)]
    pub next_picks: Vec<NextPick>,
}

impl EnrichedItem {
    pub fn as_next_pick(&self) -> NextPick {
        NextPick {
            id: self.id,
            title: self.title.clone(),
            poster: self.poster.clone(),
            providers: self.providers.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub results: Vec<EnrichedItem>,
}

/// Lightweight browse result, no detail fetch involved
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleSummary {
    pub id: u64,
    pub media_type: MediaKind,
    pub title: String,
    pub overview: String,
    pub poster: Option<String>,
    pub popularity: f64,
}

#[derive(Debug, Serialize)]
pub struct BrowseResponse {
    pub results: Vec<TitleSummary>,
    pub total: u64,
}

/// A title confirmed to be offered by the requested provider
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderTitle {
    pub id: u64,
    pub media_type: MediaKind,
    pub title: String,
    pub overview: String,
    pub poster: Option<String>,
    pub providers: Vec<String>,
    pub genres: Vec<String>,
    pub popularity: f64,
    pub runtime: Option<u32>,
}

/// Provider browse result. Unknown providers serialize as `{"categorized":{},"results":[]}`.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderShelf {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    pub categorized: std::collections::BTreeMap<String, Vec<ProviderTitle>>,
    pub results: Vec<ProviderTitle>,
}

/// Full detail view of a single title, including the raw upstream payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleDetail {
    pub id: u64,
    pub media_type: MediaKind,
    pub title: String,
    pub overview: String,
    pub runtime: Option<u32>,
    pub poster: Option<String>,
    pub cast: Vec<CastMember>,
    pub providers: Vec<String>,
    pub genres: Vec<String>,
    pub release_date: Option<String>,
    pub rating: f64,
    pub full: serde_json::Value,
}
