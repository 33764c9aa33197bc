/// Media catalog gateway
///
/// `CatalogClient` is the single seam to the third-party catalog: one authenticated
/// GET returning parsed JSON. The typed queries below build on it and read every
/// field defensively, since the catalog makes no shape guarantees.
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogPage, CatalogTitle, GenreList, MediaKind},
};

pub mod tmdb;

pub use tmdb::TmdbClient;

/// Query parameters for a catalog call. `None` and empty values are never sent.
pub type QueryParams = Vec<(&'static str, Option<String>)>;

/// Language TMDB should localize titles and overviews into
const CATALOG_LANGUAGE: &str = "en-US";

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    /// GET `path` with the service credential and `params` appended.
    ///
    /// Transport failures and non-2xx statuses are errors. No retries.
    async fn fetch(&self, path: &str, params: QueryParams) -> AppResult<Value>;
}

/// Filters applied to candidate discovery
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoverFilters {
    pub genre_id: Option<u32>,
    pub language_code: Option<&'static str>,
    pub page: u32,
}

/// Popularity-ordered candidates for a media kind
pub async fn discover(
    catalog: &dyn CatalogClient,
    kind: MediaKind,
    filters: &DiscoverFilters,
) -> AppResult<CatalogPage> {
    let params: QueryParams = vec![
        ("language", Some(CATALOG_LANGUAGE.to_string())),
        ("sort_by", Some("popularity.desc".to_string())),
        ("page", Some(filters.page.max(1).to_string())),
        ("with_genres", filters.genre_id.map(|id| id.to_string())),
        (
            "with_original_language",
            filters.language_code.map(str::to_string),
        ),
    ];

    let value = catalog
        .fetch(&format!("/discover/{}", kind.as_path()), params)
        .await?;
    parse(value, "discover page")
}

/// First page of the catalog's popular titles
pub async fn popular(catalog: &dyn CatalogClient, kind: MediaKind) -> AppResult<CatalogPage> {
    let params: QueryParams = vec![
        ("language", Some(CATALOG_LANGUAGE.to_string())),
        ("page", Some("1".to_string())),
    ];

    let value = catalog
        .fetch(&format!("/{}/popular", kind.as_path()), params)
        .await?;
    parse(value, "popular page")
}

/// Genres the catalog knows for a media kind
pub async fn genre_list(catalog: &dyn CatalogClient, kind: MediaKind) -> AppResult<GenreList> {
    let params: QueryParams = vec![("language", Some(CATALOG_LANGUAGE.to_string()))];

    let value = catalog
        .fetch(&format!("/genre/{}/list", kind.as_path()), params)
        .await?;
    parse(value, "genre list")
}

/// Full detail for one title with credits and watch providers appended.
///
/// Returns the typed view alongside the raw payload.
pub async fn title_detail(
    catalog: &dyn CatalogClient,
    kind: MediaKind,
    id: u64,
) -> AppResult<(CatalogTitle, Value)> {
    let params: QueryParams = vec![(
        "append_to_response",
        Some("credits,watch/providers".to_string()),
    )];

    let raw = catalog
        .fetch(&format!("/{}/{}", kind.as_path(), id), params)
        .await?;
    let title = CatalogTitle::deserialize(&raw).map_err(|e| {
        AppError::ExternalApi(format!("Failed to parse title {} detail: {}", id, e))
    })?;

    Ok((title, raw))
}

fn parse<T: serde::de::DeserializeOwned>(value: Value, what: &str) -> AppResult<T> {
    serde_json::from_value(value)
        .map_err(|e| AppError::ExternalApi(format!("Failed to parse {}: {}", what, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_discover_sends_filters() {
        let mut catalog = MockCatalogClient::new();
        catalog
            .expect_fetch()
            .withf(|path, params| {
                path == "/discover/tv"
                    && params.contains(&("with_genres", Some("18".to_string())))
                    && params.contains(&("with_original_language", Some("hi".to_string())))
                    && params.contains(&("sort_by", Some("popularity.desc".to_string())))
            })
            .times(1)
            .returning(|_, _| Ok(json!({"results": [{"id": 1, "name": "Show"}], "total_results": 77})));

        let filters = DiscoverFilters {
            genre_id: Some(18),
            language_code: Some("hi"),
            page: 1,
        };
        let page = discover(&catalog, MediaKind::Series, &filters).await.unwrap();

        assert_eq!(page.total_results, 77);
        assert_eq!(page.results[0].display_title(), "Show");
    }

    #[tokio::test]
    async fn test_discover_tolerates_missing_fields() {
        let mut catalog = MockCatalogClient::new();
        catalog
            .expect_fetch()
            .returning(|_, _| Ok(json!({"status_message": "odd"})));

        let page = discover(&catalog, MediaKind::Movie, &DiscoverFilters::default())
            .await
            .unwrap();
        assert!(page.results.is_empty());
        assert_eq!(page.total_results, 0);
    }

    #[tokio::test]
    async fn test_title_detail_keeps_raw_payload() {
        let mut catalog = MockCatalogClient::new();
        catalog
            .expect_fetch()
            .withf(|path, _| path == "/movie/603")
            .returning(|_, _| Ok(json!({"id": 603, "title": "The Matrix", "budget": 63000000})));

        let (title, raw) = title_detail(&catalog, MediaKind::Movie, 603).await.unwrap();
        assert_eq!(title.display_title(), "The Matrix");
        assert_eq!(raw["budget"], 63000000);
    }

    #[tokio::test]
    async fn test_title_detail_rejects_malformed_payload() {
        let mut catalog = MockCatalogClient::new();
        catalog
            .expect_fetch()
            .returning(|_, _| Ok(json!({"id": "not-a-number"})));

        let result = title_detail(&catalog, MediaKind::Movie, 1).await;
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }
}
