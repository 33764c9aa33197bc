use crate::{
    models::MediaKind,
    services::catalog::{self, CatalogClient},
};

/// Maps a spoken-language name onto the ISO 639-1 code TMDB filters by
pub fn language_code(name: &str) -> Option<&'static str> {
    match name.trim().to_lowercase().as_str() {
        "english" => Some("en"),
        "hindi" => Some("hi"),
        "marathi" => Some("mr"),
        "spanish" => Some("es"),
        "german" | "jerman" => Some("de"),
        _ => None,
    }
}

/// Static genre table shared by movies and series
fn known_genre_id(normalized: &str) -> Option<u32> {
    let id = match normalized {
        "action" => 28,
        "adventure" => 12,
        "animation" => 16,
        "comedy" => 35,
        "crime" => 80,
        "documentary" => 99,
        "drama" => 18,
        "family" => 10751,
        "fantasy" => 14,
        "history" => 36,
        "horror" => 27,
        "music" => 10402,
        "mystery" => 9648,
        "romance" | "romantic" => 10749,
        "sci-fi" | "science fiction" | "fiction" => 878,
        "thriller" => 53,
        "war" => 10752,
        "western" => 37,
        _ => return None,
    };
    Some(id)
}

/// Resolves a genre name to a catalog genre id.
///
/// Tries the static table first, then the catalog's genre list for `kind`.
/// `None` means no genre filter applies; catalog failures are not errors here.
pub async fn resolve_genre(
    catalog: &dyn CatalogClient,
    kind: MediaKind,
    name: Option<&str>,
) -> Option<u32> {
    let normalized = name?.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    if let Some(id) = known_genre_id(&normalized) {
        return Some(id);
    }

    match catalog::genre_list(catalog, kind).await {
        Ok(list) => {
            let found = list
                .genres
                .iter()
                .find(|g| g.name.to_lowercase() == normalized)
                .map(|g| g.id);
            if found.is_none() {
                tracing::debug!(genre = %normalized, kind = %kind, "Genre not found in catalog");
            }
            found
        }
        Err(e) => {
            tracing::warn!(error = %e, genre = %normalized, "Genre list lookup failed");
            None
        }
    }
}

/// Maps a provider name onto the catalog's provider id
pub fn provider_id(name: &str) -> Option<u32> {
    match name.trim().to_lowercase().as_str() {
        "netflix" => Some(8),
        "amazon prime video" | "prime video" | "amazon" => Some(9),
        "disney" | "disney+" | "hotstar" => Some(337),
        "hulu" => Some(15),
        "hbo max" | "hbomax" => Some(384),
        _ => None,
    }
}

/// Display name for a known provider id
pub fn provider_display_name(id: u32) -> Option<&'static str> {
    match id {
        8 => Some("Netflix"),
        9 => Some("Amazon Prime Video"),
        337 => Some("Disney+"),
        15 => Some("Hulu"),
        384 => Some("HBO Max"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, services::catalog::MockCatalogClient};
    use serde_json::json;

    #[test]
    fn test_language_code() {
        assert_eq!(language_code("English"), Some("en"));
        assert_eq!(language_code(" jerman "), Some("de"));
        assert_eq!(language_code("klingon"), None);
    }

    #[test]
    fn test_provider_id_aliases() {
        assert_eq!(provider_id("Netflix"), Some(8));
        assert_eq!(provider_id("prime video"), Some(9));
        assert_eq!(provider_id("Disney+"), Some(337));
        assert_eq!(provider_id("hotstar"), Some(337));
        assert_eq!(provider_id("crunchyroll"), None);
    }

    #[test]
    fn test_provider_display_name() {
        assert_eq!(provider_display_name(384), Some("HBO Max"));
        assert_eq!(provider_display_name(1), None);
    }

    #[tokio::test]
    async fn test_static_genre_skips_catalog() {
        let mut catalog = MockCatalogClient::new();
        catalog.expect_fetch().never();

        let id = resolve_genre(&catalog, MediaKind::Movie, Some("  Sci-Fi ")).await;
        assert_eq!(id, Some(878));
    }

    #[tokio::test]
    async fn test_blank_genre_is_none() {
        let mut catalog = MockCatalogClient::new();
        catalog.expect_fetch().never();

        assert_eq!(resolve_genre(&catalog, MediaKind::Movie, None).await, None);
        assert_eq!(resolve_genre(&catalog, MediaKind::Movie, Some("  ")).await, None);
    }

    #[tokio::test]
    async fn test_unmapped_genre_falls_back_to_catalog() {
        let mut catalog = MockCatalogClient::new();
        catalog
            .expect_fetch()
            .withf(|path, _| path == "/genre/tv/list")
            .times(2)
            .returning(|_, _| {
                Ok(json!({"genres": [
                    {"id": 10759, "name": "Action & Adventure"},
                    {"id": 10765, "name": "Sci-Fi & Fantasy"}
                ]}))
            });

        let first = resolve_genre(&catalog, MediaKind::Series, Some("sci-fi & fantasy")).await;
        let second = resolve_genre(&catalog, MediaKind::Series, Some("Sci-Fi & Fantasy")).await;
        assert_eq!(first, Some(10765));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_catalog_failure_means_no_filter() {
        let mut catalog = MockCatalogClient::new();
        catalog
            .expect_fetch()
            .returning(|_, _| Err(AppError::ExternalApi("boom".into())));

        let id = resolve_genre(&catalog, MediaKind::Movie, Some("kaiju")).await;
        assert_eq!(id, None);
    }
}
