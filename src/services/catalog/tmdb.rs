/// TMDB catalog client
///
/// Every request carries `api_key` as a query parameter. Responses are returned as
/// untyped JSON; shaping happens in the callers.
use reqwest::Client as HttpClient;
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    services::catalog::{CatalogClient, QueryParams},
};

#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbClient {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Credential first, then every parameter that carries a value
    fn build_query(&self, params: QueryParams) -> Vec<(&'static str, String)> {
        let mut query = vec![("api_key", self.api_key.clone())];
        query.extend(params.into_iter().filter_map(|(key, value)| {
            value.filter(|v| !v.is_empty()).map(|v| (key, v))
        }));
        query
    }
}

#[async_trait::async_trait]
impl CatalogClient for TmdbClient {
    async fn fetch(&self, path: &str, params: QueryParams) -> AppResult<Value> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&self.build_query(params))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                path = %path,
                status = %status,
                body = %body,
                provider = "tmdb",
                "Catalog request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "TMDB returned status {} for {}",
                status, path
            )));
        }

        let value: Value = response.json().await?;

        tracing::debug!(path = %path, provider = "tmdb", "Catalog request completed");

        Ok(value)
    }
}
