//! Deezer HTTP client
//!
//! The public API needs no credentials. Quota is 50 requests per 5 seconds;
//! exceeding it yields error code 4 in an otherwise successful response.

use async_trait::async_trait;

use super::{adapter, dto};
use crate::linking::domain::{Capabilities, CandidateRecord, InputRecord, Provider, ProviderError, QueryStrategy};
use crate::linking::http;
use crate::linking::traits::ProviderAdapter;

pub const DEFAULT_BASE_URL: &str = "https://api.deezer.com";

/// Deezer API client
pub struct DeezerClient {
    http_client: reqwest::Client,
    base_url: String,
    search_limit: u32,
}

impl DeezerClient {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self::with_base_url(http_client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(http_client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            search_limit: 10,
        }
    }

    pub fn with_search_limit(mut self, limit: u32) -> Self {
        self.search_limit = limit.max(1);
        self
    }

    /// Look up a track by ISRC
    pub async fn track_by_isrc(&self, isrc: &str) -> Result<Option<dto::Track>, ProviderError> {
        let url = format!(
            "{}/track/isrc:{}",
            self.base_url,
            urlencoding::encode(isrc)
        );
        self.get(self.http_client.get(&url)).await
    }

    /// Run an advanced track search
    pub async fn search_tracks(&self, query: &str, strict: bool) -> Result<Vec<dto::Track>, ProviderError> {
        let url = format!("{}/search/track", self.base_url);
        let limit = self.search_limit.to_string();
        let mut request = self
            .http_client
            .get(&url)
            .query(&[("q", query), ("limit", limit.as_str())]);
        if strict {
            // Disables Deezer's own fuzzy matching
            request = request.query(&[("strict", "on")]);
        }
        let response: Option<dto::SearchResponse> = self.get(request).await?;
        Ok(response.map(|r| r.data).unwrap_or_default())
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<T>, ProviderError> {
        match http::get_json::<dto::Envelope<T>>(request).await? {
            None => Ok(None),
            Some(dto::Envelope::Ok(payload)) => Ok(Some(payload)),
            Some(dto::Envelope::Error { error }) => match error.code {
                Some(dto::ERROR_NO_DATA) => Ok(None),
                Some(dto::ERROR_QUOTA) => Err(ProviderError::RateLimited),
                _ => Err(ProviderError::Api(
                    error.message.unwrap_or_else(|| "unknown error".to_string()),
                )),
            },
        }
    }
}

#[async_trait]
impl ProviderAdapter for DeezerClient {
    fn provider(&self) -> Provider {
        Provider::Deezer
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::RECORDING_CODE | Capabilities::SEARCH_KEYS
    }

    async fn query(
        &self,
        strategy: QueryStrategy,
        input: &InputRecord,
    ) -> Result<Vec<CandidateRecord>, ProviderError> {
        let tracks: Vec<dto::Track> = match strategy {
            QueryStrategy::RecordingCodeLookup => match &input.recording_code {
                Some(code) => self.track_by_isrc(code).await?.into_iter().collect(),
                None => Vec::new(),
            },
            QueryStrategy::FuzzySearch => match adapter::search_query(input) {
                Some(query) => self.search_tracks(&query, input.strict).await?,
                None => Vec::new(),
            },
            QueryStrategy::CanonicalIdLookup => Vec::new(),
        };

        Ok(tracks.into_iter().map(adapter::to_candidate).collect())
    }
}
