//! MusicBrainz HTTP client
//!
//! Handles communication with the MusicBrainz web service.
//! See: https://musicbrainz.org/doc/MusicBrainz_API
//!
//! IMPORTANT: MusicBrainz requires a User-Agent header and rate limits to 1 req/sec.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{adapter, dto};
use crate::linking::domain::{Capabilities, CandidateRecord, InputRecord, Provider, ProviderError, QueryStrategy};
use crate::linking::http;
use crate::linking::traits::ProviderAdapter;

pub const DEFAULT_BASE_URL: &str = "https://musicbrainz.org/ws/2";

/// MusicBrainz API client
pub struct MusicBrainzClient {
    http_client: reqwest::Client,
    base_url: String,
    search_limit: u32,
    /// Minimum spacing between requests
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl MusicBrainzClient {
    /// Create a client against the public web service
    pub fn new(http_client: reqwest::Client) -> Self {
        Self::with_base_url(http_client, DEFAULT_BASE_URL)
    }

    /// Create a client against a mirror (or a mock server)
    pub fn with_base_url(http_client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            search_limit: 10,
            min_interval: Duration::from_secs(1),
            last_request: Mutex::new(None),
        }
    }

    /// Maximum number of search hits to score
    pub fn with_search_limit(mut self, limit: u32) -> Self {
        self.search_limit = limit.max(1);
        self
    }

    /// Override the request spacing (mirrors usually have no rate limit)
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Look up a recording by MusicBrainz ID
    pub async fn lookup_recording(
        &self,
        recording_id: &str,
    ) -> Result<Option<dto::Recording>, ProviderError> {
        let url = format!(
            "{}/recording/{}?fmt=json&inc=artists+releases+media+isrcs",
            self.base_url,
            urlencoding::encode(recording_id)
        );
        self.get(&url).await
    }

    /// All recordings carrying an ISRC
    pub async fn recordings_by_isrc(&self, isrc: &str) -> Result<Vec<dto::Recording>, ProviderError> {
        let url = format!(
            "{}/isrc/{}?fmt=json&inc=artists+releases+media",
            self.base_url,
            urlencoding::encode(isrc)
        );
        let response: Option<dto::IsrcResponse> = self.get(&url).await?;
        Ok(response.map(|r| r.recordings).unwrap_or_default())
    }

    /// Run a Lucene recording search
    pub async fn search_recordings(&self, query: &str) -> Result<Vec<dto::Recording>, ProviderError> {
        let url = format!(
            "{}/recording?fmt=json&limit={}&query={}",
            self.base_url,
            self.search_limit,
            urlencoding::encode(query)
        );
        let response: Option<dto::SearchResponse> = self.get(&url).await?;
        Ok(response.map(|r| r.recordings).unwrap_or_default())
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<Option<T>, ProviderError> {
        self.throttle().await;
        tracing::debug!(target: "linking::musicbrainz", "GET {}", url);
        http::get_json(self.http_client.get(url)).await
    }

    /// Wait until `min_interval` has passed since the previous request.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.min_interval).await;
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl ProviderAdapter for MusicBrainzClient {
    fn provider(&self) -> Provider {
        Provider::MusicBrainz
    }

    fn capabilities(&self) -> Capabilities {
        // Track number and duration narrow a search but cannot start one
        Capabilities::CANONICAL_ID | Capabilities::RECORDING_CODE | Capabilities::SEARCH_KEYS
    }

    async fn query(
        &self,
        strategy: QueryStrategy,
        input: &InputRecord,
    ) -> Result<Vec<CandidateRecord>, ProviderError> {
        let recordings: Vec<dto::Recording> = match strategy {
            QueryStrategy::CanonicalIdLookup => match &input.canonical_id {
                Some(id) => self.lookup_recording(id).await?.into_iter().collect(),
                None => Vec::new(),
            },
            QueryStrategy::RecordingCodeLookup => match &input.recording_code {
                Some(code) => self.recordings_by_isrc(code).await?,
                None => Vec::new(),
            },
            QueryStrategy::FuzzySearch => match adapter::search_query(input) {
                Some(query) => self.search_recordings(&query).await?,
                None => Vec::new(),
            },
        };

        let mut candidates: Vec<CandidateRecord> = recordings
            .into_iter()
            .map(|r| adapter::to_candidate(r, input.album.as_deref()))
            .collect();

        // ISRC lookups don't include ISRCs on the recordings themselves
        if strategy == QueryStrategy::RecordingCodeLookup
            && let Some(code) = &input.recording_code
        {
            for candidate in candidates.iter_mut().filter(|c| c.recording_codes.is_empty()) {
                candidate.recording_codes.push(code.clone());
            }
        }

        Ok(candidates)
    }
}
