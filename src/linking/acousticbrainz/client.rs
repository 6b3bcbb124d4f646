//! AcousticBrainz HTTP client

use async_trait::async_trait;

use super::dto;
use crate::linking::domain::{Capabilities, CandidateRecord, InputRecord, Provider, ProviderError, QueryStrategy};
use crate::linking::http;
use crate::linking::traits::ProviderAdapter;

pub const DEFAULT_BASE_URL: &str = "https://acousticbrainz.org";

/// AcousticBrainz API client
pub struct AcousticBrainzClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl AcousticBrainzClient {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self::with_base_url(http_client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(http_client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Number of submissions for a recording; `None` if it is unknown
    pub async fn submission_count(&self, mbid: &str) -> Result<Option<u64>, ProviderError> {
        let url = format!(
            "{}/api/v1/{}/count",
            self.base_url,
            urlencoding::encode(mbid)
        );
        match http::get_json::<dto::CountResponse>(self.http_client.get(&url)).await {
            Ok(response) => Ok(response.map(|r| r.count)),
            // Malformed MBIDs are rejected with 400
            Err(ProviderError::Http { status: 400, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Public page for a recording's features
    pub fn recording_url(mbid: &str) -> String {
        format!("https://acousticbrainz.org/{mbid}")
    }
}

#[async_trait]
impl ProviderAdapter for AcousticBrainzClient {
    fn provider(&self) -> Provider {
        Provider::AcousticBrainz
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::CANONICAL_ID
    }

    async fn query(
        &self,
        strategy: QueryStrategy,
        input: &InputRecord,
    ) -> Result<Vec<CandidateRecord>, ProviderError> {
        let (QueryStrategy::CanonicalIdLookup, Some(mbid)) = (strategy, &input.canonical_id) else {
            return Ok(Vec::new());
        };

        let count = self.submission_count(mbid).await?.unwrap_or(0);
        if count == 0 {
            return Ok(Vec::new());
        }

        Ok(vec![CandidateRecord {
            canonical_id: Some(mbid.clone()),
            link: Some(Self::recording_url(mbid)),
            ..CandidateRecord::new(Provider::AcousticBrainz, mbid.clone())
        }])
    }
}
