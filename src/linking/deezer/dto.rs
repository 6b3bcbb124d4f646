//! Deezer API Data Transfer Objects
//!
//! These types match what `api.deezer.com` returns.
//! DO NOT use these types outside the deezer module - convert to domain types.
//!
//! Deezer reports most errors with HTTP 200 and an `error` object in the
//! body, so every response is decoded through [`Envelope`].

use serde::{Deserialize, Serialize};

/// Error code for "no data" (unknown ISRC, unknown id)
pub const ERROR_NO_DATA: u32 = 800;
/// Error code for "quota exceeded"
pub const ERROR_QUOTA: u32 = 4;

/// Either an error object or the payload
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Error { error: ApiError },
    Ok(T),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub message: Option<String>,
    pub code: Option<u32>,
}

/// A track. Search results carry a subset of the fields that
/// `/track/{id}` and `/track/isrc:{code}` return.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Track {
    pub id: u64,
    pub title: String,
    /// Title without version qualifiers ("Remastered 2009")
    pub title_short: Option<String>,
    pub isrc: Option<String>,
    pub link: Option<String>,
    /// Duration in seconds
    pub duration: Option<u32>,
    pub track_position: Option<u32>,
    pub disk_number: Option<u32>,
    pub rank: Option<u64>,
    /// YYYY-MM-DD
    pub release_date: Option<String>,
    pub bpm: Option<f32>,
    pub artist: Option<Artist>,
    pub album: Option<Album>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Artist {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Album {
    pub id: u64,
    pub title: String,
    pub release_date: Option<String>,
}

/// `/search/track` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<Track>,
    pub total: Option<u32>,
    pub next: Option<String>,
}
