//! MusicBrainz API Data Transfer Objects
//!
//! These types match EXACTLY what the MusicBrainz API returns.
//! DO NOT add fields that aren't in the API response.
//! DO NOT use these types outside the musicbrainz module - convert to domain types.
//!
//! API Reference: https://musicbrainz.org/doc/MusicBrainz_API
//!
//! Three endpoints return recordings:
//! - `/recording/{mbid}` - a single recording (lookup)
//! - `/isrc/{isrc}` - every recording carrying the ISRC
//! - `/recording?query=` - Lucene search, each hit with a relevance `score`

use serde::{Deserialize, Serialize};

/// A recording, as returned by lookup, ISRC lookup and search
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Recording {
    /// MusicBrainz recording ID
    pub id: String,
    pub title: String,
    /// Duration in milliseconds
    pub length: Option<u64>,
    /// Search relevance 0-100 (search results only)
    pub score: Option<u32>,
    pub disambiguation: Option<String>,
    pub first_release_date: Option<String>,
    /// Artist credits
    #[serde(default)]
    pub artist_credit: Vec<ArtistCredit>,
    /// Releases this recording appears on
    #[serde(default)]
    pub releases: Vec<Release>,
    /// ISRCs (lookup with `inc=isrcs`, and search results)
    #[serde(default)]
    pub isrcs: Vec<String>,
}

/// Artist credit (can be multiple for collaborations)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistCredit {
    /// The artist
    pub artist: Artist,
    /// How this artist is credited (may differ from official name)
    pub name: Option<String>,
    /// Join phrase (e.g., " & ", " feat. ")
    pub joinphrase: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Artist {
    pub id: String,
    /// Official artist name
    pub name: String,
    /// Sort name (e.g., "Beatles, The")
    pub sort_name: Option<String>,
}

/// Release (album/single/EP)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Release {
    pub id: String,
    pub title: String,
    /// Release status (Official, Bootleg, etc.)
    pub status: Option<String>,
    /// Release date (YYYY, YYYY-MM, or YYYY-MM-DD)
    pub date: Option<String>,
    pub country: Option<String>,
    pub release_group: Option<ReleaseGroup>,
    /// Media (discs) in this release
    #[serde(default)]
    pub media: Vec<Medium>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseGroup {
    pub id: String,
    pub title: Option<String>,
    /// Primary type (Album, Single, EP, etc.)
    pub primary_type: Option<String>,
}

/// Medium (disc) within a release
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Medium {
    /// Position in release (disc number)
    pub position: Option<u32>,
    pub format: Option<String>,
    pub track_count: Option<u32>,
    /// Only the track matching the recording. Lookups call the list
    /// `tracks`, search results call it `track`.
    #[serde(default, alias = "track")]
    pub tracks: Vec<Track>,
}

/// Track on a medium
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Track {
    /// Track position on medium
    pub position: Option<u32>,
    /// Track number as printed (may be "A1", "1-5")
    pub number: Option<String>,
    pub title: Option<String>,
    /// Track length in milliseconds
    pub length: Option<u64>,
}

/// `/isrc/{isrc}` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IsrcResponse {
    pub isrc: String,
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

/// `/recording?query=` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResponse {
    pub count: Option<u32>,
    pub offset: Option<u32>,
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs match what the real API returns.
// If these fail, the API has changed and we need to update our DTOs.
// ============================================================================
