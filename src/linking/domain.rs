//! Internal domain models for track linking.
//!
//! These types are OUR types - they don't change when external APIs change.
//! Every provider response gets converted into a [`CandidateRecord`] by that
//! provider's adapter before the engine sees it.

use std::collections::BTreeMap;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Partial metadata describing the track to link.
///
/// Owned by the caller; the engine only ever borrows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputRecord {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    /// Position on the release (1-based)
    pub track_number: Option<u32>,
    /// Duration in seconds
    pub duration: Option<f64>,
    pub release_year: Option<i32>,
    /// MusicBrainz recording id
    pub canonical_id: Option<String>,
    /// ISRC
    pub recording_code: Option<String>,
    /// Precision over recall when accepting matches
    pub strict: bool,
}

impl InputRecord {
    /// Copy of this record with unusable values dropped.
    ///
    /// Whitespace-only text, track number zero and non-positive or
    /// non-finite durations count as absent.
    pub fn sanitized(&self) -> Self {
        fn text(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }

        Self {
            artist: text(&self.artist),
            album: text(&self.album),
            title: text(&self.title),
            track_number: self.track_number.filter(|n| *n > 0),
            duration: self.duration.filter(|d| d.is_finite() && *d > 0.0),
            release_year: self.release_year,
            canonical_id: text(&self.canonical_id),
            recording_code: text(&self.recording_code),
            strict: self.strict,
        }
    }

    /// The set of fields carrying a usable value.
    pub fn present_fields(&self) -> Capabilities {
        let clean = self.sanitized();
        let mut fields = Capabilities::empty();
        fields.set(Capabilities::ARTIST, clean.artist.is_some());
        fields.set(Capabilities::ALBUM, clean.album.is_some());
        fields.set(Capabilities::TITLE, clean.title.is_some());
        fields.set(Capabilities::TRACK_NUMBER, clean.track_number.is_some());
        fields.set(Capabilities::DURATION, clean.duration.is_some());
        fields.set(Capabilities::RELEASE_YEAR, clean.release_year.is_some());
        fields.set(Capabilities::CANONICAL_ID, clean.canonical_id.is_some());
        fields.set(Capabilities::RECORDING_CODE, clean.recording_code.is_some());
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.present_fields().is_empty()
    }

    pub fn strictness(&self) -> Strictness {
        Strictness::from(self.strict)
    }
}

/// External metadata services the engine knows how to link against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    MusicBrainz,
    Deezer,
    AcousticBrainz,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::MusicBrainz, Provider::Deezer, Provider::AcousticBrainz];

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::MusicBrainz => "musicbrainz",
            Provider::Deezer => "deezer",
            Provider::AcousticBrainz => "acousticbrainz",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown provider: {s}"))
    }
}

/// A single comparable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Artist,
    Album,
    Title,
    TrackNumber,
    Duration,
    ReleaseYear,
    CanonicalId,
    RecordingCode,
}

impl FieldKind {
    pub fn flag(self) -> Capabilities {
        match self {
            FieldKind::Artist => Capabilities::ARTIST,
            FieldKind::Album => Capabilities::ALBUM,
            FieldKind::Title => Capabilities::TITLE,
            FieldKind::TrackNumber => Capabilities::TRACK_NUMBER,
            FieldKind::Duration => Capabilities::DURATION,
            FieldKind::ReleaseYear => Capabilities::RELEASE_YEAR,
            FieldKind::CanonicalId => Capabilities::CANONICAL_ID,
            FieldKind::RecordingCode => Capabilities::RECORDING_CODE,
        }
    }
}

bitflags! {
    /// Set of field kinds, used both for "what the input carries" and for
    /// "what a provider can be queried by".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u16 {
        const ARTIST = 1 << 0;
        const ALBUM = 1 << 1;
        const TITLE = 1 << 2;
        const TRACK_NUMBER = 1 << 3;
        const DURATION = 1 << 4;
        const RELEASE_YEAR = 1 << 5;
        const CANONICAL_ID = 1 << 6;
        const RECORDING_CODE = 1 << 7;

        /// Fields that can start a fuzzy search on their own
        const SEARCH_KEYS = Self::ARTIST.bits() | Self::ALBUM.bits() | Self::TITLE.bits();
    }
}

/// How a provider is asked for candidates.
///
/// Declaration order is confidence order: identifier lookups first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStrategy {
    CanonicalIdLookup,
    RecordingCodeLookup,
    FuzzySearch,
}

/// Caller-selected precision/recall policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    Strict,
    Lenient,
}

impl From<bool> for Strictness {
    fn from(strict: bool) -> Self {
        if strict { Strictness::Strict } else { Strictness::Lenient }
    }
}

/// A record returned by a provider adapter. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub provider: Provider,
    /// Provider-native identifier (Deezer track id, MBID, ...)
    pub provider_id: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    pub track_number: Option<u32>,
    /// Duration in seconds
    pub duration: Option<f64>,
    pub release_year: Option<i32>,
    pub canonical_id: Option<String>,
    /// A recording can carry several ISRCs
    pub recording_codes: Vec<String>,
    /// Deep link to the provider's page for this record
    pub link: Option<String>,
    /// Provider-declared relevance; only used to break score ties
    pub popularity: Option<f64>,
    pub bpm: Option<f32>,
}

impl CandidateRecord {
    /// An otherwise empty record; adapters fill fields with struct update syntax.
    pub fn new(provider: Provider, provider_id: impl Into<String>) -> Self {
        Self {
            provider,
            provider_id: provider_id.into(),
            artist: None,
            album: None,
            title: None,
            track_number: None,
            duration: None,
            release_year: None,
            canonical_id: None,
            recording_codes: Vec::new(),
            link: None,
            popularity: None,
            bpm: None,
        }
    }
}

/// Similarity of one comparable field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldScore {
    pub field: FieldKind,
    pub score: f64,
}

/// A candidate together with how well it matched the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: CandidateRecord,
    /// Aggregate similarity in [0, 1]
    pub score: f64,
    /// Per-field scores, in comparator order
    pub breakdown: SmallVec<[FieldScore; 8]>,
    /// An identifier matched exactly and forced the score to 1.0
    pub identifier_match: bool,
}

impl ScoredCandidate {
    pub fn field_score(&self, field: FieldKind) -> Option<f64> {
        self.breakdown
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.score)
    }
}

/// Why a provider produced no winner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoMatchReason {
    /// The provider answered with an empty result list
    NoCandidates,
    /// The best candidate did not clear the acceptance threshold
    BelowThreshold { best: f64 },
    /// Strict mode: the best candidate did not lead by the required margin
    Ambiguous { best: f64, runner_up: f64 },
    /// Network, auth or parse failure
    Unavailable { message: String },
    /// The query exceeded its timeout or the overall deadline
    TimedOut,
}

impl fmt::Display for NoMatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoMatchReason::NoCandidates => write!(f, "no candidates"),
            NoMatchReason::BelowThreshold { best } => write!(f, "best score {best:.2} below threshold"),
            NoMatchReason::Ambiguous { best, runner_up } => {
                write!(f, "ambiguous ({best:.2} vs {runner_up:.2})")
            }
            NoMatchReason::Unavailable { message } => write!(f, "unavailable: {message}"),
            NoMatchReason::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Outcome of match selection for one provider. "No match" is a value,
/// not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Winner(ScoredCandidate),
    NoMatch(NoMatchReason),
}

impl Selection {
    pub fn winner(&self) -> Option<&ScoredCandidate> {
        match self {
            Selection::Winner(w) => Some(w),
            Selection::NoMatch(_) => None,
        }
    }

    pub fn is_winner(&self) -> bool {
        matches!(self, Selection::Winner(_))
    }
}

/// What one provider contributed to a request: its selection plus the
/// strategy that produced it (the last one tried when nothing won).
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderOutcome {
    pub selection: Selection,
    pub strategy: Option<QueryStrategy>,
}

impl ProviderOutcome {
    pub fn no_match(reason: NoMatchReason) -> Self {
        Self {
            selection: Selection::NoMatch(reason),
            strategy: None,
        }
    }

    pub fn summary(&self) -> MatchSummary {
        match &self.selection {
            Selection::Winner(w) => MatchSummary::Matched {
                score: w.score,
                strategy: self.strategy,
            },
            Selection::NoMatch(reason) => MatchSummary::NoMatch(reason.clone()),
        }
    }
}

/// Where a unified field value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Input,
    #[serde(untagged)]
    Provider(Provider),
}

/// A value tagged with its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Sourced<T> {
    pub fn new(value: T, source: Source) -> Self {
        Self { value, source }
    }
}

/// Identifier and deep link contributed by a winning provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderLink {
    pub id: String,
    pub url: Option<String>,
}

/// Per-provider outcome kept in the unified record for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchSummary {
    Matched { score: f64, strategy: Option<QueryStrategy> },
    NoMatch(NoMatchReason),
}

/// The merged result of one linking request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnifiedOutputRecord {
    pub artist: Option<Sourced<String>>,
    pub album: Option<Sourced<String>>,
    pub title: Option<Sourced<String>>,
    pub track_number: Option<Sourced<u32>>,
    pub duration: Option<Sourced<f64>>,
    pub release_year: Option<Sourced<i32>>,
    pub canonical_id: Option<Sourced<String>>,
    pub recording_code: Option<Sourced<String>>,
    pub bpm: Option<Sourced<f32>>,
    /// Every recording code seen on the input or a winner, sorted
    pub recording_codes: Vec<String>,
    /// One entry per winning provider
    pub links: BTreeMap<Provider, ProviderLink>,
    /// One entry per queried provider
    pub matches: BTreeMap<Provider, MatchSummary>,
}

impl UnifiedOutputRecord {
    /// Whether any provider produced a winning match.
    pub fn is_linked(&self) -> bool {
        !self.links.is_empty()
    }
}

/// Errors that abort a linking request.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Insufficient metadata: no field any provider can query by")]
    InsufficientMetadata,

    #[error("Invalid match configuration: {0}")]
    InvalidConfig(String),
}

/// Adapter-level failures. The engine treats every variant as "that
/// provider produced no match"; an empty result list is not an error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("API request failed: {0}")]
    Api(String),

    #[error("Rate limited - try again later")]
    RateLimited,

    #[error("Failed to parse response: {0}")]
    Parse(String),
}
