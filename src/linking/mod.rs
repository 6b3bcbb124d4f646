//! Track linking - resolves partial track metadata against external
//! metadata providers and merges what they know into one record.
//!
//! # Architecture
//!
//! This module follows a clean separation between:
//! - **Domain models** (`domain.rs`) - Internal types for inputs, candidates and results
//! - **API DTOs** (`musicbrainz/dto.rs`, `deezer/dto.rs`, `acousticbrainz/dto.rs`) - Exact API response shapes
//! - **Adapters** - Convert DTOs to domain candidates
//! - **Clients** - HTTP clients implementing [`ProviderAdapter`]
//! - **Matching** - `normalize`, `planner`, `scorer`, `selector`, `aggregator`
//! - **Engine** - Concurrent orchestration of one linking request
//!
//! The matching code only ever sees [`ProviderAdapter`] and domain types, so
//! providers can be swapped or mocked without touching it.
//!
//! # Usage
//!
//! ```ignore
//! use music_linker::linking::{InputRecord, LinkEngine, MatchConfig, ProviderSettings};
//!
//! let engine = LinkEngine::with_defaults(&ProviderSettings::default())?;
//! let input = InputRecord {
//!     artist: Some("The Beatles".to_string()),
//!     title: Some("Let It Be".to_string()),
//!     ..Default::default()
//! };
//!
//! let record = engine.link(&input, &MatchConfig::default()).await?;
//! println!("Deezer: {:?}", record.links.get(&Provider::Deezer));
//! ```

pub mod domain;
pub mod normalize;
pub mod policy;
pub mod traits;
pub mod planner;
pub mod scorer;
pub mod selector;
pub mod aggregator;
pub mod http;
pub mod musicbrainz;
pub mod deezer;
pub mod acousticbrainz;
pub mod engine;

pub use domain::{
    CandidateRecord, InputRecord, LinkError, MatchSummary, NoMatchReason, Provider, ProviderError,
    ProviderLink, QueryStrategy, Selection, Source, Sourced, Strictness, UnifiedOutputRecord,
};
pub use engine::{LinkEngine, ProviderSettings};
pub use policy::{FieldWeights, MatchConfig};
pub use traits::ProviderAdapter;
