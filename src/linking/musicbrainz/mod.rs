//! MusicBrainz API integration
//!
//! The canonical registry: recordings are looked up by MBID, by ISRC, or
//! found through a Lucene search. Every candidate carries its MBID as the
//! canonical id, which lets the engine chase it into other providers.
//!
//! API docs: https://musicbrainz.org/doc/MusicBrainz_API

pub mod dto;
mod adapter;
mod client;

pub use adapter::{search_query, to_candidate};
pub use client::{DEFAULT_BASE_URL, MusicBrainzClient};
