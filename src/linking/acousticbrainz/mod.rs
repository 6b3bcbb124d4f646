//! AcousticBrainz integration
//!
//! Audio-feature service keyed by MusicBrainz recording id. It can only be
//! queried by canonical id, so it usually links through identifier chasing
//! after MusicBrainz has resolved the recording.

pub mod dto;
mod client;

pub use client::{AcousticBrainzClient, DEFAULT_BASE_URL};
