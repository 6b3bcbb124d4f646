//! Music Linker - links partial track metadata to external music catalogs.
//!
//! Given whatever is known about a track (artist, title, album, duration,
//! identifiers), the [`linking`] engine queries MusicBrainz, Deezer and
//! AcousticBrainz concurrently, scores what comes back, and merges the
//! winners into one record with per-field provenance. The [`annotations`]
//! module applies results to JAMS files for batch work.

pub mod annotations;
pub mod cli;
pub mod config;
pub mod error;
pub mod linking;
#[cfg(test)]
pub mod test_utils;
