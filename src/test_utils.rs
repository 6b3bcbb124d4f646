//! Test utilities and fixtures for music-linker tests.
//!
//! This module provides common inputs, candidate factories, and annotation
//! documents to reduce boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use music_linker::test_utils::{let_it_be_input, mock_candidate};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let input = let_it_be_input();
//!     let candidate = mock_candidate(Provider::Deezer, "116348128");
//!     // ... test logic
//! }
//! ```

use std::path::{Path, PathBuf};

use serde_json::{Value, json};

use crate::linking::{CandidateRecord, InputRecord, Provider};

/// ISRC of "Let It Be" (2009 remaster).
pub const LET_IT_BE_ISRC: &str = "GBAYE0601696";

/// The "Let It Be" lookup used across matching tests.
///
/// Customize using struct update syntax:
///
/// ```ignore
/// let strict = InputRecord {
///     strict: true,
///     ..let_it_be_input()
/// };
/// ```
pub fn let_it_be_input() -> InputRecord {
    InputRecord {
        artist: Some("The Beatles".to_string()),
        title: Some("Let It Be".to_string()),
        duration: Some(243.0),
        ..Default::default()
    }
}

/// A candidate that agrees with [`let_it_be_input`] on every field it
/// carries.
pub fn mock_candidate(provider: Provider, id: &str) -> CandidateRecord {
    CandidateRecord {
        artist: Some("The Beatles".to_string()),
        title: Some("Let It Be".to_string()),
        duration: Some(243.0),
        ..CandidateRecord::new(provider, id)
    }
}

/// A JAMS document with metadata, sandbox fields and content the linker
/// must not touch.
pub fn sample_jams() -> Value {
    json!({
        "file_metadata": {
            "title": "Let It Be",
            "artist": "The Beatles",
            "release": "Let It Be",
            "duration": 243.0,
            "jams_version": "0.3.4",
            "identifiers": {
                "isrc": LET_IT_BE_ISRC,
                "discogs": "r123"
            }
        },
        "sandbox": {
            "track_number": 6,
            "release_year": 1970
        },
        "annotations": [
            {
                "namespace": "chord",
                "data": [
                    { "time": 0.0, "duration": 2.5, "value": "C:maj", "confidence": 1.0 }
                ]
            }
        ]
    })
}

/// Writes `document` to `dir/name` and returns the path.
pub fn write_jams(dir: &Path, name: &str, document: &Value) -> PathBuf {
    let path = dir.join(name);
    let text = serde_json::to_string_pretty(document).expect("Failed to serialize JAMS");
    std::fs::write(&path, text).expect("Failed to write JAMS fixture");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_candidate_defaults() {
        let candidate = mock_candidate(Provider::MusicBrainz, "abc");
        assert_eq!(candidate.provider, Provider::MusicBrainz);
        assert_eq!(candidate.provider_id, "abc");
        assert_eq!(candidate.title, let_it_be_input().title);
        assert!(candidate.recording_codes.is_empty());
    }

    #[test]
    fn test_sample_jams_shape() {
        let doc = sample_jams();
        assert!(doc["file_metadata"].is_object());
        assert_eq!(doc["file_metadata"]["identifiers"]["isrc"], LET_IT_BE_ISRC);
    }
}
