//! Adapter layer: Convert MusicBrainz DTOs to domain models
//!
//! This is the ONLY place where DTO types are converted to domain types, and
//! where domain input is turned into MusicBrainz search syntax.

use super::dto;
use crate::linking::domain::{CandidateRecord, InputRecord, Provider, Strictness};
use crate::linking::normalize::normalize;

/// Half-width of the duration range in a search query, in milliseconds
const DURATION_SLACK_MS: u64 = 10_000;

/// Release info extracted from MusicBrainz
#[derive(Debug, Default)]
struct ReleaseInfo {
    album: Option<String>,
    track_number: Option<u32>,
    year: Option<i32>,
}

/// Convert a MusicBrainz recording into a candidate.
///
/// A recording appears on many releases; `album_hint` (the input's album)
/// picks the release when one matches it.
pub fn to_candidate(recording: dto::Recording, album_hint: Option<&str>) -> CandidateRecord {
    let artist = build_artist_string(&recording.artist_credit);
    let release_info = extract_release_info(&recording.releases, album_hint);
    let year = release_info
        .year
        .or_else(|| parse_year(recording.first_release_date.as_deref()));
    let link = format!("https://musicbrainz.org/recording/{}", recording.id);

    CandidateRecord {
        artist,
        album: release_info.album,
        title: Some(recording.title),
        track_number: release_info.track_number,
        duration: recording.length.map(|ms| ms as f64 / 1000.0),
        release_year: year,
        canonical_id: Some(recording.id.clone()),
        recording_codes: recording.isrcs,
        link: Some(link),
        popularity: recording.score.map(|s| f64::from(s) / 100.0),
        ..CandidateRecord::new(Provider::MusicBrainz, recording.id)
    }
}

/// Build the Lucene query for a fuzzy recording search.
///
/// Strict requests AND the terms together, lenient ones OR them so a
/// single wrong field does not hide the recording. Returns `None` when the
/// input has nothing to search by.
pub fn search_query(input: &InputRecord) -> Option<String> {
    let mut terms = Vec::new();

    if let Some(title) = &input.title {
        terms.push(format!("recording:{}", phrase(title)));
    }
    if let Some(artist) = &input.artist {
        terms.push(format!("artist:{}", phrase(artist)));
    }
    if let Some(album) = &input.album {
        terms.push(format!("release:{}", phrase(album)));
    }
    if terms.is_empty() {
        return None;
    }

    if let Some(track) = input.track_number {
        terms.push(format!("tnum:{track}"));
    }
    if let Some(duration) = input.duration {
        let ms = (duration * 1000.0).round() as u64;
        terms.push(format!(
            "dur:[{} TO {}]",
            ms.saturating_sub(DURATION_SLACK_MS),
            ms.saturating_add(DURATION_SLACK_MS)
        ));
    }

    let joiner = match input.strictness() {
        Strictness::Strict => " AND ",
        Strictness::Lenient => " OR ",
    };
    Some(terms.join(joiner))
}

/// Quote a value as a Lucene phrase.
fn phrase(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Build a combined artist string from artist credits
fn build_artist_string(credits: &[dto::ArtistCredit]) -> Option<String> {
    if credits.is_empty() {
        return None;
    }

    let mut result = String::new();
    for credit in credits {
        // Use credited name if available, otherwise official name
        let name = credit.name.as_ref().unwrap_or(&credit.artist.name);
        result.push_str(name);

        // Add join phrase if present (e.g., " & ", " feat. ")
        if let Some(ref join) = credit.joinphrase {
            result.push_str(join);
        }
    }

    Some(result)
}

/// Extract the best release info from available releases
fn extract_release_info(releases: &[dto::Release], album_hint: Option<&str>) -> ReleaseInfo {
    let hint = album_hint.map(normalize).filter(|h| !h.is_empty());

    let release = hint
        .as_deref()
        .and_then(|hint| releases.iter().find(|r| normalize(&r.title) == hint))
        .or_else(|| {
            // Prefer official album releases over singles/bootlegs
            releases.iter().find(|r| {
                r.status.as_deref() == Some("Official")
                    && r.release_group
                        .as_ref()
                        .and_then(|rg| rg.primary_type.as_deref())
                        == Some("Album")
            })
        })
        .or_else(|| {
            releases
                .iter()
                .find(|r| r.status.as_deref() == Some("Official"))
        })
        .or_else(|| releases.first());

    let Some(release) = release else {
        return ReleaseInfo::default();
    };

    // Media only list the track matching the recording
    let track_number = release
        .media
        .iter()
        .flat_map(|m| m.tracks.iter())
        .find_map(|t| {
            t.position
                .or_else(|| t.number.as_deref().and_then(|n| n.trim().parse().ok()))
        });

    ReleaseInfo {
        album: Some(release.title.clone()),
        track_number,
        year: parse_year(release.date.as_deref()),
    }
}

/// Parse year from date (YYYY, YYYY-MM, or YYYY-MM-DD)
fn parse_year(date: Option<&str>) -> Option<i32> {
    date.and_then(|d| d.split('-').next())
        .and_then(|y| y.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_recording(id: &str, title: &str) -> dto::Recording {
        dto::Recording {
            id: id.to_string(),
            title: title.to_string(),
            length: None,
            score: None,
            disambiguation: None,
            first_release_date: None,
            artist_credit: vec![],
            releases: vec![],
            isrcs: vec![],
        }
    }

    fn make_artist_credit(name: &str, join: Option<&str>) -> dto::ArtistCredit {
        dto::ArtistCredit {
            artist: dto::Artist {
                id: format!("{}-id", name.to_lowercase()),
                name: name.to_string(),
                sort_name: None,
            },
            name: Some(name.to_string()),
            joinphrase: join.map(String::from),
        }
    }

    fn make_release(id: &str, title: &str, primary_type: &str, date: Option<&str>) -> dto::Release {
        dto::Release {
            id: id.to_string(),
            title: title.to_string(),
            status: Some("Official".to_string()),
            date: date.map(String::from),
            country: None,
            release_group: Some(dto::ReleaseGroup {
                id: format!("rg-{id}"),
                title: Some(title.to_string()),
                primary_type: Some(primary_type.to_string()),
            }),
            media: vec![],
        }
    }

    #[test]
    fn test_convert_minimal_recording() {
        let candidate = to_candidate(make_recording("rec-123", "Test Song"), None);

        assert_eq!(candidate.provider, Provider::MusicBrainz);
        assert_eq!(candidate.provider_id, "rec-123");
        assert_eq!(candidate.canonical_id.as_deref(), Some("rec-123"));
        assert_eq!(candidate.title.as_deref(), Some("Test Song"));
        assert_eq!(
            candidate.link.as_deref(),
            Some("https://musicbrainz.org/recording/rec-123")
        );
        assert_eq!(candidate.popularity, None);
    }

    #[test]
    fn test_convert_search_hit() {
        let mut recording = make_recording("rec-1", "Let It Be");
        recording.length = Some(243_026);
        recording.score = Some(87);
        recording.isrcs = vec!["GBAYE0601696".to_string()];
        recording.artist_credit = vec![make_artist_credit("The Beatles", None)];

        let candidate = to_candidate(recording, None);

        assert_eq!(candidate.artist.as_deref(), Some("The Beatles"));
        assert_eq!(candidate.duration, Some(243.026));
        assert_eq!(candidate.popularity, Some(0.87));
        assert_eq!(candidate.recording_codes, vec!["GBAYE0601696"]);
    }

    #[test]
    fn test_build_collaboration_artist() {
        let credits = vec![
            make_artist_credit("Queen", Some(" & ")),
            make_artist_credit("David Bowie", None),
        ];

        assert_eq!(
            build_artist_string(&credits),
            Some("Queen & David Bowie".to_string())
        );
    }

    #[test]
    fn test_prefer_official_album() {
        let releases = vec![
            make_release("single", "Single", "Single", None),
            make_release("album", "Album", "Album", Some("1975-10-31")),
        ];

        let info = extract_release_info(&releases, None);

        assert_eq!(info.album, Some("Album".to_string()));
        assert_eq!(info.year, Some(1975));
    }

    #[test]
    fn test_album_hint_picks_release() {
        let releases = vec![
            make_release("album", "Let It Be", "Album", Some("1970-05-08")),
            make_release("comp", "1 (One)", "Album", Some("2000-11-13")),
        ];

        let info = extract_release_info(&releases, Some("1 (ONE)"));

        assert_eq!(info.album, Some("1 (One)".to_string()));
        assert_eq!(info.year, Some(2000));
    }

    #[test]
    fn test_track_number_from_position_or_number() {
        let mut release = make_release("rel", "Album", "Album", None);
        release.media = vec![dto::Medium {
            position: Some(1),
            format: None,
            track_count: Some(12),
            tracks: vec![dto::Track {
                position: None,
                number: Some("6".to_string()),
                title: None,
                length: None,
            }],
        }];

        let info = extract_release_info(&[release], None);

        assert_eq!(info.track_number, Some(6));
    }

    #[test]
    fn test_year_falls_back_to_first_release_date() {
        let mut recording = make_recording("rec", "Song");
        recording.first_release_date = Some("1969".to_string());

        assert_eq!(to_candidate(recording, None).release_year, Some(1969));
    }

    #[test]
    fn test_search_query_lenient_ors_terms() {
        let input = InputRecord {
            artist: Some("The Beatles".to_string()),
            title: Some("Let It Be".to_string()),
            duration: Some(243.0),
            ..Default::default()
        };

        assert_eq!(
            search_query(&input).as_deref(),
            Some(r#"recording:"Let It Be" OR artist:"The Beatles" OR dur:[233000 TO 253000]"#)
        );
    }

    #[test]
    fn test_search_query_strict_ands_terms_and_escapes() {
        let input = InputRecord {
            title: Some(r#"12" Mix"#.to_string()),
            album: Some("Hits".to_string()),
            track_number: Some(3),
            strict: true,
            ..Default::default()
        };

        assert_eq!(
            search_query(&input).as_deref(),
            Some(r#"recording:"12\" Mix" AND release:"Hits" AND tnum:3"#)
        );
    }

    #[test]
    fn test_search_query_huge_duration_saturates() {
        let input = InputRecord {
            title: Some("Longplayer".to_string()),
            duration: Some(1e300),
            ..Default::default()
        };

        let query = search_query(&input).unwrap();
        assert!(query.ends_with(&format!("dur:[{} TO {}]", u64::MAX - DURATION_SLACK_MS, u64::MAX)));
    }

    #[test]
    fn test_search_query_needs_text() {
        let input = InputRecord {
            duration: Some(100.0),
            ..Default::default()
        };
        assert_eq!(search_query(&input), None);
    }
}
