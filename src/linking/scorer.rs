//! Candidate scoring.
//!
//! Each comparable field gets a similarity in [0, 1]. A field missing on
//! either side is "not comparable": it is left out of both the numerator and
//! the denominator of the weighted mean, so absence is never penalized or
//! rewarded. An exact identifier match is authoritative and forces 1.0.

use std::collections::BTreeSet;

use smallvec::SmallVec;
use strsim::normalized_levenshtein;

use super::domain::{CandidateRecord, FieldKind, FieldScore, InputRecord, ScoredCandidate};
use super::normalize::{normalize, normalize_code, normalize_id};
use super::policy::MatchConfig;

/// Discount applied to token-set similarity so that a strict subset of
/// words ("let it be" vs "let it be (remastered)") ranks below identical text.
const TOKEN_SET_DISCOUNT: f64 = 0.9;

/// Score one candidate against the input.
pub fn score(input: &InputRecord, candidate: &CandidateRecord, config: &MatchConfig) -> ScoredCandidate {
    let mut breakdown: SmallVec<[FieldScore; 8]> = SmallVec::new();
    let mut push = |field: FieldKind, similarity: Option<f64>| {
        if let Some(score) = similarity {
            breakdown.push(FieldScore { field, score });
        }
    };

    push(
        FieldKind::CanonicalId,
        identifier_similarity(input.canonical_id.as_deref(), candidate.canonical_id.as_deref()),
    );
    push(
        FieldKind::RecordingCode,
        code_similarity(input.recording_code.as_deref(), &candidate.recording_codes),
    );
    push(
        FieldKind::Title,
        text_similarity(input.title.as_deref(), candidate.title.as_deref()),
    );
    push(
        FieldKind::Artist,
        text_similarity(input.artist.as_deref(), candidate.artist.as_deref()),
    );
    push(
        FieldKind::Album,
        text_similarity(input.album.as_deref(), candidate.album.as_deref()),
    );
    push(
        FieldKind::Duration,
        duration_similarity(input.duration, candidate.duration, config),
    );
    push(
        FieldKind::TrackNumber,
        exact_similarity(input.track_number, candidate.track_number),
    );
    push(
        FieldKind::ReleaseYear,
        year_similarity(input.release_year, candidate.release_year, config),
    );

    let identifier_match = breakdown.iter().any(|f| {
        matches!(f.field, FieldKind::CanonicalId | FieldKind::RecordingCode) && f.score >= 1.0
    });

    let aggregate = if identifier_match {
        1.0
    } else {
        weighted_mean(&breakdown, config)
    };

    tracing::debug!(
        target: "linking::scorer",
        "{} candidate {} scored {:.3}",
        candidate.provider,
        candidate.provider_id,
        aggregate
    );

    ScoredCandidate {
        candidate: candidate.clone(),
        score: aggregate,
        breakdown,
        identifier_match,
    }
}

/// Score every candidate, preserving input order.
pub fn score_all(
    input: &InputRecord,
    candidates: &[CandidateRecord],
    config: &MatchConfig,
) -> Vec<ScoredCandidate> {
    candidates.iter().map(|c| score(input, c, config)).collect()
}

fn weighted_mean(breakdown: &[FieldScore], config: &MatchConfig) -> f64 {
    let (sum, total) = breakdown.iter().fold((0.0, 0.0), |(sum, total), f| {
        let weight = config.weights.weight(f.field);
        (sum + weight * f.score, total + weight)
    });

    if total > 0.0 {
        (sum / total).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Similarity of two free-text values after normalization.
///
/// The better of plain edit-distance similarity and (discounted) token-set
/// similarity, so word order and extra qualifiers are tolerated.
pub fn text_similarity(a: Option<&str>, b: Option<&str>) -> Option<f64> {
    let a = normalize(a?);
    let b = normalize(b?);
    if a.is_empty() || b.is_empty() {
        return None;
    }
    if a == b {
        return Some(1.0);
    }

    let edit = normalized_levenshtein(&a, &b);
    let tokens = token_set_ratio(&a, &b) * TOKEN_SET_DISCOUNT;
    Some(edit.max(tokens).clamp(0.0, 1.0))
}

/// Token-set ratio: compare the shared words against each side's full word
/// set, so "beatles the" and "the beatles" agree.
fn token_set_ratio(a: &str, b: &str) -> f64 {
    let left: BTreeSet<&str> = a.split_whitespace().collect();
    let right: BTreeSet<&str> = b.split_whitespace().collect();

    let shared = join(left.intersection(&right));
    let only_left = join(left.difference(&right));
    let only_right = join(right.difference(&left));

    let with_left = concat(&shared, &only_left);
    let with_right = concat(&shared, &only_right);

    let mut best = normalized_levenshtein(&with_left, &with_right);
    if !shared.is_empty() {
        best = best
            .max(normalized_levenshtein(&shared, &with_left))
            .max(normalized_levenshtein(&shared, &with_right));
    }
    best
}

fn join<'a: 'b, 'b>(words: impl Iterator<Item = &'b &'a str>) -> String {
    words.copied().collect::<Vec<_>>().join(" ")
}

fn concat(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (_, true) => head.to_string(),
        _ => format!("{head} {tail}"),
    }
}

/// Duration closeness: within the tolerance scores 1.0, decaying linearly
/// to 0.0 at the window.
pub fn duration_similarity(a: Option<f64>, b: Option<f64>, config: &MatchConfig) -> Option<f64> {
    let (a, b) = (a?, b?);
    if !(a.is_finite() && b.is_finite() && a > 0.0 && b > 0.0) {
        return None;
    }

    let diff = (a - b).abs();
    let tolerance = config.duration_tolerance_secs;
    let window = config.duration_window_secs;

    let similarity = if diff <= tolerance {
        1.0
    } else if diff >= window {
        0.0
    } else {
        1.0 - (diff - tolerance) / (window - tolerance)
    };
    Some(similarity)
}

/// Release years: exact is 1.0, off by one scores partially to tolerate
/// reissue and regional-release drift.
pub fn year_similarity(a: Option<i32>, b: Option<i32>, config: &MatchConfig) -> Option<f64> {
    let (a, b) = (a?, b?);
    Some(match a.abs_diff(b) {
        0 => 1.0,
        1 => config.year_off_by_one_score,
        _ => 0.0,
    })
}

pub fn exact_similarity<T: PartialEq>(a: Option<T>, b: Option<T>) -> Option<f64> {
    let (a, b) = (a?, b?);
    Some(if a == b { 1.0 } else { 0.0 })
}

fn identifier_similarity(a: Option<&str>, b: Option<&str>) -> Option<f64> {
    let a = normalize_id(a?);
    let b = normalize_id(b?);
    if a.is_empty() || b.is_empty() {
        return None;
    }
    Some(if a == b { 1.0 } else { 0.0 })
}

fn code_similarity(input: Option<&str>, codes: &[String]) -> Option<f64> {
    let wanted = normalize_code(input?);
    let codes: Vec<String> = codes
        .iter()
        .map(|c| normalize_code(c))
        .filter(|c| !c.is_empty())
        .collect();
    if wanted.is_empty() || codes.is_empty() {
        return None;
    }
    Some(if codes.contains(&wanted) { 1.0 } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linking::domain::Provider;

    /// Album-track lookup with every descriptive field set
    fn let_it_be_album_track() -> InputRecord {
        InputRecord {
            artist: Some("The Beatles".to_string()),
            title: Some("Let It Be".to_string()),
            album: Some("Let It Be".to_string()),
            track_number: Some(4),
            duration: Some(168.25),
            release_year: Some(1970),
            ..Default::default()
        }
    }

    #[test]
    fn test_let_it_be_scenario() {
        let candidate = CandidateRecord {
            artist: Some("the beatles".to_string()),
            title: Some("let it be".to_string()),
            duration: Some(170.0),
            release_year: Some(1970),
            ..CandidateRecord::new(Provider::Deezer, "dz-1")
        };

        let scored = score(&let_it_be_album_track(), &candidate, &MatchConfig::default());

        assert_eq!(scored.field_score(FieldKind::Title), Some(1.0));
        assert_eq!(scored.field_score(FieldKind::Artist), Some(1.0));
        assert!(scored.field_score(FieldKind::Duration).unwrap() >= 0.9);
        assert_eq!(scored.field_score(FieldKind::ReleaseYear), Some(1.0));
        // album and track number are absent on the candidate: not comparable
        assert_eq!(scored.field_score(FieldKind::Album), None);
        assert_eq!(scored.field_score(FieldKind::TrackNumber), None);
        assert!(scored.score >= 0.5);
        assert!(!scored.identifier_match);
    }

    #[test]
    fn test_canonical_id_match_forces_full_score() {
        let input = InputRecord {
            canonical_id: Some("b10bbbfc-cf9e-42e0-be17-e2c3e1d2600d".to_string()),
            artist: Some("Someone Else".to_string()),
            duration: Some(30.0),
            ..Default::default()
        };
        let candidate = CandidateRecord {
            canonical_id: Some("B10BBBFC-CF9E-42E0-BE17-E2C3E1D2600D".to_string()),
            artist: Some("Completely Different".to_string()),
            duration: Some(400.0),
            ..CandidateRecord::new(Provider::MusicBrainz, "b10bbbfc-cf9e-42e0-be17-e2c3e1d2600d")
        };

        let scored = score(&input, &candidate, &MatchConfig::default());

        assert_eq!(scored.score, 1.0);
        assert!(scored.identifier_match);
    }

    #[test]
    fn test_recording_code_matches_any_of_several() {
        let input = InputRecord {
            recording_code: Some("gb-aye-69-00531".to_string()),
            ..Default::default()
        };
        let candidate = CandidateRecord {
            recording_codes: vec!["USCA29900001".to_string(), "GBAYE6900531".to_string()],
            ..CandidateRecord::new(Provider::MusicBrainz, "rec")
        };

        let scored = score(&input, &candidate, &MatchConfig::default());

        assert!(scored.identifier_match);
        assert_eq!(scored.score, 1.0);
    }

    #[test]
    fn test_absent_fields_are_not_penalized() {
        let input = InputRecord {
            title: Some("Yesterday".to_string()),
            album: Some("Help!".to_string()),
            ..Default::default()
        };
        let candidate = CandidateRecord {
            title: Some("Yesterday".to_string()),
            ..CandidateRecord::new(Provider::Deezer, "1")
        };

        let scored = score(&input, &candidate, &MatchConfig::default());

        assert_eq!(scored.score, 1.0);
        assert_eq!(scored.breakdown.len(), 1);
    }

    #[test]
    fn test_nothing_comparable_scores_zero() {
        let input = InputRecord {
            title: Some("Yesterday".to_string()),
            ..Default::default()
        };
        let candidate = CandidateRecord {
            artist: Some("The Beatles".to_string()),
            ..CandidateRecord::new(Provider::Deezer, "1")
        };

        let scored = score(&input, &candidate, &MatchConfig::default());

        assert_eq!(scored.score, 0.0);
        assert!(scored.breakdown.is_empty());
    }

    #[test]
    fn test_mismatched_identifier_drags_score_down() {
        let input = InputRecord {
            title: Some("Yesterday".to_string()),
            recording_code: Some("GBAYE6500001".to_string()),
            ..Default::default()
        };
        let candidate = CandidateRecord {
            title: Some("Yesterday".to_string()),
            recording_codes: vec!["USXX10000001".to_string()],
            ..CandidateRecord::new(Provider::Deezer, "1")
        };

        let scored = score(&input, &candidate, &MatchConfig::default());

        // title weight 2 at 1.0, code weight 3 at 0.0
        assert!((scored.score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_text_similarity_tolerates_qualifiers_and_order() {
        let subset = text_similarity(Some("Let It Be"), Some("Let It Be (Remastered 2009)")).unwrap();
        assert!(subset >= 0.85 && subset < 1.0);

        let reordered = text_similarity(Some("Beatles, The"), Some("The Beatles")).unwrap();
        assert!(reordered >= 0.85);

        let unrelated = text_similarity(Some("Yesterday"), Some("Bohemian Rhapsody")).unwrap();
        assert!(unrelated < 0.5);

        assert_eq!(text_similarity(Some("Beyoncé"), Some("BEYONCE")), Some(1.0));
        assert_eq!(text_similarity(Some("!!!"), Some("Chk Chk Chk")), None);
        assert_eq!(text_similarity(None, Some("x")), None);
    }

    #[test]
    fn test_duration_decay() {
        let config = MatchConfig::default();
        assert_eq!(duration_similarity(Some(200.0), Some(202.0), &config), Some(1.0));
        assert_eq!(duration_similarity(Some(200.0), Some(210.0), &config), Some(0.0));
        assert_eq!(duration_similarity(Some(200.0), Some(206.0), &config), Some(0.5));
        assert_eq!(duration_similarity(Some(200.0), None, &config), None);
    }

    #[test]
    fn test_year_off_by_one() {
        let config = MatchConfig::default();
        assert_eq!(year_similarity(Some(1970), Some(1970), &config), Some(1.0));
        assert_eq!(year_similarity(Some(1970), Some(1971), &config), Some(0.5));
        assert_eq!(year_similarity(Some(1970), Some(1972), &config), Some(0.0));
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let candidate = CandidateRecord {
            artist: Some("Beatles".to_string()),
            title: Some("Let it be - remastered".to_string()),
            duration: Some(175.0),
            ..CandidateRecord::new(Provider::Deezer, "1")
        };
        let config = MatchConfig::default();

        let first = score(&let_it_be_album_track(), &candidate, &config);
        let second = score(&let_it_be_album_track(), &candidate, &config);

        assert_eq!(first, second);
    }
}
