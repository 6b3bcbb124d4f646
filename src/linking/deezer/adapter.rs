//! Adapter layer: Deezer DTOs to domain candidates, domain input to Deezer
//! search syntax.

use super::dto;
use crate::linking::domain::{CandidateRecord, InputRecord, Provider};

/// Convert a Deezer track into a candidate.
pub fn to_candidate(track: dto::Track) -> CandidateRecord {
    let link = track
        .link
        .clone()
        .unwrap_or_else(|| format!("https://www.deezer.com/track/{}", track.id));
    let release_date = track
        .release_date
        .as_deref()
        .or_else(|| track.album.as_ref().and_then(|a| a.release_date.as_deref()));

    CandidateRecord {
        artist: track.artist.as_ref().map(|a| a.name.clone()),
        album: track.album.as_ref().map(|a| a.title.clone()),
        title: Some(track.title),
        track_number: track.track_position,
        duration: track.duration.filter(|d| *d > 0).map(f64::from),
        release_year: release_date
            .and_then(|d| d.split('-').next())
            .and_then(|y| y.parse().ok()),
        recording_codes: track.isrc.into_iter().collect(),
        link: Some(link),
        popularity: track.rank.map(|r| r as f64),
        // Deezer reports 0 when the tempo is unknown
        bpm: track.bpm.filter(|b| *b > 0.0),
        ..CandidateRecord::new(Provider::Deezer, track.id.to_string())
    }
}

/// Build an advanced search query (`artist:"…" track:"…" album:"…"`).
pub fn search_query(input: &InputRecord) -> Option<String> {
    let fields = [
        ("artist", &input.artist),
        ("track", &input.title),
        ("album", &input.album),
    ];

    let terms: Vec<String> = fields
        .into_iter()
        .filter_map(|(key, value)| {
            let value = value.as_deref()?.replace('"', " ");
            let value = value.trim();
            (!value.is_empty()).then(|| format!("{key}:\"{value}\""))
        })
        .collect();

    (!terms.is_empty()).then(|| terms.join(" "))
}
