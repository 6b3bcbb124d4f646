//! Merge per-provider winners into one unified record.

use std::collections::BTreeMap;

use super::domain::{
    CandidateRecord, InputRecord, Provider, ProviderLink, ProviderOutcome, Source, Sourced,
    UnifiedOutputRecord,
};
use super::normalize::normalize_code;
use super::policy::MatchConfig;

/// Build the unified record for `input` from every provider's outcome.
///
/// Descriptive fields come from the highest-priority winner that supplied
/// them, falling back to the input. Identifiers are additive: every winner
/// contributes a link and its recording codes. Never fails, and the same
/// outcomes always produce an equal record.
pub fn aggregate(
    input: &InputRecord,
    outcomes: &BTreeMap<Provider, ProviderOutcome>,
    config: &MatchConfig,
) -> UnifiedOutputRecord {
    let input = input.sanitized();

    let winners: Vec<(Provider, &CandidateRecord)> = config
        .priority()
        .into_iter()
        .filter_map(|p| {
            let outcome = outcomes.get(&p)?;
            outcome.selection.winner().map(|w| (p, &w.candidate))
        })
        .collect();

    let recording_code = first_supplied(
        &winners,
        |c| preferred_code(c, input.recording_code.as_deref()),
        input.recording_code.clone(),
    );

    let mut codes: Vec<String> = input
        .recording_code
        .iter()
        .chain(winners.iter().flat_map(|(_, c)| c.recording_codes.iter()))
        .map(|code| normalize_code(code))
        .filter(|code| !code.is_empty())
        .collect();
    codes.sort();
    codes.dedup();

    let links = winners
        .iter()
        .map(|(p, c)| {
            (
                *p,
                ProviderLink {
                    id: c.provider_id.clone(),
                    url: c.link.clone(),
                },
            )
        })
        .collect();

    let matches = outcomes
        .iter()
        .map(|(p, outcome)| (*p, outcome.summary()))
        .collect();

    UnifiedOutputRecord {
        artist: first_supplied(&winners, |c| c.artist.clone(), input.artist.clone()),
        album: first_supplied(&winners, |c| c.album.clone(), input.album.clone()),
        title: first_supplied(&winners, |c| c.title.clone(), input.title.clone()),
        track_number: first_supplied(&winners, |c| c.track_number, input.track_number),
        duration: first_supplied(&winners, |c| c.duration, input.duration),
        release_year: first_supplied(&winners, |c| c.release_year, input.release_year),
        canonical_id: first_supplied(&winners, |c| c.canonical_id.clone(), input.canonical_id.clone()),
        recording_code,
        bpm: first_supplied(&winners, |c| c.bpm, None),
        recording_codes: codes,
        links,
        matches,
    }
}

fn first_supplied<T>(
    winners: &[(Provider, &CandidateRecord)],
    field: impl Fn(&CandidateRecord) -> Option<T>,
    fallback: Option<T>,
) -> Option<Sourced<T>> {
    winners
        .iter()
        .find_map(|(p, c)| field(c).map(|v| Sourced::new(v, Source::Provider(*p))))
        .or_else(|| fallback.map(|v| Sourced::new(v, Source::Input)))
}

/// The candidate's code matching the input's, else its first code.
fn preferred_code(candidate: &CandidateRecord, input_code: Option<&str>) -> Option<String> {
    let wanted = input_code.map(normalize_code);
    candidate
        .recording_codes
        .iter()
        .find(|code| wanted.as_deref() == Some(normalize_code(code).as_str()))
        .or_else(|| candidate.recording_codes.first())
        .map(|code| normalize_code(code))
}
