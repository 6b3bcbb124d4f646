//! Match selection: the precision/recall knob.
//!
//! Strict mode demands a high score AND a clear lead over the runner-up, so
//! near-ties become "no match". Lenient mode accepts the best candidate once
//! it clears a lower bar.

use std::cmp::Ordering;

use super::domain::{NoMatchReason, ScoredCandidate, Selection, Strictness};
use super::policy::MatchConfig;

/// Slack for comparing derived scores against configured bounds, so that
/// e.g. `0.85 - 0.80` counts as a lead of exactly 0.05.
const SCORE_EPSILON: f64 = 1e-9;

/// Pick the winner among one provider's scored candidates, or conclude no match.
pub fn select(
    mut candidates: Vec<ScoredCandidate>,
    strictness: Strictness,
    config: &MatchConfig,
) -> Selection {
    // Stable sort keeps provider order for exact ties without popularity
    candidates.sort_by(rank);

    let mut ranked = candidates.into_iter();
    let Some(top) = ranked.next() else {
        return Selection::NoMatch(NoMatchReason::NoCandidates);
    };
    let runner_up = ranked.next().map(|c| c.score);

    match strictness {
        Strictness::Strict => {
            if top.score + SCORE_EPSILON < config.strict_threshold {
                return Selection::NoMatch(NoMatchReason::BelowThreshold { best: top.score });
            }
            if let Some(second) = runner_up
                && !top.identifier_match
                && top.score - second + SCORE_EPSILON < config.strict_margin
            {
                return Selection::NoMatch(NoMatchReason::Ambiguous {
                    best: top.score,
                    runner_up: second,
                });
            }
            Selection::Winner(top)
        }
        Strictness::Lenient => {
            if top.score > config.lenient_threshold {
                Selection::Winner(top)
            } else {
                Selection::NoMatch(NoMatchReason::BelowThreshold { best: top.score })
            }
        }
    }
}

/// Score descending, then provider-declared popularity descending
/// (candidates with popularity before those without).
fn rank(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| {
        match (a.candidate.popularity, b.candidate.popularity) {
            (Some(pa), Some(pb)) => pb.total_cmp(&pa),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    })
}
