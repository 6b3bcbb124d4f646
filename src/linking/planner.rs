//! Service selection: which providers to ask, and how.

use serde::Serialize;

use super::domain::{Capabilities, InputRecord, LinkError, Provider, QueryStrategy};
use super::policy::MatchConfig;
use super::traits::ProviderAdapter;

/// One step of a linking plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlannedQuery {
    pub provider: Provider,
    pub strategy: QueryStrategy,
}

/// Build the ordered query plan for `input`.
///
/// Tiers run strongest signal first: canonical-id lookups, then
/// recording-code lookups, then fuzzy searches. Within a tier providers
/// follow the configured priority. Duration, track number and release year
/// refine a search but cannot start one.
pub fn plan(
    input: &InputRecord,
    adapters: &[&dyn ProviderAdapter],
    config: &MatchConfig,
) -> Result<Vec<PlannedQuery>, LinkError> {
    let present = input.present_fields();
    if present.is_empty() {
        return Err(LinkError::InsufficientMetadata);
    }

    let mut ordered: Vec<&dyn ProviderAdapter> = adapters
        .iter()
        .copied()
        .filter(|a| config.is_enabled(a.provider()))
        .collect();
    ordered.sort_by_key(|a| config.rank(a.provider()));
    ordered.dedup_by_key(|a| a.provider());

    let tiers = [
        (QueryStrategy::CanonicalIdLookup, Capabilities::CANONICAL_ID),
        (QueryStrategy::RecordingCodeLookup, Capabilities::RECORDING_CODE),
        (QueryStrategy::FuzzySearch, Capabilities::SEARCH_KEYS),
    ];

    let mut planned = Vec::new();
    for (strategy, keys) in tiers {
        for adapter in &ordered {
            if adapter.capabilities().intersects(present & keys) {
                planned.push(PlannedQuery {
                    provider: adapter.provider(),
                    strategy,
                });
            }
        }
    }

    if planned.is_empty() {
        tracing::debug!("No provider can query by {:?}", present);
        return Err(LinkError::InsufficientMetadata);
    }

    Ok(planned)
}

/// Group a plan by provider, keeping each provider's strategies in plan
/// order. Providers appear in order of their first planned query.
pub fn by_provider(planned: &[PlannedQuery]) -> Vec<(Provider, Vec<QueryStrategy>)> {
    let mut groups: Vec<(Provider, Vec<QueryStrategy>)> = Vec::new();
    for query in planned {
        match groups.iter_mut().find(|(p, _)| *p == query.provider) {
            Some((_, strategies)) => strategies.push(query.strategy),
            None => groups.push((query.provider, vec![query.strategy])),
        }
    }
    groups
}
