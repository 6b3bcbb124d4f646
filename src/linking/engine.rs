//! Link engine - orchestrates one linking request
//!
//! 1. Sanitize the input and plan queries per provider
//! 2. Query planned providers concurrently; each runs its strategies in
//!    plan order and stops at the first winner
//! 3. Optionally chase identifiers found by winners into providers that
//!    did not match
//! 4. Aggregate every provider's outcome into one record

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::Instant;

use super::acousticbrainz::{self, AcousticBrainzClient};
use super::aggregator::aggregate;
use super::deezer::{self, DeezerClient};
use super::domain::{
    InputRecord, LinkError, NoMatchReason, Provider, ProviderError, ProviderOutcome,
    QueryStrategy, Selection, UnifiedOutputRecord,
};
use super::http;
use super::musicbrainz::{self, MusicBrainzClient};
use super::planner::{by_provider, plan};
use super::policy::MatchConfig;
use super::scorer::score_all;
use super::selector::select;
use super::traits::ProviderAdapter;

/// How the built-in provider clients are constructed
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Contact (URL or e-mail) appended to the user agent, as MusicBrainz asks
    pub contact: Option<String>,
    /// HTTP-level timeout for a single request
    pub request_timeout: Duration,
    /// Maximum search hits scored per provider
    pub search_limit: u32,
    pub musicbrainz_url: String,
    /// Minimum spacing between MusicBrainz requests
    pub musicbrainz_min_interval: Duration,
    pub deezer_url: String,
    pub acousticbrainz_url: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            contact: None,
            request_timeout: Duration::from_secs(10),
            search_limit: 10,
            musicbrainz_url: musicbrainz::DEFAULT_BASE_URL.to_string(),
            musicbrainz_min_interval: Duration::from_secs(1),
            deezer_url: deezer::DEFAULT_BASE_URL.to_string(),
            acousticbrainz_url: acousticbrainz::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Entry point for linking tracks against the registered providers
pub struct LinkEngine {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
}

impl LinkEngine {
    /// Create an engine over an explicit set of adapters
    pub fn new(adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        Self { adapters }
    }

    /// Create an engine with the built-in MusicBrainz, Deezer and
    /// AcousticBrainz clients sharing one HTTP client
    pub fn with_defaults(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let user_agent = http::user_agent(settings.contact.as_deref());
        let http_client = http::build_client(&user_agent, settings.request_timeout)?;

        let musicbrainz = MusicBrainzClient::with_base_url(http_client.clone(), &settings.musicbrainz_url)
            .with_search_limit(settings.search_limit)
            .with_min_interval(settings.musicbrainz_min_interval);
        let deezer = DeezerClient::with_base_url(http_client.clone(), &settings.deezer_url)
            .with_search_limit(settings.search_limit);
        let acousticbrainz = AcousticBrainzClient::with_base_url(http_client, &settings.acousticbrainz_url);

        Ok(Self::new(vec![
            Arc::new(musicbrainz),
            Arc::new(deezer),
            Arc::new(acousticbrainz),
        ]))
    }

    /// Providers this engine can query
    pub fn providers(&self) -> Vec<Provider> {
        self.adapters.iter().map(|a| a.provider()).collect()
    }

    /// Link one track.
    ///
    /// Fails only when the configuration is invalid or the input carries
    /// nothing any provider can be queried by. Provider failures, timeouts
    /// and rejected candidates show up as per-provider no-match outcomes in
    /// the returned record.
    pub async fn link(
        &self,
        input: &InputRecord,
        config: &MatchConfig,
    ) -> Result<UnifiedOutputRecord, LinkError> {
        config.validate()?;

        let input = input.sanitized();
        let adapters: Vec<&dyn ProviderAdapter> = self.adapters.iter().map(|a| a.as_ref()).collect();
        let planned = plan(&input, &adapters, config)?;
        tracing::debug!("Planned {} queries: {:?}", planned.len(), planned);

        let deadline = config.overall_timeout.map(|t| Instant::now() + t);
        let mut outcomes = self.run_pass(&input, &by_provider(&planned), config, deadline).await;

        if config.follow_identifiers
            && let Some(chased) = chase_input(&input, &outcomes, config)
        {
            let planned = plan(&chased, &adapters, config)?;
            let retry: Vec<_> = by_provider(&planned)
                .into_iter()
                .filter(|(p, _)| !outcomes.get(p).is_some_and(|o| o.selection.is_winner()))
                .map(|(p, strategies)| {
                    let new: Vec<QueryStrategy> = strategies
                        .into_iter()
                        .filter(|s| newly_possible(*s, &input, &chased))
                        .collect();
                    (p, new)
                })
                .filter(|(_, strategies)| !strategies.is_empty())
                .collect();

            if !retry.is_empty() {
                tracing::debug!("Chasing discovered identifiers into {} providers", retry.len());
                let chased_outcomes = self.run_pass(&chased, &retry, config, deadline).await;
                for (provider, outcome) in chased_outcomes {
                    let previous = outcomes.get(&provider);
                    if outcome.selection.is_winner() || previous.is_none() {
                        outcomes.insert(provider, outcome);
                    }
                }
            }
        }

        Ok(aggregate(&input, &outcomes, config))
    }

    /// Query every group concurrently and collect one outcome per provider.
    ///
    /// Providers still running at `deadline` are cancelled and recorded as
    /// timed out.
    async fn run_pass(
        &self,
        input: &InputRecord,
        groups: &[(Provider, Vec<QueryStrategy>)],
        config: &MatchConfig,
        deadline: Option<Instant>,
    ) -> BTreeMap<Provider, ProviderOutcome> {
        let mut pending: FuturesUnordered<_> = groups
            .iter()
            .filter_map(|(provider, strategies)| {
                let adapter = self.adapter(*provider)?;
                Some(async move { (*provider, run_provider(adapter, strategies, input, config).await) })
            })
            .collect();

        let mut outcomes = BTreeMap::new();
        loop {
            let next = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, pending.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        tracing::warn!("Overall deadline reached with {} providers pending", pending.len());
                        break;
                    }
                },
                None => pending.next().await,
            };
            let Some((provider, outcome)) = next else {
                break;
            };
            outcomes.insert(provider, outcome);
        }
        drop(pending);

        for (provider, _) in groups {
            outcomes
                .entry(*provider)
                .or_insert_with(|| ProviderOutcome::no_match(NoMatchReason::TimedOut));
        }
        outcomes
    }

    fn adapter(&self, provider: Provider) -> Option<&dyn ProviderAdapter> {
        self.adapters
            .iter()
            .find(|a| a.provider() == provider)
            .map(|a| a.as_ref())
    }
}

/// Run one provider's strategies in order until one produces a winner.
async fn run_provider(
    adapter: &dyn ProviderAdapter,
    strategies: &[QueryStrategy],
    input: &InputRecord,
    config: &MatchConfig,
) -> ProviderOutcome {
    let provider = adapter.provider();
    let mut outcome = ProviderOutcome::no_match(NoMatchReason::NoCandidates);

    for &strategy in strategies {
        let query = adapter.query(strategy, input);
        let reason = match tokio::time::timeout(config.provider_timeout, query).await {
            Err(_) => {
                tracing::warn!(
                    "{} {:?} timed out after {:?}",
                    provider,
                    strategy,
                    config.provider_timeout
                );
                NoMatchReason::TimedOut
            }
            Ok(Err(e)) => {
                tracing::warn!("{} {:?} failed: {}", provider, strategy, e);
                NoMatchReason::Unavailable {
                    message: e.to_string(),
                }
            }
            Ok(Ok(candidates)) if candidates.is_empty() => {
                tracing::debug!("{} {:?} returned no candidates", provider, strategy);
                NoMatchReason::NoCandidates
            }
            Ok(Ok(candidates)) => {
                let scored = score_all(input, &candidates, config);
                match select(scored, input.strictness(), config) {
                    Selection::Winner(winner) => {
                        tracing::info!(
                            "{} matched {} via {:?} (score {:.2})",
                            provider,
                            winner.candidate.provider_id,
                            strategy,
                            winner.score
                        );
                        return ProviderOutcome {
                            selection: Selection::Winner(winner),
                            strategy: Some(strategy),
                        };
                    }
                    Selection::NoMatch(reason) => {
                        tracing::debug!("{} {:?}: {}", provider, strategy, reason);
                        reason
                    }
                }
            }
        };

        // An empty answer says less than an earlier rejection or failure
        if !(matches!(reason, NoMatchReason::NoCandidates) && outcome.strategy.is_some()) {
            outcome = ProviderOutcome {
                selection: Selection::NoMatch(reason),
                strategy: Some(strategy),
            };
        }
    }

    outcome
}

/// The input extended with identifiers the winners discovered, or `None`
/// when nothing new was found.
fn chase_input(
    input: &InputRecord,
    outcomes: &BTreeMap<Provider, ProviderOutcome>,
    config: &MatchConfig,
) -> Option<InputRecord> {
    let winners: Vec<_> = config
        .priority()
        .into_iter()
        .filter_map(|p| outcomes.get(&p)?.selection.winner().map(|w| &w.candidate))
        .collect();

    let canonical_id = input
        .canonical_id
        .clone()
        .or_else(|| winners.iter().find_map(|c| c.canonical_id.clone()));
    let recording_code = input
        .recording_code
        .clone()
        .or_else(|| winners.iter().find_map(|c| c.recording_codes.first().cloned()));

    if canonical_id == input.canonical_id && recording_code == input.recording_code {
        return None;
    }

    Some(InputRecord {
        canonical_id,
        recording_code,
        ..input.clone()
    })
}

/// Whether `strategy` only became possible through chased identifiers.
fn newly_possible(strategy: QueryStrategy, before: &InputRecord, after: &InputRecord) -> bool {
    match strategy {
        QueryStrategy::CanonicalIdLookup => before.canonical_id.is_none() && after.canonical_id.is_some(),
        QueryStrategy::RecordingCodeLookup => {
            before.recording_code.is_none() && after.recording_code.is_some()
        }
        QueryStrategy::FuzzySearch => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{LET_IT_BE_ISRC, let_it_be_input, mock_candidate};
    use crate::linking::domain::{Capabilities, CandidateRecord, MatchSummary, Source};
    use crate::linking::traits::mocks::MockProvider;

    const MBID: &str = "c7ba4ac4-1a35-4bc4-a4b3-0e6dd0a4e1c4";
    const ISRC: &str = LET_IT_BE_ISRC;

    fn engine(mocks: &[Arc<MockProvider>]) -> LinkEngine {
        LinkEngine::new(
            mocks
                .iter()
                .map(|m| Arc::clone(m) as Arc<dyn ProviderAdapter>)
                .collect(),
        )
    }

    fn deezer_let_it_be() -> CandidateRecord {
        CandidateRecord {
            artist: Some("The Beatles".to_string()),
            title: Some("Let It Be (Remastered 2009)".to_string()),
            duration: Some(243.0),
            recording_codes: vec![ISRC.to_string()],
            link: Some("https://www.deezer.com/track/116348128".to_string()),
            ..CandidateRecord::new(Provider::Deezer, "116348128")
        }
    }

    fn musicbrainz_let_it_be() -> CandidateRecord {
        CandidateRecord {
            duration: Some(243.026),
            canonical_id: Some(MBID.to_string()),
            recording_codes: vec![ISRC.to_string()],
            ..mock_candidate(Provider::MusicBrainz, MBID)
        }
    }

    fn deezer_mock() -> MockProvider {
        MockProvider::new(Provider::Deezer, Capabilities::RECORDING_CODE | Capabilities::SEARCH_KEYS)
    }

    fn musicbrainz_mock() -> MockProvider {
        MockProvider::new(Provider::MusicBrainz, Capabilities::all())
    }

    fn acousticbrainz_mock() -> MockProvider {
        MockProvider::new(Provider::AcousticBrainz, Capabilities::CANONICAL_ID)
    }

    #[tokio::test]
    async fn test_empty_input_fails_fast() {
        let deezer = Arc::new(deezer_mock());
        let result = engine(&[deezer.clone()])
            .link(&InputRecord::default(), &MatchConfig::default())
            .await;

        assert!(matches!(result, Err(LinkError::InsufficientMetadata)));
        assert!(deezer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = MatchConfig {
            lenient_threshold: -0.1,
            ..Default::default()
        };
        let result = engine(&[Arc::new(deezer_mock())]).link(&let_it_be_input(), &config).await;

        assert!(matches!(result, Err(LinkError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_lenient_fuzzy_match_links_provider() {
        let deezer = Arc::new(deezer_mock().returning(QueryStrategy::FuzzySearch, vec![deezer_let_it_be()]));

        let record = engine(&[deezer])
            .link(&let_it_be_input(), &MatchConfig::default())
            .await
            .unwrap();

        assert_eq!(record.links[&Provider::Deezer].id, "116348128");
        assert_eq!(record.recording_codes, vec![ISRC]);
        assert!(matches!(
            record.matches[&Provider::Deezer],
            MatchSummary::Matched { strategy: Some(QueryStrategy::FuzzySearch), .. }
        ));
    }

    #[tokio::test]
    async fn test_canonical_id_only_strict() {
        let musicbrainz = Arc::new(musicbrainz_mock().returning(
            QueryStrategy::CanonicalIdLookup,
            vec![CandidateRecord {
                recording_codes: Vec::new(),
                ..musicbrainz_let_it_be()
            }],
        ));
        let deezer = Arc::new(deezer_mock());
        let input = InputRecord {
            canonical_id: Some(MBID.to_string()),
            strict: true,
            ..Default::default()
        };

        let record = engine(&[musicbrainz.clone(), deezer.clone()])
            .link(&input, &MatchConfig::default())
            .await
            .unwrap();

        assert_eq!(musicbrainz.calls(), vec![QueryStrategy::CanonicalIdLookup]);
        assert!(deezer.calls().is_empty());
        assert!(!record.matches.contains_key(&Provider::Deezer));
        assert_eq!(record.links[&Provider::MusicBrainz].id, MBID);
        assert_eq!(
            record.title.as_ref().map(|t| t.source),
            Some(Source::Provider(Provider::MusicBrainz))
        );
    }

    #[tokio::test]
    async fn test_first_winning_strategy_stops_provider() {
        let musicbrainz = Arc::new(
            musicbrainz_mock()
                .returning(QueryStrategy::RecordingCodeLookup, vec![musicbrainz_let_it_be()])
                .returning(QueryStrategy::FuzzySearch, vec![musicbrainz_let_it_be()]),
        );
        let input = InputRecord {
            recording_code: Some(ISRC.to_string()),
            ..let_it_be_input()
        };
        let config = MatchConfig {
            follow_identifiers: false,
            ..Default::default()
        };

        engine(&[musicbrainz.clone()]).link(&input, &config).await.unwrap();

        assert_eq!(musicbrainz.calls(), vec![QueryStrategy::RecordingCodeLookup]);
    }

    #[tokio::test]
    async fn test_falls_back_to_fuzzy_when_lookup_finds_nothing() {
        let search_hit = CandidateRecord {
            recording_codes: Vec::new(),
            ..deezer_let_it_be()
        };
        let deezer = Arc::new(deezer_mock().returning(QueryStrategy::FuzzySearch, vec![search_hit]));
        let input = InputRecord {
            recording_code: Some("USXXX0000001".to_string()),
            ..let_it_be_input()
        };

        let record = engine(&[deezer.clone()])
            .link(&input, &MatchConfig::default())
            .await
            .unwrap();

        assert_eq!(
            deezer.calls(),
            vec![QueryStrategy::RecordingCodeLookup, QueryStrategy::FuzzySearch]
        );
        assert!(record.links.contains_key(&Provider::Deezer));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_provider_is_no_match() {
        let musicbrainz = Arc::new(musicbrainz_mock().returning(QueryStrategy::FuzzySearch, vec![musicbrainz_let_it_be()]));
        let deezer = Arc::new(
            deezer_mock()
                .returning(QueryStrategy::FuzzySearch, vec![deezer_let_it_be()])
                .delayed(Duration::from_secs(5)),
        );
        let config = MatchConfig {
            provider_timeout: Duration::from_millis(100),
            follow_identifiers: false,
            ..Default::default()
        };

        let record = engine(&[musicbrainz, deezer]).link(&let_it_be_input(), &config).await.unwrap();

        assert_eq!(
            record.matches[&Provider::Deezer],
            MatchSummary::NoMatch(NoMatchReason::TimedOut)
        );
        assert!(record.links.contains_key(&Provider::MusicBrainz));
        assert!(!record.links.contains_key(&Provider::Deezer));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overall_deadline_keeps_finished_providers() {
        let musicbrainz = Arc::new(musicbrainz_mock().returning(QueryStrategy::FuzzySearch, vec![musicbrainz_let_it_be()]));
        let deezer = Arc::new(
            deezer_mock()
                .returning(QueryStrategy::FuzzySearch, vec![deezer_let_it_be()])
                .delayed(Duration::from_secs(5)),
        );
        let config = MatchConfig {
            overall_timeout: Some(Duration::from_millis(500)),
            follow_identifiers: false,
            ..Default::default()
        };

        let record = engine(&[musicbrainz, deezer]).link(&let_it_be_input(), &config).await.unwrap();

        assert_eq!(
            record.matches[&Provider::Deezer],
            MatchSummary::NoMatch(NoMatchReason::TimedOut)
        );
        assert_eq!(record.links[&Provider::MusicBrainz].id, MBID);
    }

    #[tokio::test]
    async fn test_provider_failure_is_not_fatal() {
        let musicbrainz = Arc::new(musicbrainz_mock().returning(QueryStrategy::FuzzySearch, vec![musicbrainz_let_it_be()]));
        let deezer = Arc::new(deezer_mock().failing(QueryStrategy::FuzzySearch, ProviderError::RateLimited));
        let config = MatchConfig {
            follow_identifiers: false,
            ..Default::default()
        };

        let record = engine(&[musicbrainz, deezer]).link(&let_it_be_input(), &config).await.unwrap();

        assert!(matches!(
            record.matches[&Provider::Deezer],
            MatchSummary::NoMatch(NoMatchReason::Unavailable { .. })
        ));
        assert!(record.is_linked());
    }

    #[tokio::test]
    async fn test_identifier_chasing_links_remaining_providers() {
        let musicbrainz = Arc::new(musicbrainz_mock().returning(QueryStrategy::FuzzySearch, vec![musicbrainz_let_it_be()]));
        let deezer = Arc::new(deezer_mock().returning(QueryStrategy::RecordingCodeLookup, vec![deezer_let_it_be()]));
        let acousticbrainz = Arc::new(acousticbrainz_mock().returning(
            QueryStrategy::CanonicalIdLookup,
            vec![CandidateRecord {
                canonical_id: Some(MBID.to_string()),
                link: Some(format!("https://acousticbrainz.org/{MBID}")),
                ..CandidateRecord::new(Provider::AcousticBrainz, MBID)
            }],
        ));

        let record = engine(&[musicbrainz, deezer.clone(), acousticbrainz.clone()])
            .link(&let_it_be_input(), &MatchConfig::default())
            .await
            .unwrap();

        assert_eq!(
            deezer.calls(),
            vec![QueryStrategy::FuzzySearch, QueryStrategy::RecordingCodeLookup]
        );
        assert_eq!(acousticbrainz.calls(), vec![QueryStrategy::CanonicalIdLookup]);
        assert_eq!(record.links.len(), 3);
        assert_eq!(
            record.canonical_id.as_ref().map(|c| c.value.as_str()),
            Some(MBID)
        );
    }

    #[tokio::test]
    async fn test_identifier_chasing_can_be_disabled() {
        let musicbrainz = Arc::new(musicbrainz_mock().returning(QueryStrategy::FuzzySearch, vec![musicbrainz_let_it_be()]));
        let acousticbrainz = Arc::new(acousticbrainz_mock());
        let config = MatchConfig {
            follow_identifiers: false,
            ..Default::default()
        };

        let record = engine(&[musicbrainz, acousticbrainz.clone()])
            .link(&let_it_be_input(), &config)
            .await
            .unwrap();

        assert!(acousticbrainz.calls().is_empty());
        assert_eq!(record.links.len(), 1);
    }

    #[test]
    fn test_default_engine_registers_all_providers() {
        let engine = LinkEngine::with_defaults(&ProviderSettings::default()).unwrap();
        assert_eq!(engine.providers(), Provider::ALL.to_vec());
    }
}
