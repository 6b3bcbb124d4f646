//! The provider adapter contract.
//!
//! The engine only ever talks to providers through [`ProviderAdapter`].
//! Production code registers the real HTTP adapters, while tests can
//! substitute the mock implementations in [`mocks`].
//!
//! # Example
//!
//! ```ignore
//! use music_linker::linking::traits::ProviderAdapter;
//!
//! struct MyCatalog { ... }
//!
//! #[async_trait]
//! impl ProviderAdapter for MyCatalog {
//!     fn provider(&self) -> Provider { ... }
//!     fn capabilities(&self) -> Capabilities { Capabilities::ARTIST | Capabilities::TITLE }
//!     async fn query(&self, strategy: QueryStrategy, input: &InputRecord)
//!         -> Result<Vec<CandidateRecord>, ProviderError> { ... }
//! }
//! ```

use async_trait::async_trait;

use super::domain::{Capabilities, CandidateRecord, InputRecord, Provider, ProviderError, QueryStrategy};

/// One external metadata service.
///
/// `query` distinguishes two outcomes the engine treats differently:
/// `Ok(vec![])` means the provider answered but found nothing, while
/// `Err(_)` means the provider could not be asked (network, auth, quota).
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Which provider this adapter speaks for.
    fn provider(&self) -> Provider;

    /// Input fields this provider can be queried by.
    ///
    /// Only identifiers and [`Capabilities::SEARCH_KEYS`] count for
    /// planning. Duration, track number and release year may refine a
    /// search inside `query`, but declaring them never makes a provider
    /// eligible on its own.
    fn capabilities(&self) -> Capabilities;

    /// Ask the provider for candidates using the given strategy.
    ///
    /// The engine only calls a strategy the planner derived from
    /// [`ProviderAdapter::capabilities`] and the fields present on `input`.
    async fn query(
        &self,
        strategy: QueryStrategy,
        input: &InputRecord,
    ) -> Result<Vec<CandidateRecord>, ProviderError>;
}

/// Mock adapters for testing the engine without a network.
#[cfg(test)]
pub mod mocks {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    /// Mock adapter that returns predefined results per strategy.
    pub struct MockProvider {
        pub provider: Provider,
        pub capabilities: Capabilities,
        /// Response per strategy; strategies without an entry return no candidates
        pub responses: HashMap<QueryStrategy, Result<Vec<CandidateRecord>, ProviderError>>,
        /// Sleep before answering, to exercise timeouts
        pub delay: Option<Duration>,
        /// Strategies queried so far, in call order
        pub calls: Mutex<Vec<QueryStrategy>>,
    }

    impl MockProvider {
        /// Create a mock that finds nothing for any strategy.
        pub fn new(provider: Provider, capabilities: Capabilities) -> Self {
            Self {
                provider,
                capabilities,
                responses: HashMap::new(),
                delay: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Answer `strategy` with these candidates.
        pub fn returning(mut self, strategy: QueryStrategy, candidates: Vec<CandidateRecord>) -> Self {
            self.responses.insert(strategy, Ok(candidates));
            self
        }

        /// Fail `strategy` with this error.
        pub fn failing(mut self, strategy: QueryStrategy, error: ProviderError) -> Self {
            self.responses.insert(strategy, Err(error));
            self
        }

        /// Delay every answer.
        pub fn delayed(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn calls(&self) -> Vec<QueryStrategy> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl ProviderAdapter for MockProvider {
        fn provider(&self) -> Provider {
            self.provider
        }

        fn capabilities(&self) -> Capabilities {
            self.capabilities
        }

        async fn query(
            &self,
            strategy: QueryStrategy,
            _input: &InputRecord,
        ) -> Result<Vec<CandidateRecord>, ProviderError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(strategy);
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.responses
                .get(&strategy)
                .cloned()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_no_matches() {
            let mock = MockProvider::new(Provider::Deezer, Capabilities::TITLE);
            let results = mock
                .query(QueryStrategy::FuzzySearch, &InputRecord::default())
                .await
                .unwrap();
            assert!(results.is_empty());
            assert_eq!(mock.calls(), vec![QueryStrategy::FuzzySearch]);
        }

        #[tokio::test]
        async fn test_mock_error() {
            let mock = MockProvider::new(Provider::Deezer, Capabilities::TITLE)
                .failing(QueryStrategy::FuzzySearch, ProviderError::Network("timeout".to_string()));
            let result = mock
                .query(QueryStrategy::FuzzySearch, &InputRecord::default())
                .await;
            assert!(matches!(result, Err(ProviderError::Network(_))));
        }

        #[tokio::test]
        async fn test_mock_returns_per_strategy() {
            let mock = MockProvider::new(Provider::MusicBrainz, Capabilities::all()).returning(
                QueryStrategy::CanonicalIdLookup,
                vec![CandidateRecord::new(Provider::MusicBrainz, "rec-1")],
            );

            let direct = mock
                .query(QueryStrategy::CanonicalIdLookup, &InputRecord::default())
                .await
                .unwrap();
            let fuzzy = mock
                .query(QueryStrategy::FuzzySearch, &InputRecord::default())
                .await
                .unwrap();

            assert_eq!(direct.len(), 1);
            assert!(fuzzy.is_empty());
        }
    }
}
