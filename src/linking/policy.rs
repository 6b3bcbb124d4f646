//! Matching policy: thresholds, weights, provider priority and timeouts.
//!
//! A [`MatchConfig`] is passed explicitly into every engine call; there is no
//! process-wide matching state. The numbers below are defaults, not law -
//! every one of them can be overridden from `config.toml`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::domain::{FieldKind, LinkError, Provider};

/// Relative importance of each comparable field in the weighted mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub canonical_id: f64,
    pub recording_code: f64,
    pub title: f64,
    pub artist: f64,
    pub album: f64,
    pub duration: f64,
    pub track_number: f64,
    pub release_year: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            canonical_id: 3.0,
            recording_code: 3.0,
            title: 2.0,
            artist: 2.0,
            album: 1.0,
            duration: 0.5,
            track_number: 0.5,
            release_year: 0.5,
        }
    }
}

impl FieldWeights {
    pub fn weight(&self, field: FieldKind) -> f64 {
        match field {
            FieldKind::CanonicalId => self.canonical_id,
            FieldKind::RecordingCode => self.recording_code,
            FieldKind::Title => self.title,
            FieldKind::Artist => self.artist,
            FieldKind::Album => self.album,
            FieldKind::Duration => self.duration,
            FieldKind::TrackNumber => self.track_number,
            FieldKind::ReleaseYear => self.release_year,
        }
    }

    fn all(&self) -> [f64; 8] {
        [
            self.canonical_id,
            self.recording_code,
            self.title,
            self.artist,
            self.album,
            self.duration,
            self.track_number,
            self.release_year,
        ]
    }
}

/// Everything the engine needs besides the input record.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Strict mode: minimum score of the top candidate
    pub strict_threshold: f64,
    /// Strict mode: minimum lead of the top candidate over the runner-up
    pub strict_margin: f64,
    /// Lenient mode: the top candidate must score above this
    pub lenient_threshold: f64,
    /// Duration differences up to this many seconds score 1.0
    pub duration_tolerance_secs: f64,
    /// Duration differences at or past this many seconds score 0.0
    pub duration_window_secs: f64,
    /// Score for a release year that is off by one
    pub year_off_by_one_score: f64,
    pub weights: FieldWeights,
    /// Descriptive fields are taken from the first winning provider in this order
    pub provider_priority: Vec<Provider>,
    /// Providers left out of planning entirely
    pub disabled_providers: Vec<Provider>,
    /// Timeout for each adapter query
    pub provider_timeout: Duration,
    /// Deadline for the whole request; pending providers are cancelled
    pub overall_timeout: Option<Duration>,
    /// Re-plan unmatched providers with identifiers discovered by the first pass
    pub follow_identifiers: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            strict_threshold: 0.85,
            strict_margin: 0.05,
            lenient_threshold: 0.5,
            duration_tolerance_secs: 2.0,
            duration_window_secs: 10.0,
            year_off_by_one_score: 0.5,
            weights: FieldWeights::default(),
            provider_priority: Provider::ALL.to_vec(),
            disabled_providers: Vec::new(),
            provider_timeout: Duration::from_secs(10),
            overall_timeout: None,
            follow_identifiers: true,
        }
    }
}

impl MatchConfig {
    /// Reject configurations that would make scores or selection meaningless.
    pub fn validate(&self) -> Result<(), LinkError> {
        let unit = [
            ("strict_threshold", self.strict_threshold),
            ("strict_margin", self.strict_margin),
            ("lenient_threshold", self.lenient_threshold),
            ("year_off_by_one_score", self.year_off_by_one_score),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(LinkError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if !(self.duration_tolerance_secs >= 0.0
            && self.duration_window_secs > self.duration_tolerance_secs)
        {
            return Err(LinkError::InvalidConfig(format!(
                "duration window ({}s) must exceed tolerance ({}s)",
                self.duration_window_secs, self.duration_tolerance_secs
            )));
        }

        if self.weights.all().iter().any(|w| !(w.is_finite() && *w >= 0.0)) {
            return Err(LinkError::InvalidConfig(
                "field weights must be finite and non-negative".to_string(),
            ));
        }

        if self.provider_timeout.is_zero() {
            return Err(LinkError::InvalidConfig(
                "provider timeout must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Full priority order: configured providers first, then any remaining
    /// provider in declaration order.
    pub fn priority(&self) -> Vec<Provider> {
        let mut order: Vec<Provider> = Vec::with_capacity(Provider::ALL.len());
        for provider in self.provider_priority.iter().chain(Provider::ALL.iter()) {
            if !order.contains(provider) {
                order.push(*provider);
            }
        }
        order
    }

    /// Position of a provider in [`MatchConfig::priority`]; lower wins.
    pub fn rank(&self, provider: Provider) -> usize {
        self.priority()
            .iter()
            .position(|p| *p == provider)
            .unwrap_or(usize::MAX)
    }

    pub fn is_enabled(&self, provider: Provider) -> bool {
        !self.disabled_providers.contains(&provider)
    }
}
