//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\music-linker\config.toml
//! - macOS: ~/Library/Application Support/music-linker/config.toml
//! - Linux: ~/.config/music-linker/config.toml
//!
//! The config file is human-readable and editable. Every key is optional;
//! anything left out falls back to the defaults shown by
//! `music-linker config --defaults`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::linking::{FieldWeights, MatchConfig, Provider, ProviderSettings, musicbrainz, deezer, acousticbrainz};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Thresholds and matching behaviour
    pub matching: MatchingConfig,

    /// Relative weight of each field when scoring candidates
    pub weights: FieldWeights,

    /// Which providers to use and how to reach them
    pub providers: ProvidersConfig,
}

/// Matching thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Default strictness when a request doesn't say
    pub strict: bool,

    /// Strict mode: minimum score of the winner (0.0 - 1.0)
    pub strict_threshold: f64,

    /// Strict mode: minimum lead over the runner-up
    pub strict_margin: f64,

    /// Lenient mode: the winner must score above this
    pub lenient_threshold: f64,

    /// Durations this close (seconds) count as equal
    pub duration_tolerance_secs: f64,

    /// Durations this far apart (seconds) don't match at all
    pub duration_window_secs: f64,

    /// Score for a release year that is off by one
    pub year_off_by_one_score: f64,

    /// Re-query unmatched providers with identifiers other providers found
    pub follow_identifiers: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        let defaults = MatchConfig::default();
        Self {
            strict: false,
            strict_threshold: defaults.strict_threshold,
            strict_margin: defaults.strict_margin,
            lenient_threshold: defaults.lenient_threshold,
            duration_tolerance_secs: defaults.duration_tolerance_secs,
            duration_window_secs: defaults.duration_window_secs,
            year_off_by_one_score: defaults.year_off_by_one_score,
            follow_identifiers: defaults.follow_identifiers,
        }
    }
}

/// Provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Order in which winners supply descriptive fields
    pub priority: Vec<Provider>,

    /// Providers never queried
    pub disabled: Vec<Provider>,

    /// Timeout per provider query, in seconds
    pub timeout_secs: f64,

    /// Deadline for a whole linking request, in seconds (unset = none)
    pub overall_timeout_secs: Option<f64>,

    /// Maximum search hits scored per provider
    pub search_limit: u32,

    /// Contact URL or e-mail sent in the User-Agent (MusicBrainz asks for one)
    pub contact: Option<String>,

    /// Minimum spacing between MusicBrainz requests, in milliseconds
    pub musicbrainz_interval_ms: u64,

    pub musicbrainz_url: String,
    pub deezer_url: String,
    pub acousticbrainz_url: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            priority: Provider::ALL.to_vec(),
            disabled: Vec::new(),
            timeout_secs: 10.0,
            overall_timeout_secs: None,
            search_limit: 10,
            contact: None,
            musicbrainz_interval_ms: 1000,
            musicbrainz_url: musicbrainz::DEFAULT_BASE_URL.to_string(),
            deezer_url: deezer::DEFAULT_BASE_URL.to_string(),
            acousticbrainz_url: acousticbrainz::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// The engine's view of this configuration.
    ///
    /// Values are passed through unchecked; `MatchConfig::validate` reports
    /// anything out of range when a request is made.
    pub fn match_config(&self) -> MatchConfig {
        let m = &self.matching;
        let p = &self.providers;
        MatchConfig {
            strict_threshold: m.strict_threshold,
            strict_margin: m.strict_margin,
            lenient_threshold: m.lenient_threshold,
            duration_tolerance_secs: m.duration_tolerance_secs,
            duration_window_secs: m.duration_window_secs,
            year_off_by_one_score: m.year_off_by_one_score,
            weights: self.weights.clone(),
            provider_priority: p.priority.clone(),
            disabled_providers: p.disabled.clone(),
            provider_timeout: secs(p.timeout_secs),
            overall_timeout: p.overall_timeout_secs.map(secs),
            follow_identifiers: m.follow_identifiers,
        }
    }

    /// Settings for the built-in provider clients
    pub fn provider_settings(&self) -> ProviderSettings {
        let p = &self.providers;
        ProviderSettings {
            contact: p.contact.clone(),
            request_timeout: secs(p.timeout_secs),
            search_limit: p.search_limit,
            musicbrainz_url: p.musicbrainz_url.clone(),
            musicbrainz_min_interval: Duration::from_millis(p.musicbrainz_interval_ms),
            deezer_url: p.deezer_url.clone(),
            acousticbrainz_url: p.acousticbrainz_url.clone(),
        }
    }
}

/// Negative or non-finite values become zero, which validation rejects
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("music-linker"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from a specific file, with the same fallbacks as [`load`]
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to the default location
///
/// Creates the config directory if it doesn't exist.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &path)
}

/// Save configuration to a specific file
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    // Serialize to pretty TOML
    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================
