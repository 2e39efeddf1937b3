//! Tournament configuration

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Default number of items per n-wise batch
pub const DEFAULT_BATCH_SIZE: usize = 4;

/// Default number of rounds when none is configured
pub const DEFAULT_ROUNDS: u32 = 3;

/// Model identifier handed to the judge when none is configured
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash-preview-05-20";

/// Errors raised while loading or validating a configuration.
///
/// All of these are fatal and are reported before any round runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown algorithm '{0}' (expected pairwise, nwise or elo)")]
    UnknownAlgorithm(String),

    #[error("rounds must be at least 1")]
    InvalidRounds,

    #[error("elimination rate {0} is outside (0, 1]")]
    InvalidEliminationRate(f64),

    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    #[error("model identifier must not be empty")]
    EmptyModel,

    #[error("invalid tournament id '{0}': use letters, digits, '-', '_' or '.'")]
    InvalidTournamentId(String),

    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which elimination strategy a tournament uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Algorithm {
    Pairwise,
    Nwise,
    Elo,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Pairwise, Algorithm::Nwise, Algorithm::Elo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Pairwise => "pairwise",
            Algorithm::Nwise => "nwise",
            Algorithm::Elo => "elo",
        }
    }

    /// Fraction eliminated per round when the config leaves it unset
    pub fn default_elimination_rate(&self) -> f64 {
        match self {
            Algorithm::Pairwise => 0.5,
            Algorithm::Nwise => 0.25,
            Algorithm::Elo => 0.3,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pairwise" => Ok(Algorithm::Pairwise),
            "nwise" | "n-wise" => Ok(Algorithm::Nwise),
            "elo" => Ok(Algorithm::Elo),
            _ => Err(ConfigError::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl TryFrom<String> for Algorithm {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Algorithm> for String {
    fn from(algorithm: Algorithm) -> Self {
        algorithm.as_str().to_string()
    }
}

/// Tournament configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentConfig {
    pub algorithm: Algorithm,
    /// Upper bound on the number of rounds
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    /// Opaque model identifier passed through to the judge
    #[serde(default = "default_model")]
    pub model: String,
    /// Batch size for n-wise elimination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    /// Fraction of active items removed per round (per batch for n-wise)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elimination_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_id: Option<String>,
    /// Seed for the run's random source; drawn from entropy when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_rounds() -> u32 {
    DEFAULT_ROUNDS
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Elo,
            rounds: DEFAULT_ROUNDS,
            model: default_model(),
            batch_size: None,
            elimination_rate: Some(0.5),
            tournament_id: None,
            seed: None,
        }
    }
}

impl TournamentConfig {
    /// Config for `algorithm` using that algorithm's own elimination rate.
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            elimination_rate: None,
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from a file: `.json` is parsed as JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&contents),
            _ => Self::from_toml_str(&contents),
        }
    }

    pub fn effective_elimination_rate(&self) -> f64 {
        self.elimination_rate
            .unwrap_or_else(|| self.algorithm.default_elimination_rate())
    }

    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rounds == 0 {
            return Err(ConfigError::InvalidRounds);
        }
        let rate = self.effective_elimination_rate();
        if !(rate > 0.0 && rate <= 1.0) {
            return Err(ConfigError::InvalidEliminationRate(rate));
        }
        if self.batch_size == Some(0) {
            return Err(ConfigError::InvalidBatchSize);
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        if let Some(id) = &self.tournament_id {
            if !is_valid_tournament_id(id) {
                return Err(ConfigError::InvalidTournamentId(id.clone()));
            }
        }
        Ok(())
    }

    /// Returns the tournament identity, deriving one from `now` if unset.
    pub fn ensure_tournament_id(&mut self, now: DateTime<Utc>) -> &str {
        let algorithm = self.algorithm;
        self.tournament_id
            .get_or_insert_with(|| generate_tournament_id(algorithm, now))
            .as_str()
    }
}

/// Ids name directories in the snapshot store, so they stay path-safe.
fn is_valid_tournament_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// `tournament-{algorithm}-{timestamp}` with the timestamp made filename-safe.
pub fn generate_tournament_id(algorithm: Algorithm, now: DateTime<Utc>) -> String {
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("tournament-{}-{}", algorithm, stamp)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
