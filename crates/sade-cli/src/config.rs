//! CLI configuration parsing.
//!
//! A TOML file selects the fixture data files and optionally overrides
//! engine knobs:
//!
//! ```toml
//! [data]
//! drone_models = "sade-data/drone_models.json"
//! reputation_model = "sade-data/reputation_model.json"
//! user_claims = "sade-data/user_input.json"
//! wind_conditions = "sade-data/wind_conditions.json"
//!
//! [engine]
//! pattern_threshold = 3
//! ```
//!
//! Every section is optional; defaults point at `sade-data/` in the
//! working directory.

use std::path::{Path, PathBuf};

use sade_core::EngineKnobs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Paths to the fixture data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    /// Drone model table with manufacturer flight constraints.
    pub drone_models: PathBuf,
    /// Historical session records per DPO.
    pub reputation_model: PathBuf,
    /// DPO follow-up/claim records.
    pub user_claims: PathBuf,
    /// Current wind conditions override; optional file.
    pub wind_conditions: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            drone_models: PathBuf::from("sade-data/drone_models.json"),
            reputation_model: PathBuf::from("sade-data/reputation_model.json"),
            user_claims: PathBuf::from("sade-data/user_input.json"),
            wind_conditions: PathBuf::from("sade-data/wind_conditions.json"),
        }
    }
}

/// Top-level CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Fixture data locations.
    pub data: DataPaths,
    /// Engine threshold overrides.
    pub engine: EngineKnobs,
}

/// Configuration loading failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// The config path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("cannot parse config {path}: {source}")]
    Parse {
        /// The config path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: toml::de::Error,
    },
}

impl CliConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
