//! Fixture-backed collaborator implementations.
//!
//! These stand in for the production environment, reputation, and
//! claims services when running the engine against local JSON data
//! files. Data loading is lenient in the same places the upstream
//! services are lenient (absent files mean an empty record set); a file
//! that exists but does not parse is a hard error, surfaced before the
//! engine runs.

pub mod claims;
pub mod environment;
pub mod reputation;

use std::path::Path;

use thiserror::Error;

/// Fixture data loading failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FixtureError {
    /// The data file exists but could not be read.
    #[error("cannot read fixture data {path}: {source}")]
    Io {
        /// The data file path.
        path: std::path::PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The data file exists but is not valid JSON for its schema.
    #[error("cannot parse fixture data {path}: {source}")]
    Parse {
        /// The data file path.
        path: std::path::PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// Reads and parses an optional JSON data file. A missing file yields
/// the type's default (empty record set); a present-but-invalid file is
/// an error.
pub(crate) fn load_optional_json<T>(path: &Path) -> Result<T, FixtureError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| FixtureError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
