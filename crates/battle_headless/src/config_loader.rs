//! Battle config loading for headless runs.
//!
//! The core only parses text; reading files and finding the shipped
//! config on disk happens here.

use std::fs;
use std::path::{Path, PathBuf};

use battle_core::data::GameConfig;
use battle_core::error::GameError;
use thiserror::Error;

/// Errors that can occur while loading a config file.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Failed to read the file.
    #[error("IO error reading '{path}': {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not valid RON for a [`GameConfig`].
    #[error("Parse error in '{path}': {source}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: ron::error::SpannedError,
    },
    /// The file parsed but holds out-of-range values.
    #[error("Invalid config in '{path}': {source}")]
    Invalid {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: GameError,
    },
}

/// Load and validate a config from a RON file.
pub fn load_config(path: &Path) -> Result<GameConfig, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: GameConfig = ron::from_str(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    config.validate().map_err(|source| LoadError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), heroes = config.heroes.len(), "Loaded battle config");
    Ok(config)
}

/// Resolve the shipped config file.
///
/// Looks in:
/// 1. Environment variable `BATTLE_CONFIG`
/// 2. `./assets/data/battle.ron` (repo root)
/// 3. `../../assets/data/battle.ron` (running from a crate directory)
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(file) = std::env::var("BATTLE_CONFIG") {
        let path = PathBuf::from(file);
        if path.exists() {
            return Some(path);
        }
    }

    let candidates = ["assets/data/battle.ron", "../../assets/data/battle.ron"];

    candidates
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

/// Load `path` if given, else the shipped file if found, else the built-in
/// tuning.
pub fn load_or_default(path: Option<&Path>) -> Result<GameConfig, LoadError> {
    if let Some(path) = path {
        return load_config(path);
    }
    match default_config_path() {
        Some(path) => load_config(&path),
        None => {
            tracing::info!("No config file found, using built-in tuning");
            Ok(GameConfig::default())
        }
    }
}
