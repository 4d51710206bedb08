//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the rule
//! bundles and engine settings from a configuration directory.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::{EngineError, EngineResult};

use super::types::{EasaRules, EngineSettings, OmaRules, RuleBundle};

/// Loads and provides access to the FTL configuration.
///
/// The configuration is read once at start-up and is immutable afterwards;
/// picking up edited rule tables requires a restart.
///
/// # Directory Structure
///
/// ```text
/// config/ftl/
/// ├── easa.json      # Regulatory FDP bands, sector corrections, WOCL windows
/// ├── oma.json       # Operator cabin rest table and augmentation caps
/// └── settings.yaml  # Base timezone, base airports, rest toggles, server
/// ```
///
/// # Example
///
/// ```no_run
/// use ftl_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/ftl")?;
/// println!("Default FDP limit: {} min", loader.bundle().easa.default_limit_minutes);
/// # Ok::<(), ftl_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    bundle: RuleBundle,
    settings: EngineSettings,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - Any of the three files is missing (`ConfigNotFound`)
    /// - Any file is malformed, including bad `HH:MM` bands or an unknown
    ///   timezone (`ConfigParseError`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let easa = Self::load_json::<EasaRules>(&path.join("easa.json"))?;
        let oma = Self::load_json::<OmaRules>(&path.join("oma.json"))?;
        let settings = Self::load_yaml::<EngineSettings>(&path.join("settings.yaml"))?;

        info!(
            config_dir = %path.display(),
            fdp_rows = easa.fdp_rows.len(),
            cabin_rows = oma.cabin_crew.min_rest_by_extended_fdp.len(),
            base_timezone = %settings.base_timezone,
            "Loaded FTL configuration"
        );

        Ok(Self {
            bundle: RuleBundle { easa, oma },
            settings,
        })
    }

    /// Builds a loader from already-constructed parts.
    pub fn from_parts(bundle: RuleBundle, settings: EngineSettings) -> Self {
        Self { bundle, settings }
    }

    fn read(path: &Path) -> EngineResult<String> {
        fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path.display().to_string(),
        })
    }

    fn load_json<T: DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let content = Self::read(path)?;
        serde_json::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn load_yaml<T: DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let content = Self::read(path)?;
        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Returns both rule bundles.
    pub fn bundle(&self) -> &RuleBundle {
        &self.bundle
    }

    /// Returns the engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}
