//! Configuration loading and management for the FTL compliance engine.
//!
//! This module loads the EASA and operator rule bundles from JSON and the
//! engine settings from YAML.
//!
//! # Example
//!
//! ```no_run
//! use ftl_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/ftl").unwrap();
//! println!("Base timezone: {}", config.settings().base_timezone);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AugmentationCaps, CabinCrewRules, CabinRestRow, DEFAULT_LIMIT_MINUTES, EasaRules,
    EngineSettings, FdpRow, OmaRules, RestSettings, RuleBundle, ServerSettings, WoclWindow,
};
