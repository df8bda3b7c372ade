//! Configuration loading for chordid.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/chordid/config.toml` (system)
//! 2. `~/.config/chordid/config.toml` (user)
//! 3. `./chordid.toml` (local override), or a path given with `--config`
//! 4. Environment variables (`CHORDID_*`, `RUST_LOG`)
//!
//! Each file only replaces the keys it sets.
//!
//! # Example Config
//!
//! ```toml
//! [detection]
//! match_floor = 0.5
//! root_position_bonus = 1.1
//! inversion_search_below = 0.6
//! inversion_ratio = 1.5
//!
//! [display]
//! spelling = "flats"
//! json = false
//!
//! [telemetry]
//! log_level = "warn"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use sections::{DetectionConfig, DisplayConfig, TelemetryConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Complete chordid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChordConfig {
    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl ChordConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration, with `config_path` taking the place of `./chordid.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = ChordConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::load_from_file(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources)?;

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# chordid configuration\n\n");

        let d = &self.detection;
        output.push_str("[detection]\n");
        output.push_str(&format!("match_floor = {:?}\n", d.match_floor));
        output.push_str(&format!("root_position_bonus = {:?}\n", d.root_position_bonus));
        output.push_str(&format!(
            "inversion_search_below = {:?}\n",
            d.inversion_search_below
        ));
        output.push_str(&format!("inversion_ratio = {:?}\n", d.inversion_ratio));
        output.push_str(&format!(
            "power_root_confidence = {:?}\n",
            d.power_root_confidence
        ));
        output.push_str(&format!(
            "power_inverted_confidence = {:?}\n",
            d.power_inverted_confidence
        ));

        output.push_str("\n[display]\n");
        output.push_str(&format!("spelling = \"{}\"\n", self.display.spelling));
        output.push_str(&format!("json = {}\n", self.display.json));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));

        output
    }
}
