//! Config file discovery, loading, and environment variable overlay.

use crate::{ChordConfig, ConfigError, DisplayConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided it replaces the local override. It is returned
/// even when missing, so loading it reports the bad path.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/chordid/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("chordid/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        files.push(path.to_path_buf());
        return files;
    }

    let local = PathBuf::from("chordid.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Overlay a TOML file onto `config`.
pub fn load_from_file(config: &mut ChordConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)
}

/// Overlay TOML text onto `config`. Only keys present in the text change.
pub fn apply_toml(config: &mut ChordConfig, contents: &str, path: &Path) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if let Some(detection) = table.get("detection").and_then(|v| v.as_table()) {
        let d = &mut config.detection;
        for (key, slot) in [
            ("match_floor", &mut d.match_floor),
            ("root_position_bonus", &mut d.root_position_bonus),
            ("inversion_search_below", &mut d.inversion_search_below),
            ("inversion_ratio", &mut d.inversion_ratio),
            ("power_root_confidence", &mut d.power_root_confidence),
            ("power_inverted_confidence", &mut d.power_inverted_confidence),
        ] {
            if let Some(v) = detection.get(key) {
                *slot = as_number(v).ok_or_else(|| ConfigError::InvalidValue {
                    key: format!("detection.{}", key),
                    message: format!("expected a number, got {}", v),
                })?;
            }
        }
    }

    if let Some(display) = table.get("display").and_then(|v| v.as_table()) {
        if let Some(v) = display.get("spelling") {
            let spelling = v.as_str().ok_or_else(|| ConfigError::InvalidValue {
                key: "display.spelling".to_string(),
                message: format!("expected a string, got {}", v),
            })?;
            config.display.spelling = parse_spelling("display.spelling", spelling)?;
        }
        if let Some(v) = display.get("json") {
            config.display.json = v.as_bool().ok_or_else(|| ConfigError::InvalidValue {
                key: "display.json".to_string(),
                message: format!("expected true or false, got {}", v),
            })?;
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level").and_then(|v| v.as_str()) {
            config.telemetry.log_level = v.to_string();
        }
    }

    Ok(())
}

fn as_number(value: &toml::Value) -> Option<f64> {
    value
        .as_float()
        .or_else(|| value.as_integer().map(|i| i as f64))
}

fn parse_spelling(key: &str, value: &str) -> Result<String, ConfigError> {
    let normalized = value.trim().to_ascii_lowercase();
    if DisplayConfig::SPELLINGS.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected sharps or flats, got {:?}", value),
        })
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(
    config: &mut ChordConfig,
    sources: &mut ConfigSources,
) -> Result<(), ConfigError> {
    apply_overrides_from(config, sources, |key| env::var(key).ok())
}

/// Apply overrides from any key lookup (the process environment in production).
pub fn apply_overrides_from(
    config: &mut ChordConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let d = &mut config.detection;
    for (key, slot) in [
        ("CHORDID_MATCH_FLOOR", &mut d.match_floor),
        ("CHORDID_ROOT_POSITION_BONUS", &mut d.root_position_bonus),
        ("CHORDID_INVERSION_SEARCH_BELOW", &mut d.inversion_search_below),
        ("CHORDID_INVERSION_RATIO", &mut d.inversion_ratio),
    ] {
        if let Some(v) = lookup(key) {
            *slot = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected a number, got {:?}", v),
            })?;
            sources.env_overrides.push(key.to_string());
        }
    }

    if let Some(v) = lookup("CHORDID_SPELLING") {
        config.display.spelling = parse_spelling("CHORDID_SPELLING", &v)?;
        sources.env_overrides.push("CHORDID_SPELLING".to_string());
    }

    if let Some(v) = lookup("CHORDID_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("CHORDID_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }

    Ok(())
}
