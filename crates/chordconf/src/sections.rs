//! Configuration sections.

use serde::{Deserialize, Serialize};

/// Root-selection heuristics handed to the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Scores at or below this are not a chord.
    /// Default: 0.5
    #[serde(default = "DetectionConfig::default_match_floor")]
    pub match_floor: f64,

    /// Multiplier applied when the bass note is read as the root.
    /// Default: 1.1
    #[serde(default = "DetectionConfig::default_root_position_bonus")]
    pub root_position_bonus: f64,

    /// Other roots are tried only when the boosted bass score is below this.
    /// Default: 0.6
    #[serde(default = "DetectionConfig::default_inversion_search_below")]
    pub inversion_search_below: f64,

    /// Factor by which an alternative root must beat the current best.
    /// Default: 1.5
    #[serde(default = "DetectionConfig::default_inversion_ratio")]
    pub inversion_ratio: f64,

    /// Confidence of a two-note fifth rooted on the bass.
    /// Default: 0.8
    #[serde(default = "DetectionConfig::default_power_root_confidence")]
    pub power_root_confidence: f64,

    /// Confidence of a two-note fourth read as an inverted fifth.
    /// Default: 0.75
    #[serde(default = "DetectionConfig::default_power_inverted_confidence")]
    pub power_inverted_confidence: f64,
}

impl DetectionConfig {
    fn default_match_floor() -> f64 {
        0.5
    }

    fn default_root_position_bonus() -> f64 {
        1.1
    }

    fn default_inversion_search_below() -> f64 {
        0.6
    }

    fn default_inversion_ratio() -> f64 {
        1.5
    }

    fn default_power_root_confidence() -> f64 {
        0.8
    }

    fn default_power_inverted_confidence() -> f64 {
        0.75
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            match_floor: Self::default_match_floor(),
            root_position_bonus: Self::default_root_position_bonus(),
            inversion_search_below: Self::default_inversion_search_below(),
            inversion_ratio: Self::default_inversion_ratio(),
            power_root_confidence: Self::default_power_root_confidence(),
            power_inverted_confidence: Self::default_power_inverted_confidence(),
        }
    }
}

/// How results are printed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// "sharps" or "flats".
    /// Default: sharps
    #[serde(default = "DisplayConfig::default_spelling")]
    pub spelling: String,

    /// Print JSON instead of text.
    /// Default: false
    #[serde(default)]
    pub json: bool,
}

impl DisplayConfig {
    pub const SPELLINGS: [&'static str; 2] = ["sharps", "flats"];

    fn default_spelling() -> String {
        "sharps".to_string()
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            spelling: Self::default_spelling(),
            json: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    /// Default: warn
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "warn".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
