//! Analyzer configuration.
//!
//! Loaded from `config.toml` in the application data directory, or from an
//! explicit path. Every section and field falls back to its default, so a
//! partial file only needs the values it changes.

use crate::metrics::{ElevationFilter, MovingSettings, PowerSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Configuration version
    pub version: String,
    /// Data directory path (not serialized)
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Slope window settings
    pub slope: SlopeSettings,
    /// Vertical velocity window settings
    pub vertical_velocity: VerticalVelocitySettings,
    /// Elevation smoothing settings
    pub elevation: ElevationSettings,
    /// Power curve settings
    pub power: PowerSettings,
    /// Average velocity settings
    pub velocity: VelocitySettings,
    /// Moving data settings
    pub moving: MovingSettings,
    /// Output settings
    pub output: OutputSettings,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            slope: SlopeSettings::default(),
            vertical_velocity: VerticalVelocitySettings::default(),
            elevation: ElevationSettings::default(),
            power: PowerSettings::default(),
            velocity: VelocitySettings::default(),
            moving: MovingSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

/// Slope window settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeSettings {
    /// Window length in meters
    pub interval_m: u32,
}

impl Default for SlopeSettings {
    fn default() -> Self {
        Self { interval_m: 100 }
    }
}

/// Vertical velocity window settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerticalVelocitySettings {
    /// Window lengths in seconds, one summary pair each
    pub windows_s: Vec<u32>,
    /// Window whose values are written to the points
    pub annotate_window_s: u32,
}

impl Default for VerticalVelocitySettings {
    fn default() -> Self {
        Self {
            windows_s: vec![60, 600, 3600],
            annotate_window_s: 60,
        }
    }
}

/// Elevation smoothing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationSettings {
    /// Elevation changes below this are merged away
    pub minimal_delta_m: f64,
    /// Allow replacing the last kept point when the next one extends it
    pub second_chance: bool,
}

impl Default for ElevationSettings {
    fn default() -> Self {
        let filter = ElevationFilter::default();
        Self {
            minimal_delta_m: filter.minimal_delta,
            second_chance: filter.second_chance,
        }
    }
}

impl ElevationSettings {
    pub fn filter(&self) -> ElevationFilter {
        ElevationFilter {
            minimal_delta: self.minimal_delta_m,
            second_chance: self.second_chance,
        }
    }
}

/// Average velocity settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocitySettings {
    /// Distances in kilometers for `avg_velocity_<d>km`
    pub distances_km: Vec<u32>,
}

impl Default for VelocitySettings {
    fn default() -> Self {
        Self {
            distances_km: vec![1, 5, 10, 15, 20, 30, 40, 50, 75, 100, 150, 200],
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Decimals kept in the summary JSON
    pub decimals: u32,
    /// Also write `<stem>_simplified.gpx`
    pub write_simplified: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            decimals: 3,
            write_simplified: false,
        }
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "trackanalyzer", "TrackAnalyzer")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load configuration from the default location.
pub fn load_config() -> Result<AnalyzerConfig, ConfigError> {
    load_config_from(&get_config_path())
}

/// Load configuration from `path`; a missing file gives the defaults.
pub fn load_config_from(path: &Path) -> Result<AnalyzerConfig, ConfigError> {
    if !path.exists() {
        let config = AnalyzerConfig {
            data_dir: get_data_dir(),
            ..Default::default()
        };
        return Ok(config);
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut config: AnalyzerConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.data_dir = get_data_dir();

    Ok(config)
}

/// Save configuration to the default location.
pub fn save_config(config: &AnalyzerConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path())
}

/// Save configuration to `path`.
pub fn save_config_to(config: &AnalyzerConfig, path: &Path) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
