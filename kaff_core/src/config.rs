//! Configuration file support for Kaff.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/kaff/config.toml`.

use crate::bedtime::DEFAULT_BEDTIME_THRESHOLD_MG;
use crate::error::{Error, Result};
use crate::kinetics::DEFAULT_HALF_LIFE_HOURS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub kinetics: KineticsConfig,

    #[serde(default)]
    pub bedtime: BedtimeConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Elimination model calibration
///
/// Both 5h and 6.5h half-lives are legitimate calibrations (the latter for
/// slow-to-moderate metabolizers); this is the single knob that selects one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KineticsConfig {
    #[serde(default = "default_half_life_hours")]
    pub half_life_hours: f64,
}

impl Default for KineticsConfig {
    fn default() -> Self {
        Self {
            half_life_hours: default_half_life_hours(),
        }
    }
}

/// Bedtime setting and target threshold
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BedtimeConfig {
    /// `HH:MM`, 24-hour
    #[serde(default = "default_bedtime")]
    pub time: String,

    #[serde(default = "default_threshold_mg")]
    pub threshold_mg: f64,
}

impl Default for BedtimeConfig {
    fn default() -> Self {
        Self {
            time: default_bedtime(),
            threshold_mg: default_threshold_mg(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME")
            .expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("kaff")
}

fn default_half_life_hours() -> f64 {
    DEFAULT_HALF_LIFE_HOURS
}

fn default_bedtime() -> String {
    "23:00".to_string()
}

fn default_threshold_mg() -> f64 {
    DEFAULT_BEDTIME_THRESHOLD_MG
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME")
                .expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("kaff").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.kinetics.half_life_hours <= 0.0 {
            return Err(Error::Config(format!(
                "half_life_hours must be positive, got {}",
                self.kinetics.half_life_hours
            )));
        }
        if self.bedtime.threshold_mg <= 0.0 {
            return Err(Error::Config(format!(
                "threshold_mg must be positive, got {}",
                self.bedtime.threshold_mg
            )));
        }
        crate::bedtime::parse_bedtime(&self.bedtime.time)?;
        Ok(())
    }
}
