//! Configuration file support for noisedose.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/noisedose/config.toml`.

use crate::export::ExportFormat;
use crate::{Error, NoiseStandard, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

/// Where the measurement log lives
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

impl DataConfig {
    /// JSON Lines file holding raw measurements
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("measurements.jsonl")
    }
}

/// Dose engine settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Standard active at startup
    #[serde(default)]
    pub standard: NoiseStandard,
}

/// Output settings for exposure tables
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub format: ExportFormat,
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir().join(".local/share"));
    base.join("noisedose")
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
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
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_dir().join(".config"));
        base.join("noisedose").join("config.toml")
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save the configuration to a specific path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml_string()?)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.standard, NoiseStandard::Niosh);
        assert_eq!(config.export.format, ExportFormat::Text);
        assert!(config.data.log_path().ends_with("noisedose/measurements.jsonl"));
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[engine]
standard = "osha"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.standard, NoiseStandard::Osha);
        assert_eq!(config.export.format, ExportFormat::Text); // default
    }

    #[test]
    fn test_unknown_standard_rejected() {
        let toml_str = r#"
[engine]
standard = "iso"
"#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_save_and_load_from_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.engine.standard = NoiseStandard::Eu;
        config.export.format = ExportFormat::Csv;
        config.data.data_dir = temp_dir.path().join("data");
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.engine.standard, NoiseStandard::Eu);
        assert_eq!(loaded.export.format, ExportFormat::Csv);
        assert_eq!(loaded.data.data_dir, temp_dir.path().join("data"));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[engine\nstandard = ").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Toml(_))));
    }
}
