use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub stations: StationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Volume used before a persisted value exists, in [0.0, 1.0].
    #[serde(default = "default_volume")]
    pub default_volume: f32,
    /// Where the persisted volume / last-station snapshot lives.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

/// Station list source — a TOML file first, then an m3u file or URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationsConfig {
    /// Path to a local TOML station file (highest priority).
    /// Defaults to `$XDG_CONFIG_HOME/wavebox/stations.toml`.
    #[serde(default = "default_stations_toml")]
    pub stations_toml: PathBuf,
    /// URL or file path for an m3u station list (fallback when TOML not found).
    #[serde(default)]
    pub m3u_url: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            state_file: default_state_file(),
        }
    }
}

impl Default for StationsConfig {
    fn default() -> Self {
        Self {
            stations_toml: default_stations_toml(),
            m3u_url: String::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            stations: StationsConfig::default(),
        }
    }
}

fn default_volume() -> f32 {
    0.5
}

fn default_state_file() -> PathBuf {
    platform::data_dir().join("state.json")
}

fn default_stations_toml() -> PathBuf {
    platform::config_dir().join("stations.toml")
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.player.default_volume, 0.5);
        assert!(config.stations.m3u_url.is_empty());
        assert!(config
            .stations
            .stations_toml
            .ends_with("wavebox/stations.toml"));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str("[player]\ndefault_volume = 0.8\n").unwrap();
        assert_eq!(config.player.default_volume, 0.8);
        assert!(config.stations.m3u_url.is_empty());
    }
}
