use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::audio::AnalyserConfig;
use crate::emotion::{ClipThresholds, EmotionThresholds};
use crate::motion::Arena;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema_version: u32,

    // Live monitoring
    pub sample_interval_ms: u64,
    pub analyser: AnalyserConfig,
    pub emotion_thresholds: EmotionThresholds,
    pub input_device_id: Option<String>,

    // Upload path
    pub clip_thresholds: ClipThresholds,
    pub upload_limit_bytes: usize,

    // Simulation
    pub arena: Arena,

    // HTTP server
    pub port: u16,
    pub static_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: 1,
            sample_interval_ms: 200,
            analyser: AnalyserConfig::default(),
            emotion_thresholds: EmotionThresholds::default(),
            input_device_id: None,
            clip_thresholds: ClipThresholds::default(),
            upload_limit_bytes: 10 * 1024 * 1024,
            arena: Arena::default(),
            port: 3000,
            static_dir: None,
        }
    }
}

impl Config {
    /// Load config from file, or create default
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            let config: Self = serde_json::from_str(&content).context("Failed to parse config file")?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.arena.is_valid() {
            anyhow::bail!(
                "Invalid arena: x [{}, {}], y [{}, {}] (need finite bounds, min <= max)",
                self.arena.min_x,
                self.arena.max_x,
                self.arena.min_y,
                self.arena.max_y
            );
        }
        Ok(())
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        std::fs::write(path, content).context("Failed to write config file")
    }

    /// Get the default config directory
    pub fn default_config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".voicerobot"))
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.json"))
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, 1);
        assert_eq!(config.sample_interval(), Duration::from_millis(200));
        assert_eq!(config.port, 3000);
        assert_eq!(config.arena.max_x, 3.5);
        assert_eq!(config.emotion_thresholds.peak_high, 150.0);
    }

    #[test]
    fn test_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            port: 8080,
            static_dir: Some(PathBuf::from("public")),
            ..Config::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"port": 9000, "arena": {"min_x": -1.0, "max_x": 1.0, "min_y": -1.0, "max_y": 1.0}}"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.arena.max_x, 1.0);
        assert_eq!(config.sample_interval_ms, 200);
    }

    #[test]
    fn test_inverted_arena_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"arena": {"min_x": 2.0, "max_x": -2.0, "min_y": -1.0, "max_y": 1.0}}"#).unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid arena"));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
