//! Application configuration management.
//!
//! Persistent settings for the player: startup volume, seek step, and the
//! track-count and file-size ceilings. Stored in the user's config directory
//! (typically ~/.config/abx/config.toml); `XDG_CONFIG_HOME` overrides the
//! location, which is also what the tests rely on.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use crate::constants::{FALLBACK_UNMUTE_VOLUME, MAX_FILE_MIB, MAX_TRACKS};

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_volume")]
    pub default_volume: f32,
    #[serde(default = "default_seek_step_secs")]
    pub seek_step_secs: f32,
    #[serde(default = "default_max_tracks")]
    pub max_tracks: usize,
    #[serde(default = "default_max_file_mib")]
    pub max_file_mib: u64,
}

fn default_volume() -> f32 {
    FALLBACK_UNMUTE_VOLUME
}

fn default_seek_step_secs() -> f32 {
    5.0
}

fn default_max_tracks() -> usize {
    MAX_TRACKS
}

fn default_max_file_mib() -> u64 {
    MAX_FILE_MIB
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            default_volume: default_volume(),
            seek_step_secs: default_seek_step_secs(),
            max_tracks: default_max_tracks(),
            max_file_mib: default_max_file_mib(),
        }
    }

    pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
        // Check for XDG_CONFIG_HOME first (useful for testing)
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join("abx")
        } else {
            dirs::config_dir()
                .ok_or("Unable to find config directory")?
                .join("abx")
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self, Box<dyn Error>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            // Return default config instead of error
            return Ok(Default::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()?;
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    pub fn exists() -> Result<bool, Box<dyn Error>> {
        Ok(Self::config_path()?.exists())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        match key {
            "default_volume" => {
                let volume: f32 = value.parse().map_err(|_| "Value must be a number")?;
                if !(0.0..=1.0).contains(&volume) {
                    return Err("Value must be between 0.0 and 1.0".into());
                }
                self.default_volume = volume;
            }
            "seek_step_secs" => {
                let step: f32 = value.parse().map_err(|_| "Value must be a number")?;
                if step <= 0.0 {
                    return Err("Value must be positive".into());
                }
                self.seek_step_secs = step;
            }
            "max_tracks" => {
                let max: usize = value.parse().map_err(|_| "Value must be an integer")?;
                if max == 0 {
                    return Err("Value must be at least 1".into());
                }
                self.max_tracks = max;
            }
            "max_file_mib" => {
                self.max_file_mib = value.parse().map_err(|_| "Value must be an integer")?;
            }
            _ => return Err(format!("Unknown configuration key: {key}").into()),
        }
        Ok(())
    }
}
