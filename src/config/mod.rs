//! Configuration module for tapline-rs
//!
//! This module handles engine configuration:
//! - Default constants shared by the recorder, merger and replayer
//! - [`EngineConfig`], the TOML file bundling every stage's settings
//! - Locating the per-user config directory
//!
//! # Config Location
//!
//! The default config file lives in the platform config directory under
//! `dev.tapline.tapline-rs`:
//!
//! - **Linux**: `~/.config/dev.tapline.tapline-rs/tapline.toml`
//! - **macOS**: `~/Library/Application Support/dev.tapline.tapline-rs/tapline.toml`
//! - **Windows**: `%APPDATA%\dev.tapline.tapline-rs\tapline.toml`
//!
//! # Example
//!
//! ```ignore
//! use tapline_rs::config::EngineConfig;
//!
//! let mut config = EngineConfig::load_or_default();
//! config.replay.set_long_press_compensation(200);
//! config.save_default()?;
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{Result, TaplineError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "dev.tapline.tapline-rs";

/// Config filename
pub const CONFIG_FILE: &str = "tapline.toml";

/// Default tap duration in milliseconds
pub const DEFAULT_TAP_DURATION_MS: u64 = 50;

/// Minimum duration of a closed long-press in milliseconds
pub const DEFAULT_MIN_LONG_PRESS_MS: u64 = 100;

/// Default swipe duration in milliseconds
pub const DEFAULT_SWIPE_DURATION_MS: u64 = 300;

/// Split pieces shorter than this are dropped (milliseconds)
pub const DEFAULT_MIN_SPLIT_MS: u64 = 50;

/// Extra hold time added to replayed long-presses (milliseconds)
pub const DEFAULT_LONG_PRESS_COMPENSATION_MS: u64 = 150;

/// Where a replayed stream's first action is placed (seconds)
pub const DEFAULT_START_CALIBRATION_SECS: f64 = 0.2;

/// Lead time for the suppression pre-check (milliseconds)
pub const DEFAULT_PRE_CHECK_LEAD_MS: u64 = 500;

/// Budget for a single suppression predicate call (milliseconds)
pub const DEFAULT_PREDICATE_TIMEOUT_MS: u64 = 300;

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub recorder: RecorderSettings,
    pub calibration: CalibrationSettings,
    pub merge: MergeSettings,
    pub replay: ReplaySettings,
}

impl EngineConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| TaplineError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config.normalized())
    }

    /// Serialize to a TOML document
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| TaplineError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Load config from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TaplineError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load the default config file, returning defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save config to a file, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                TaplineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }
        let content = self.to_toml_string()?;
        std::fs::write(path, content)
            .map_err(|e| TaplineError::Config(format!("Failed to write config: {}", e)))
    }

    /// Save to the default config location
    pub fn save_default(&self) -> Result<()> {
        let path = config_path().ok_or_else(|| {
            TaplineError::Config("Could not determine config directory".to_string())
        })?;
        self.save(path)
    }

    /// Clamp values that came from a file into their supported ranges
    pub fn normalized(mut self) -> Self {
        let speed = self.replay.playback_speed;
        self.replay.set_playback_speed(if speed.is_finite() { speed } else { 1.0 });
        self.replay
            .set_long_press_compensation(self.replay.long_press_compensation_ms);
        self.calibration
            .set_start_offset(self.calibration.start_offset_secs);
        self
    }
}
