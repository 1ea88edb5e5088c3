//! Configuration management
//!
//! Settings are stored in TOML format and loaded permissively: a missing or
//! unparseable file falls back to defaults, and every field has its own
//! default so partial files work. CLI flags override the file.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Video/window settings
    #[serde(default)]
    pub video: VideoConfig,
    /// Texture streaming settings
    #[serde(default)]
    pub stream: StreamConfig,
}

/// Video and window configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Whether to run in fullscreen mode (default: false)
    #[serde(default)]
    pub fullscreen: bool,
    /// Whether to enable vertical sync (default: true)
    #[serde(default = "default_true")]
    pub vsync: bool,
}

/// Texture streaming configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Hard cap on live staging buffers; `acquire` fails past it
    /// (default: 16, i.e. 1 GiB of staging at 4096x4096 RGBA8)
    #[serde(default = "default_max_staging_buffers")]
    pub max_staging_buffers: usize,
    /// Frame source flip period in milliseconds (default: 8, faster than
    /// one 60 Hz frame, so the loop usually sees a fresh payload)
    #[serde(default = "default_source_period_ms")]
    pub source_period_ms: u64,
    /// Log staging pool state every N frames; 0 disables (default: 300)
    #[serde(default = "default_log_interval_frames")]
    pub log_interval_frames: u64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fullscreen: false,
            vsync: true,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_staging_buffers: default_max_staging_buffers(),
            source_period_ms: default_source_period_ms(),
            log_interval_frames: default_log_interval_frames(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_staging_buffers() -> usize {
    16
}

fn default_source_period_ms() -> u64 {
    8
}

fn default_log_interval_frames() -> u64 {
    300
}

/// Loads the configuration from the given file.
///
/// Missing file, unreadable file, or parse failure all fall back to
/// defaults; a config problem should never stop the demo from running.
pub fn load(path: Option<&Path>) -> Config {
    path.and_then(|p| std::fs::read_to_string(p).ok())
        .and_then(|content| toml::from_str(&content).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert!(config.video.vsync);
        assert!(!config.video.fullscreen);
        assert_eq!(config.stream.max_staging_buffers, 16);
        assert_eq!(config.stream.source_period_ms, 8);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str("[stream]\nmax_staging_buffers = 4\n").unwrap();
        assert_eq!(config.stream.max_staging_buffers, 4);
        assert_eq!(config.stream.source_period_ms, 8);
        assert!(config.video.vsync);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load(Some(Path::new("/nonexistent/texstream.toml")));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = Config::default();
        config.video.fullscreen = true;
        config.stream.log_interval_frames = 60;
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
