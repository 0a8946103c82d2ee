use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use animator_engine::{GeminiSettings, MonitorSettings};
use anyhow::Context;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use super::logging::LogDestination;

pub const DEFAULT_CONFIG_FILE: &str = "animator.ron";

/// Settings read from `animator.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub output_dir: PathBuf,
    pub api_base_url: String,
    pub model: String,
    pub resolution: String,
    pub poll_interval_secs: u64,
    pub message_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub max_asset_bytes: u64,
    pub log_destination: LogDestination,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let gemini = GeminiSettings::default();
        let monitor = MonitorSettings::default();
        Self {
            output_dir: PathBuf::from("output"),
            api_base_url: gemini.base_url,
            model: gemini.model,
            resolution: gemini.resolution,
            poll_interval_secs: monitor.poll_interval.as_secs(),
            message_interval_secs: monitor.message_interval.as_secs(),
            request_timeout_secs: gemini.request_timeout.as_secs(),
            max_asset_bytes: gemini.max_asset_bytes,
            log_destination: LogDestination::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `path`. A missing file yields the defaults unless `required` is set.
    pub fn load(path: &Path, required: bool) -> anyhow::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound && !required => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()));
            }
        };
        Self::parse(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(content)?)
    }

    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
    }

    pub fn gemini_settings(&self) -> GeminiSettings {
        GeminiSettings {
            base_url: self.api_base_url.clone(),
            model: self.model.clone(),
            resolution: self.resolution.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_asset_bytes: self.max_asset_bytes,
            ..GeminiSettings::default()
        }
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            message_interval: Duration::from_secs(self.message_interval_secs.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::parse("()").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.poll_interval_secs, 8);
        assert_eq!(config.message_interval_secs, 6);
        assert_eq!(config.model, "veo-3.1-fast-generate-preview");
    }

    #[test]
    fn partial_file_overrides_named_fields() {
        let config = AppConfig::parse(
            r#"(
                output_dir: "videos",
                poll_interval_secs: 2,
                log_destination: Both,
                log_level: "debug",
            )"#,
        )
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("videos"));
        assert_eq!(config.monitor_settings().poll_interval, Duration::from_secs(2));
        assert_eq!(config.log_destination, LogDestination::Both);
        assert_eq!(config.level_filter(), LevelFilter::Debug);
        assert_eq!(config.resolution, "720p");
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        let config = AppConfig {
            log_level: "chatty".into(),
            ..AppConfig::default()
        };
        assert_eq!(config.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn zero_intervals_are_clamped() {
        let config = AppConfig {
            poll_interval_secs: 0,
            message_interval_secs: 0,
            ..AppConfig::default()
        };
        let monitor = config.monitor_settings();
        assert_eq!(monitor.poll_interval, Duration::from_secs(1));
        assert_eq!(monitor.message_interval, Duration::from_secs(1));
    }

    #[test]
    fn missing_file_is_only_fatal_when_required() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_FILE);
        assert_eq!(AppConfig::load(&path, false).unwrap(), AppConfig::default());
        assert!(AppConfig::load(&path, true).is_err());

        fs::write(&path, "(model: \"veo-test\")").unwrap();
        assert_eq!(AppConfig::load(&path, true).unwrap().model, "veo-test");
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(AppConfig::parse("(poll_interval_secs: \"soon\")").is_err());
    }
}
