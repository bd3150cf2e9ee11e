use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use clipdeck_core::{Timing, DEFAULT_EMBED_TIMEOUT, DEFAULT_POLL_INTERVAL};
use clipdeck_engine::{ServiceSettings, DEFAULT_BASE_URL};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "clipdeck.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    #[default]
    Terminal,
    File,
    Both,
}

/// Settings read from `clipdeck.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub poll_interval_ms: u64,
    pub embed_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub output_dir: PathBuf,
    pub log: LogTarget,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            embed_timeout_ms: DEFAULT_EMBED_TIMEOUT.as_millis() as u64,
            request_timeout_ms: ServiceSettings::default().request_timeout.as_millis() as u64,
            output_dir: PathBuf::from("output"),
            log: LogTarget::Terminal,
            log_level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid setting in {path:?}: {message}")]
    Invalid { path: PathBuf, message: String },
}

impl AppConfig {
    /// Reads `path`. A missing file is not an error and yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config: AppConfig = ron::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        config.check().map_err(|message| ConfigError::Invalid {
            path: path.to_path_buf(),
            message,
        })?;
        Ok(config)
    }

    fn check(&self) -> Result<(), String> {
        for (name, value) in [
            ("poll_interval_ms", self.poll_interval_ms),
            ("embed_timeout_ms", self.embed_timeout_ms),
            ("request_timeout_ms", self.request_timeout_ms),
        ] {
            if value == 0 {
                return Err(format!("{name} must be greater than zero"));
            }
        }
        if self.api_base_url.trim().is_empty() {
            return Err("api_base_url is empty".to_string());
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, api: Option<String>, output_dir: Option<PathBuf>) {
        if let Some(api) = api {
            self.api_base_url = api;
        }
        if let Some(output_dir) = output_dir {
            self.output_dir = output_dir;
        }
    }

    pub fn timing(&self) -> Timing {
        Timing {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            embed_timeout: Duration::from_millis(self.embed_timeout_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            base_url: self.api_base_url.clone(),
            request_timeout: self.request_timeout(),
            ..ServiceSettings::default()
        }
    }

    /// Unknown level names fall back to `Info`.
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(self.log_level.trim()).unwrap_or(LevelFilter::Info)
    }
}
