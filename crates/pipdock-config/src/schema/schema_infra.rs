//! Browser connection and logging configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Chrome DevTools endpoint of the browser that hosts the popup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// HTTP debugging endpoint (`--remote-debugging-port`).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Timeout for a single CDP request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl BrowserConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_endpoint() -> String {
    "http://localhost:9222".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for the daily rolling log files. `~` is expanded.
    #[serde(default = "default_log_dir")]
    pub dir: String,

    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: default_log_dir(),
            max_files: default_max_files(),
        }
    }
}

impl LoggingConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        PathBuf::from(crate::ConfigLoader::expand_path(&self.dir))
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    dirs::home_dir()
        .map(|home| home.join(".pipdock").join("logs").to_string_lossy().into_owned())
        .unwrap_or_else(|| "~/.pipdock/logs".to_string())
}

fn default_max_files() -> usize {
    30
}
