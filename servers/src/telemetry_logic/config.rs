use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_REPORT_INTERVAL_SECS: u64 = 30;
const DEFAULT_CONFIG_FILE: &str = "server_telemetry.conf";

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "Factory telemetry collector", version)]
#[serde(rename_all = "camelCase", default)]
pub struct RawConfig {
    #[clap(long, env = "FACTORY_BASE_URL", help = "Base URL of the game telemetry backend.")]
    pub base_url: Option<String>,

    #[clap(long, env = "FACTORY_POLL_INTERVAL_MS", help = "Fixed polling interval in milliseconds.")]
    pub poll_interval_ms: Option<u64>,

    #[clap(long, env = "FACTORY_REPORT_INTERVAL_SECS", help = "Seconds between logged summary reports.")]
    pub report_interval_secs: Option<u64>,

    #[clap(long, env = "FACTORY_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "FACTORY_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "FACTORY_LOG_LEVEL", help = "Logging level (debug, info, warn, error).")]
    pub log_level: Option<String>,
}

impl RawConfig {
    // Merge two RawConfig structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: RawConfig) -> RawConfig {
        RawConfig {
            base_url: other.base_url.or(self.base_url),
            poll_interval_ms: other.poll_interval_ms.or(self.poll_interval_ms),
            report_interval_secs: other.report_interval_secs.or(self.report_interval_secs),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
        }
    }
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub poll_interval: Duration,
    pub report_interval: Duration,
    pub log_dir: PathBuf,
    pub log_level: String,
}

pub fn load_config() -> Config {
    // 1. Compiled defaults
    let default_config = RawConfig {
        base_url: Some(DEFAULT_BASE_URL.to_string()),
        poll_interval_ms: Some(DEFAULT_POLL_INTERVAL_MS),
        report_interval_secs: Some(DEFAULT_REPORT_INTERVAL_SECS),
        log_level: Some("info".to_string()),
        ..Default::default()
    };

    // 2. Config file, if present. The CLI/env may override its location.
    let cli_args = RawConfig::parse();
    let config_file_path = cli_args
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut current = default_config;

    if config_file_path.exists() {
        match fs::read_to_string(&config_file_path) {
            Ok(raw) => match serde_json::from_str::<RawConfig>(&raw) {
                Ok(file_config) => current = current.merge(file_config),
                Err(e) => log::warn!(
                    "Failed to parse config file {}: {e}. Falling back to other sources.",
                    config_file_path.display()
                ),
            },
            Err(e) => log::warn!(
                "Failed to read config file {}: {e}. Falling back to other sources.",
                config_file_path.display()
            ),
        }
    }

    // 3. Environment variables and CLI arguments win over the file.
    let current = current.merge(cli_args);

    // 4. Default log directory lives under the home directory when one exists.
    let log_dir = current.log_dir.unwrap_or_else(|| {
        dirs::home_dir()
            .map(|home| home.join(".factory-watch").join("logs"))
            .unwrap_or_else(|| PathBuf::from("./logs"))
    });

    Config {
        base_url: current.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        poll_interval: Duration::from_millis(
            current.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
        ),
        report_interval: Duration::from_secs(
            current
                .report_interval_secs
                .unwrap_or(DEFAULT_REPORT_INTERVAL_SECS),
        ),
        log_dir,
        log_level: current.log_level.unwrap_or_else(|| "info".to_string()),
    }
}
