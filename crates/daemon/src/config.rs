//! Daemon configuration
//!
//! Sources, lowest to highest precedence: built-in defaults, an optional
//! TOML file (`WAITLINE_CONFIG`, else `<config dir>/waitline.toml`), then
//! `WAITLINE_*` environment variables.

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use waitline_core::application::constants::{
    DEFAULT_LOCK_TIMEOUT, DEFAULT_MAINTENANCE_INTERVAL_HOURS,
};
use waitline_core::application::LedgerConfig;

const ENV_PREFIX: &str = "WAITLINE";
const CONFIG_FILE_ENV: &str = "WAITLINE_CONFIG";
const FALLBACK_DB_PATH: &str = "~/.waitline/waitline.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Daily-rotated JSON log files are written here when set
    #[serde(default)]
    pub log_dir: Option<String>,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    #[serde(default = "default_rate_limit_burst")]
    pub rate_limit_burst: u32,
    #[serde(default = "default_rate_limit_rate")]
    pub rate_limit_rate: u32,
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    #[serde(default = "default_maintenance_interval_hours")]
    pub maintenance_interval_hours: u64,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "waitline")
}

fn default_db_path() -> String {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("waitline.db").to_string_lossy().into_owned())
        .unwrap_or_else(|| FALLBACK_DB_PATH.to_string())
}

fn default_rpc_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    9530
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT.as_millis() as u64
}

fn default_rate_limit_burst() -> u32 {
    200
}

fn default_rate_limit_rate() -> u32 {
    100
}

fn default_retention_days() -> i64 {
    30
}

fn default_maintenance_interval_hours() -> u64 {
    DEFAULT_MAINTENANCE_INTERVAL_HOURS
}

impl DaemonConfig {
    /// Load from the default sources
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var(CONFIG_FILE_ENV)
            .ok()
            .map(PathBuf::from)
            .or_else(|| project_dirs().map(|dirs| dirs.config_dir().join("waitline.toml")));
        Self::load_with(file.as_deref(), ENV_PREFIX)
    }

    fn load_with(file: Option<&Path>, env_prefix: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }
        let mut config: DaemonConfig = builder
            .add_source(Environment::with_prefix(env_prefix).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.db_path = shellexpand::tilde(&config.db_path).into_owned();
        config.log_dir = config
            .log_dir
            .map(|dir| shellexpand::tilde(&dir).into_owned());
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "lock_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.rate_limit_burst == 0 {
            return Err(ConfigError::Message(
                "rate_limit_burst must be greater than 0".to_string(),
            ));
        }
        if self.retention_days < 0 {
            return Err(ConfigError::Message(
                "retention_days cannot be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_defaults_without_sources() {
        let config = DaemonConfig::load_with(None, "WAITLINE_TEST_DEFAULTS").unwrap();
        assert_eq!(config.rpc_host, "127.0.0.1");
        assert_eq!(config.rpc_port, 9530);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.ledger_config().lock_timeout, Duration::from_secs(5));
        assert_eq!(config.retention_days, 30);
        assert!(config.db_path.ends_with("waitline.db"));
        assert!(!config.db_path.starts_with('~'));
    }

    #[test]
    fn test_file_then_env_precedence() {
        let path = std::env::temp_dir().join(format!("waitline-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "rpc_port = 9000\nlog_format = \"json\"\nretention_days = 7\n",
        )
        .unwrap();
        std::env::set_var("WAITLINE_TEST_PRECEDENCE_RPC_PORT", "9100");

        let config = DaemonConfig::load_with(Some(&path), "WAITLINE_TEST_PRECEDENCE").unwrap();

        std::env::remove_var("WAITLINE_TEST_PRECEDENCE_RPC_PORT");
        let _ = std::fs::remove_file(&path);

        assert_eq!(config.rpc_port, 9100, "env wins over file");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.retention_days, 7);
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let path = Path::new("/nonexistent/waitline.toml");
        assert_ok!(DaemonConfig::load_with(Some(path), "WAITLINE_TEST_MISSING"));
    }

    #[test]
    fn test_zero_lock_timeout_rejected() {
        std::env::set_var("WAITLINE_TEST_ZERO_LOCK_TIMEOUT_MS", "0");
        let result = DaemonConfig::load_with(None, "WAITLINE_TEST_ZERO");
        std::env::remove_var("WAITLINE_TEST_ZERO_LOCK_TIMEOUT_MS");
        assert_err!(result);
    }
}
