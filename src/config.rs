//! Configuration system
//!
//! Centralized configuration with runtime defaults, an optional TOML file,
//! and environment variable overrides. Loaded once into a global instance.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Pipeline configuration
    pub processing: ProcessingConfig,

    /// Paths configuration
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

/// What to do with a record whose subject string classifies to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Abort the whole run, discarding all progress (default).
    Abort,
    /// Log a warning and drop the record.
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Upper bound on in-flight batch fetches.
    pub max_concurrent_fetches: usize,
    /// Policy for records that fail subject classification.
    pub on_malformed: MalformedPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub cache_file: PathBuf,
    pub log_directory: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "ERROR".to_string(),
                format: "pretty".to_string(),
                output: "console".to_string(),
            },
            processing: ProcessingConfig {
                max_concurrent_fetches: 8,
                on_malformed: MalformedPolicy::Abort,
            },
            paths: PathsConfig {
                cache_file: dirs::cache_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("cloudtrail-daily")
                    .join("report-cache.json"),
                log_directory: PathBuf::from("logs"),
            },
        }
    }
}

impl Config {
    /// Load configuration from environment, file, and defaults
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        // Try to load from config file if it exists
        let config_paths = [
            PathBuf::from("cloudtrail-daily.toml"),
            PathBuf::from(".cloudtrail-daily.toml"),
            dirs::config_dir()
                .map(|d| d.join("cloudtrail-daily").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        // Override with environment variables
        config.apply_env_overrides()?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        // Logging overrides
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        // Processing overrides
        if let Ok(val) = env::var("CLOUDTRAIL_DAILY_MAX_CONCURRENT_FETCHES") {
            self.processing.max_concurrent_fetches = val
                .parse()
                .context("Invalid CLOUDTRAIL_DAILY_MAX_CONCURRENT_FETCHES")?;
        }
        if let Ok(val) = env::var("CLOUDTRAIL_DAILY_ON_MALFORMED") {
            self.processing.on_malformed = match val.to_lowercase().as_str() {
                "abort" => MalformedPolicy::Abort,
                "skip" => MalformedPolicy::Skip,
                other => anyhow::bail!(
                    "Invalid CLOUDTRAIL_DAILY_ON_MALFORMED: {other} (expected abort or skip)"
                ),
            };
        }

        // Path overrides
        if let Ok(val) = env::var("CLOUDTRAIL_DAILY_CACHE_FILE") {
            self.paths.cache_file = PathBuf::from(val);
        }
        if let Ok(val) = env::var("CLOUDTRAIL_DAILY_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.processing.max_concurrent_fetches == 0 {
            return Err(anyhow::anyhow!(
                "max_concurrent_fetches must be greater than 0"
            ));
        }

        Ok(())
    }
}

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load the global configuration, surfacing file and environment errors
/// to the caller instead of panicking. The binary calls this once before
/// anything consults [`get_config`].
pub fn init_config() -> Result<&'static Config> {
    let config = Config::load()?;
    Ok(CONFIG.get_or_init(|| config))
}

/// Get the global configuration instance, falling back to defaults when
/// [`init_config`] has not run.
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "ERROR");
        assert_eq!(config.processing.max_concurrent_fetches, 8);
        assert_eq!(config.processing.on_malformed, MalformedPolicy::Abort);
    }

    #[test]
    fn test_env_override() {
        env::set_var("CLOUDTRAIL_DAILY_MAX_CONCURRENT_FETCHES", "3");
        let mut config = Config::default();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.processing.max_concurrent_fetches, 3);
        env::remove_var("CLOUDTRAIL_DAILY_MAX_CONCURRENT_FETCHES");
    }

    #[test]
    fn test_malformed_policy_env_override() {
        env::set_var("CLOUDTRAIL_DAILY_ON_MALFORMED", "skip");
        let mut config = Config::default();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.processing.on_malformed, MalformedPolicy::Skip);
        env::remove_var("CLOUDTRAIL_DAILY_ON_MALFORMED");
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.processing.max_concurrent_fetches = 0;
        assert!(config.validate().is_err());
    }
}
