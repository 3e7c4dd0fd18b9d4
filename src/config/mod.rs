//! Configuration management for Tributary.
//!
//! Settings are layered: built-in defaults, then `~/.config/tributary/config.toml`
//! (or the file given with `--config`), then `.env` and the process
//! environment. If the default config file doesn't exist, one is created with
//! comments.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::scheduler::ticker::MAX_PERIOD;

pub const ENV_INTERVAL_MINUTES: &str = "SCRAPER_INTERVAL_MINUTES";
pub const ENV_FEEDS_PER_CYCLE: &str = "SCRAPER_FEEDS_TO_FETCH";
pub const ENV_INITIAL_SCRAPE: &str = "SCRAPER_INITIAL_SCRAPE";
pub const ENV_DB_PATH: &str = "TRIBUTARY_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "TRIBUTARY_LOG";

const MAX_INTERVAL_MINUTES: u64 = MAX_PERIOD.as_secs() / 60;

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scraper: ScraperSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
    /// Rejected environment values, reported once logging is up.
    #[serde(skip)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScraperSettings {
    /// Minutes between scheduled cycles.
    pub interval_minutes: u64,
    /// Feeds selected per cycle, also the worker pool size.
    pub feeds_per_cycle: usize,
    /// Run one cycle right after startup.
    pub initial_scrape: bool,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            interval_minutes: 60,
            feeds_per_cycle: 10,
            initial_scrape: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// SQLite file; defaults to the platform data directory.
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default path when `None`,
    /// then overlay `.env` and the environment.
    ///
    /// A missing file at the default path is created with defaults; a missing
    /// explicit path is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let config_path = Self::default_config_path()?;
                if config_path.exists() {
                    Self::from_file(&config_path)?
                } else {
                    Self::create_default_config(&config_path)?;
                    Self::default()
                }
            }
        };

        dotenv::dotenv().ok();
        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content, path)
    }

    fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_INTERVAL_MINUTES).contains(&self.scraper.interval_minutes) {
            return Err(ConfigError::Invalid {
                key: "scraper.interval_minutes".into(),
                message: format!("must be between 1 and {}", MAX_INTERVAL_MINUTES),
            });
        }
        if self.scraper.feeds_per_cycle == 0 {
            return Err(ConfigError::Invalid {
                key: "scraper.feeds_per_cycle".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Overlay environment values read through `lookup`.
    ///
    /// Unparseable, zero or out-of-range values are skipped and recorded in `warnings`;
    /// the previous value stays in effect.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(raw) = present(ENV_INTERVAL_MINUTES) {
            match raw.parse::<u64>() {
                Ok(minutes) if (1..=MAX_INTERVAL_MINUTES).contains(&minutes) => {
                    self.scraper.interval_minutes = minutes
                }
                _ => self.reject(ENV_INTERVAL_MINUTES, &raw),
            }
        }

        if let Some(raw) = present(ENV_FEEDS_PER_CYCLE) {
            match raw.parse::<usize>() {
                Ok(feeds) if feeds > 0 => self.scraper.feeds_per_cycle = feeds,
                _ => self.reject(ENV_FEEDS_PER_CYCLE, &raw),
            }
        }

        if let Some(raw) = present(ENV_INITIAL_SCRAPE) {
            match parse_bool(&raw) {
                Some(initial) => self.scraper.initial_scrape = initial,
                None => self.reject(ENV_INITIAL_SCRAPE, &raw),
            }
        }

        if let Some(raw) = present(ENV_DB_PATH) {
            self.storage.database_path = Some(PathBuf::from(raw));
        }

        if let Some(raw) = present(ENV_LOG_LEVEL) {
            self.logging.level = raw;
        }
    }

    fn reject(&mut self, key: &str, raw: &str) {
        self.warnings
            .push(format!("Ignoring invalid {}: {:?}", key, raw));
    }

    /// Scrape interval, capped at one year.
    pub fn interval(&self) -> Duration {
        let minutes = self.scraper.interval_minutes.min(MAX_INTERVAL_MINUTES);
        Duration::from_secs(minutes * 60)
    }

    /// Get the default config file path: `~/.config/tributary/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("tributary").join("config.toml"))
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> &'static str {
        r##"# Tributary Configuration
#
# Environment variables override these values:
#   SCRAPER_INTERVAL_MINUTES, SCRAPER_FEEDS_TO_FETCH, SCRAPER_INITIAL_SCRAPE,
#   TRIBUTARY_DB_PATH, TRIBUTARY_LOG
# A .env file in the working directory is read as well.

[scraper]
# Minutes between scrape cycles
interval_minutes = 60

# Feeds fetched per cycle (also the number of concurrent workers)
feeds_per_cycle = 10

# Run a cycle immediately on startup
initial_scrape = true

[storage]
# SQLite database file (default: platform data directory)
# database_path = "/var/lib/tributary/tributary.db"

[logging]
# trace, debug, info, warn, error; RUST_LOG takes precedence
level = "info"
"##
    }
}

/// Boolean spellings accepted for environment flags.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Parse interval string like "1h", "30m", "6h", "1d" into seconds.
///
/// Accepts at most one year.
pub fn parse_interval(s: &str) -> Result<u64, ConfigError> {
    let s = s.trim().to_lowercase();
    let invalid = |message: String| ConfigError::Invalid {
        key: "interval".into(),
        message,
    };
    let scaled = |digits: &str, unit: u64, name: &str| -> Result<u64, ConfigError> {
        digits
            .parse::<u64>()
            .map_err(|_| invalid(format!("Invalid {}: {}", name, digits)))?
            .checked_mul(unit)
            .ok_or_else(|| invalid(format!("Interval too large: {}", s)))
    };

    let secs = if let Some(hours) = s.strip_suffix('h') {
        scaled(hours, 3600, "hours")?
    } else if let Some(minutes) = s.strip_suffix('m') {
        scaled(minutes, 60, "minutes")?
    } else if let Some(days) = s.strip_suffix('d') {
        scaled(days, 86400, "days")?
    } else if let Some(secs) = s.strip_suffix('s') {
        scaled(secs, 1, "seconds")?
    } else {
        // Raw seconds
        s.parse::<u64>().map_err(|_| {
            invalid(format!(
                "Invalid interval: {}. Use format like '1h', '30m', '1d'",
                s
            ))
        })?
    };

    if secs == 0 {
        return Err(invalid("Interval must be greater than zero".into()));
    }
    if secs > MAX_PERIOD.as_secs() {
        return Err(invalid(format!(
            "Interval must be at most {}",
            format_interval(MAX_PERIOD.as_secs())
        )));
    }
    Ok(secs)
}

/// Format interval for display
pub fn format_interval(secs: u64) -> String {
    if secs >= 86400 && secs % 86400 == 0 {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}
