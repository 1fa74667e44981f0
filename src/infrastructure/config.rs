//! Configuration infrastructure
//!
//! Contains configuration loading for the deals scraper and the constants
//! describing the deals site.
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults (see [`defaults`])
//! 2. An optional TOML/JSON/YAML file
//! 3. Environment variables prefixed with `WAREHOUSE_DEALS_`, nested keys
//!    separated by `__` (e.g. `WAREHOUSE_DEALS_SCROLL__PAUSE_MS=750`)

#![allow(clippy::uninlined_format_args)]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::Location;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "WAREHOUSE_DEALS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Location key or label to scrape. Unrecognized values select the first location.
    pub location: String,

    pub browser: BrowserConfig,
    pub scroll: ScrollConfig,
    pub database: DatabaseConfig,
    pub snapshot: SnapshotConfig,
    pub logging: LoggingConfig,
}

/// WebDriver session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// WebDriver endpoint (geckodriver or chromedriver)
    pub webdriver_url: String,

    /// "firefox" or "chrome"; selects the capability block sent on connect
    pub browser: String,

    pub headless: bool,

    /// Upper bound for the detail window and its history table to appear
    pub detail_timeout_ms: u64,

    /// Pause after dismissing the subscription overlay
    pub banner_settle_ms: u64,
}

/// Lazy-load scroll loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Hard cap on scroll iterations
    pub max_iterations: u32,

    /// Consecutive non-growing measurements that end the loop
    pub stable_iterations: u32,

    /// Delay between a scroll and the following height measurement
    pub pause_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite://deals.db` or `sqlite::memory:`
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// JSON file holding the last scraped batch
    pub path: PathBuf,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs in the file output
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for log files; defaults to `<data dir>/logs`
    pub log_dir: Option<PathBuf>,

    /// Active log file name
    pub file_name: String,

    /// Number of rotated log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            location: Location::default().key().to_string(),
            browser: BrowserConfig::default(),
            scroll: ScrollConfig::default(),
            database: DatabaseConfig::default(),
            snapshot: SnapshotConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: defaults::WEBDRIVER_URL.to_string(),
            browser: defaults::BROWSER.to_string(),
            headless: true,
            detail_timeout_ms: defaults::DETAIL_TIMEOUT_MS,
            banner_settle_ms: defaults::BANNER_SETTLE_MS,
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            max_iterations: defaults::SCROLL_MAX_ITERATIONS,
            stable_iterations: defaults::SCROLL_STABLE_ITERATIONS,
            pause_ms: defaults::SCROLL_PAUSE_MS,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = utils::data_dir().join(defaults::DATABASE_FILE);
        Self {
            url: format!("sqlite://{}", path.display()),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: utils::data_dir().join(defaults::SNAPSHOT_FILE),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: true,
            log_dir: None,
            file_name: defaults::LOG_FILE.to_string(),
            max_files: defaults::LOG_MAX_FILES,
            auto_cleanup_logs: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional file plus environment overrides.
    ///
    /// Without an explicit path, `warehouse-deals.{toml,json,yaml}` in the
    /// working directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        builder = match path {
            Some(path) => {
                info!("Loading configuration from {:?}", path);
                builder.add_source(config::File::from(path).required(true))
            }
            None => builder.add_source(config::File::with_name(defaults::CONFIG_FILE_STEM).required(false)),
        };

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        debug!("Configuration loaded: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scroll.max_iterations == 0 {
            return Err(ConfigError::Validation {
                message: "scroll.max_iterations must be greater than 0".to_string(),
            });
        }

        if self.scroll.stable_iterations == 0 {
            return Err(ConfigError::Validation {
                message: "scroll.stable_iterations must be greater than 0".to_string(),
            });
        }

        if self.browser.webdriver_url.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "browser.webdriver_url must not be empty".to_string(),
            });
        }

        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "database.url must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// The configured location, falling back to the first one.
    #[must_use]
    pub fn location(&self) -> Location {
        Location::parse_or_default(Some(&self.location))
    }
}

impl ScrollConfig {
    #[must_use]
    pub const fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

impl BrowserConfig {
    #[must_use]
    pub const fn detail_timeout(&self) -> Duration {
        Duration::from_millis(self.detail_timeout_ms)
    }

    #[must_use]
    pub const fn banner_settle(&self) -> Duration {
        Duration::from_millis(self.banner_settle_ms)
    }
}

/// Deals site constants
pub mod yep_savings {
    use crate::domain::Location;
    use url::Url;

    /// Site origin used for listing URLs and relative image references
    pub const BASE_URL: &str = "https://yepsavings.com";

    /// CSS selectors for the listing and detail pages
    pub mod selectors {
        /// One container per product; its id contains `productDesc`
        pub const PRODUCT_CONTAINER: &str = "div[id*='productDesc']";

        /// Title/price text node inside a container
        pub const BLOCK_TEXT: &str = "div.absolute.left-0.top-0.min-w-fit";

        pub const IMAGE: &str = "img";

        /// Candidate nodes for the "last updated" banner
        pub const LAST_UPDATE: &str = "div.flex.items-center";

        /// Text that identifies the "last updated" node among the candidates
        pub const LAST_UPDATE_MARKER: &str = "Updates";

        /// Close icon of the subscription overlay
        pub const BANNER_CLOSE: &str = "div.subscribe svg";

        pub const HISTORY_TABLE: &str = "table";
        pub const HISTORY_ROWS: &str = "tbody > tr";
        pub const HISTORY_CELLS: &str = "td";
    }

    /// Listing page for a location
    #[must_use]
    pub fn listing_url(location: Location) -> String {
        format!("{}/{}", BASE_URL, location.slug())
    }

    /// Resolve an image or link reference against the site origin.
    ///
    /// Absolute references are returned unchanged; an empty reference stays empty.
    #[must_use]
    pub fn resolve_url(reference: &str) -> String {
        let reference = reference.trim();
        if reference.is_empty() {
            return String::new();
        }
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return reference.to_string();
        }

        Url::parse(BASE_URL)
            .and_then(|base| base.join(reference))
            .map_or_else(|_| format!("{}{}", BASE_URL, reference), |url| url.to_string())
    }
}

/// Default values
pub mod defaults {
    /// Config file looked up in the working directory (any supported extension)
    pub const CONFIG_FILE_STEM: &str = "warehouse-deals";

    /// Application data directory name under the platform data dir
    pub const APP_DIR: &str = "warehouse-deals";

    pub const DATABASE_FILE: &str = "warehouse_deals.db";

    /// Snapshot of the last scraped batch
    pub const SNAPSHOT_FILE: &str = "lastScrape.json";

    pub const LOG_FILE: &str = "warehouse-deals.log";
    pub const LOG_MAX_FILES: u32 = 10;

    pub const WEBDRIVER_URL: &str = "http://localhost:4444";
    pub const BROWSER: &str = "firefox";

    pub const SCROLL_MAX_ITERATIONS: u32 = 60;
    pub const SCROLL_STABLE_ITERATIONS: u32 = 3;
    pub const SCROLL_PAUSE_MS: u64 = 500;

    pub const DETAIL_TIMEOUT_MS: u64 = 10_000;
    pub const BANNER_SETTLE_MS: u64 = 300;

    /// Age after which an unchanged price is recorded again
    pub const STALENESS_DAYS: i64 = 30;
}

/// Configuration utilities
pub mod utils {
    use super::defaults;
    use std::path::PathBuf;

    /// Platform data directory for the application, or `./warehouse-deals`.
    #[must_use]
    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(defaults::APP_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scroll.max_iterations, 60);
        assert_eq!(config.scroll.stable_iterations, 3);
        assert_eq!(config.scroll.pause(), Duration::from_millis(500));
        assert!(config.snapshot.path.ends_with("lastScrape.json"));
        assert_eq!(config.location(), Location::CalgaryBeaconHill);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() -> anyhow::Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(
            file,
            r#"
location = "on_ottawa_gloucester"

[scroll]
pause_ms = 10

[database]
url = "sqlite::memory:"
"#
        )?;

        let config = AppConfig::load(Some(file.path()))?;
        assert_eq!(config.location(), Location::OttawaGloucester);
        assert_eq!(config.scroll.pause_ms, 10);
        assert_eq!(config.scroll.max_iterations, 60);
        assert_eq!(config.database.url, "sqlite::memory:");
        Ok(())
    }

    #[test]
    fn test_validation_rejects_zero_cap() {
        let mut config = AppConfig::default();
        config.scroll.max_iterations = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(ConfigError::Load { .. })));
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            yep_savings::resolve_url("/images/123.jpg"),
            "https://yepsavings.com/images/123.jpg"
        );
        assert_eq!(
            yep_savings::resolve_url("https://cdn.example.com/a.png"),
            "https://cdn.example.com/a.png"
        );
        assert_eq!(yep_savings::resolve_url(""), "");
    }

    #[test]
    fn test_listing_url() {
        assert_eq!(
            yep_savings::listing_url(Location::SaskatoonSouth),
            "https://yepsavings.com/ca-sk-saskatoon-s-south-19"
        );
    }
}
