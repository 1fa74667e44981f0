//! Infrastructure layer for storage, browser automation, parsing and logging
//!
//! This module provides the SQLite store, the WebDriver session, the listing
//! and detail page parsers, configuration loading and logging setup.

pub mod browser;
pub mod config;
pub mod database_connection;
pub mod listing_scraper;
pub mod logging;
pub mod parsing;
pub mod parsing_error;
pub mod product_repository;
pub mod snapshot_store;

// Re-export commonly used items
pub use browser::{BrowserError, BrowserSession, WebDriverSession};
pub use config::{AppConfig, yep_savings};
pub use database_connection::DatabaseConnection;
pub use listing_scraper::{ListingScraper, ScanOutcome};
pub use logging::{get_log_directory, init_logging, init_logging_with_config, log_system_info};
pub use parsing::{ParsingError, ParsingResult, TextParser};
pub use product_repository::SqliteProductRepository;
pub use snapshot_store::SnapshotStore;
