//! Warehouse Deals - Listing Scraper with Price History
//!
//! This application scrapes a warehouse's lazily loaded deals listing through
//! WebDriver, keeps a per-location price log in SQLite and flags price trends.

#![allow(clippy::uninlined_format_args)]

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::{DealBoard, DealWorkflow, RunReport, UpsertEngine};
use crate::infrastructure::{
    AppConfig, DatabaseConnection, SnapshotStore, SqliteProductRepository, WebDriverSession,
    init_logging_with_config, log_system_info,
};

/// Load configuration, scrape the configured location once and print a summary.
pub async fn run() -> Result<()> {
    let config = AppConfig::load(None).context("Failed to load configuration")?;
    init_logging_with_config(config.logging.clone())?;
    log_system_info(&config.logging);

    let report = scrape(&config).await?;
    print_summary(&report);
    Ok(())
}

/// One complete run against the configured WebDriver endpoint and store.
pub async fn scrape(config: &AppConfig) -> Result<RunReport> {
    let location = config.location();
    info!("Warehouse Deals starting for {}", location);

    let database = DatabaseConnection::new(&config.database.url).await?;
    database.migrate().await?;
    let repository = Arc::new(SqliteProductRepository::new(database.pool().clone()));

    let snapshot = SnapshotStore::new(config.snapshot.path.clone());
    let previous = snapshot.load().await;
    if !previous.is_empty() {
        info!("Previous run left {} items in the snapshot", previous.len());
    }

    let engine = Arc::new(UpsertEngine::new(repository.clone()));
    let workflow = DealWorkflow::new(engine, snapshot, config.browser.clone(), config.scroll.clone());

    let session = Arc::new(WebDriverSession::connect(&config.browser).await?);
    let report = workflow.run(session, location).await?;

    let board = DealBoard::new(repository);
    match board.refresh(location, &report.items).await {
        Ok(rows) => {
            let alerts = rows.iter().filter(|row| !row.alert.message.is_empty()).count();
            info!("{} deals with price alerts", alerts);
        }
        Err(e) => warn!("Could not build the deal board: {:#}", e),
    }

    Ok(report)
}

fn print_summary(report: &RunReport) {
    let summary = &report.summary;
    println!("Location:      {}", report.location);
    println!("Last update:   {}", report.last_update);
    println!("Items scraped: {} ({} blocks skipped)", report.items.len(), report.blocks_skipped);
    println!("New products:  {}", summary.created);
    println!("Backfilled:    {}", summary.backfilled);
    println!("Recorded:      {}", summary.recorded);
    println!("Unchanged:     {}", summary.unchanged);
}
