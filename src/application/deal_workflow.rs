//! One scrape run for one location
//!
//! scan → upsert → snapshot, with the browser session shut down on every
//! exit path once the run has started.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::progress::ProgressChannels;
use super::upsert_engine::{UpsertEngine, UpsertSummary};
use crate::domain::{Location, ScrapedItem};
use crate::infrastructure::browser::{BrowserSession, ScrollSummary};
use crate::infrastructure::config::{BrowserConfig, ScrollConfig};
use crate::infrastructure::{ListingScraper, SnapshotStore};

/// "Last updated" marker captured from the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LastUpdate {
    Captured(String),
    Unavailable,
}

impl From<Option<String>> for LastUpdate {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Unavailable, Self::Captured)
    }
}

impl std::fmt::Display for LastUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Captured(text) => f.write_str(text),
            Self::Unavailable => f.write_str("unavailable"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub location: Location,
    pub last_update: LastUpdate,
    pub items: Vec<ScrapedItem>,
    pub summary: UpsertSummary,
    pub scroll: ScrollSummary,
    pub blocks_skipped: usize,
}

pub struct DealWorkflow {
    engine: Arc<UpsertEngine>,
    snapshot: SnapshotStore,
    progress: Arc<ProgressChannels>,
    browser_config: BrowserConfig,
    scroll_config: ScrollConfig,
}

impl DealWorkflow {
    pub fn new(
        engine: Arc<UpsertEngine>,
        snapshot: SnapshotStore,
        browser_config: BrowserConfig,
        scroll_config: ScrollConfig,
    ) -> Self {
        Self {
            engine,
            snapshot,
            progress: Arc::new(ProgressChannels::new()),
            browser_config,
            scroll_config,
        }
    }

    pub fn progress(&self) -> &Arc<ProgressChannels> {
        &self.progress
    }

    pub fn engine(&self) -> &Arc<UpsertEngine> {
        &self.engine
    }

    /// Scrape `location` with `session` and persist the result.
    ///
    /// The session is shut down whether or not the run succeeds. The snapshot
    /// is only written after a successful upsert.
    pub async fn run(&self, session: Arc<dyn BrowserSession>, location: Location) -> Result<RunReport> {
        self.progress.reset();
        info!("Starting run for {}", location);

        let outcome = self.scan_and_upsert(Arc::clone(&session), location).await;
        let shutdown = session.shutdown().await;

        let report = match (outcome, shutdown) {
            (Ok(report), Ok(())) => report,
            (Ok(report), Err(e)) => {
                warn!("Browser session did not shut down cleanly: {}", e);
                report
            }
            (Err(e), shutdown) => {
                if let Err(shutdown_error) = shutdown {
                    error!("Browser shutdown after failed run also failed: {}", shutdown_error);
                }
                error!("Run for {} failed: {:#}", location, e);
                return Err(e);
            }
        };

        self.snapshot
            .save(&report.items)
            .await
            .context("Failed to write last scrape snapshot")?;

        info!(
            "Run for {} finished: {} items, {} new observations (last update: {})",
            location,
            report.items.len(),
            report.summary.inserted(),
            report.last_update
        );
        Ok(report)
    }

    async fn scan_and_upsert(&self, session: Arc<dyn BrowserSession>, location: Location) -> Result<RunReport> {
        let scraper = ListingScraper::new(session, self.browser_config.clone(), self.scroll_config.clone())?;

        let outcome = scraper
            .scan(location, &self.progress.scan)
            .await
            .with_context(|| format!("Failed to scan listing for {}", location))?;

        let summary = self
            .engine
            .upsert_batch(location, &outcome.items, &scraper, &self.progress.history)
            .await?;

        Ok(RunReport {
            location,
            last_update: outcome.last_update.into(),
            items: outcome.items,
            summary,
            scroll: outcome.scroll,
            blocks_skipped: outcome.blocks_skipped,
        })
    }
}
