//! Listing scraper
//!
//! Drives one browser session through a location's listing page and turns the
//! product containers into [`ScrapedItem`]s. The extracted blocks are kept so
//! that history for newly seen products can be read from their detail windows
//! during the same run.

#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

use crate::domain::{HistoryRow, HistorySource, Location, ProgressSink, ScrapedItem};
use crate::infrastructure::browser::{
    BrowserError, BrowserSession, ScrollSummary, dismiss_banner, scroll_until_stable,
};
use crate::infrastructure::config::yep_savings::{self, selectors};
use crate::infrastructure::config::{BrowserConfig, ScrollConfig};
use crate::infrastructure::parsing::{
    BlockExtractor, ExtractedBlock, HistoryTableParser, ParsingResult, TextParser,
};

/// Result of scanning one listing page.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Parsed items in page order
    pub items: Vec<ScrapedItem>,
    /// "Last updated" text shown on the page
    pub last_update: Option<String>,
    pub scroll: ScrollSummary,
    pub blocks_seen: usize,
    pub blocks_skipped: usize,
}

pub struct ListingScraper {
    session: Arc<dyn BrowserSession>,
    text_parser: TextParser,
    extractor: BlockExtractor,
    history_parser: HistoryTableParser,
    browser_config: BrowserConfig,
    scroll_config: ScrollConfig,
    blocks: Mutex<Vec<ExtractedBlock>>,
}

impl ListingScraper {
    pub fn new(
        session: Arc<dyn BrowserSession>,
        browser_config: BrowserConfig,
        scroll_config: ScrollConfig,
    ) -> ParsingResult<Self> {
        Ok(Self {
            session,
            text_parser: TextParser::new(),
            extractor: BlockExtractor::new()?,
            history_parser: HistoryTableParser::new()?,
            browser_config,
            scroll_config,
            blocks: Mutex::new(Vec::new()),
        })
    }

    /// Load, scroll and parse the listing page for `location`.
    pub async fn scan(&self, location: Location, progress: &dyn ProgressSink) -> Result<ScanOutcome> {
        let url = yep_savings::listing_url(location);
        info!("Scanning {} ({})", location, url);

        self.session.goto(&url).await?;
        let initial_source = self.session.page_source().await?;
        let last_update = self.extractor.last_update(&initial_source);
        match &last_update {
            Some(text) => info!("Listing last updated: {}", text),
            None => warn!("Listing page shows no last update marker"),
        }

        let scroll = scroll_until_stable(self.session.as_ref(), &self.scroll_config, progress).await?;
        dismiss_banner(self.session.as_ref(), &self.browser_config).await;

        let source = self.session.page_source().await?;
        let blocks = self.extractor.extract(&source);

        let items: Vec<ScrapedItem> = blocks
            .iter()
            .filter_map(|block| {
                let mut item = self.text_parser.parse(&block.text)?;
                item.image_url = (!block.image_url.is_empty()).then(|| block.image_url.clone());
                Some(item)
            })
            .collect();

        let outcome = ScanOutcome {
            blocks_seen: blocks.len(),
            blocks_skipped: blocks.len() - items.len(),
            items,
            last_update,
            scroll,
        };
        info!(
            "Scanned {} blocks, parsed {} items, skipped {}",
            outcome.blocks_seen,
            outcome.items.len(),
            outcome.blocks_skipped
        );

        *self.blocks.lock().unwrap_or_else(PoisonError::into_inner) = blocks;
        Ok(outcome)
    }

    /// Block to open for `external_id`: an exact id line first, then any
    /// container mentioning the id.
    fn find_block(&self, external_id: &str) -> Option<ExtractedBlock> {
        let blocks = self.blocks.lock().unwrap_or_else(PoisonError::into_inner);
        blocks
            .iter()
            .find(|block| block.id_line() == Some(external_id))
            .or_else(|| blocks.iter().find(|block| block.container_text.contains(external_id)))
            .cloned()
    }

    async fn read_history(&self) -> Result<Vec<HistoryRow>> {
        let timeout = self.browser_config.detail_timeout();
        if !self.session.wait_for(selectors::HISTORY_TABLE, timeout).await? {
            debug!("No history table within {:?}", timeout);
            return Ok(Vec::new());
        }

        let source = self.session.page_source().await?;
        Ok(self.history_parser.parse(&source).unwrap_or_default())
    }
}

#[async_trait]
impl HistorySource for ListingScraper {
    async fn fetch_history(&self, external_id: &str) -> Result<Vec<HistoryRow>> {
        let Some(block) = self.find_block(external_id) else {
            debug!("No listing block for {}, skipping history", external_id);
            return Ok(Vec::new());
        };

        let timeout = self.browser_config.detail_timeout();
        match self
            .session
            .open_detail(selectors::PRODUCT_CONTAINER, block.index, timeout)
            .await
        {
            Ok(()) => {}
            Err(BrowserError::DetailTimeout(waited)) => {
                warn!("Detail window for {} did not open within {:?}", external_id, waited);
                let closed = self.session.close_stray_windows().await?;
                if closed > 0 {
                    warn!("Closed {} late detail windows after {}", closed, external_id);
                }
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        }

        let read = self.read_history().await;
        let closed = self.session.close_detail().await;

        match (read, closed) {
            (Ok(rows), Ok(())) => {
                debug!("Read {} history rows for {}", rows.len(), external_id);
                Ok(rows)
            }
            (Ok(_), Err(close_error)) => Err(close_error.into()),
            (Err(read_error), Ok(())) => Err(read_error),
            (Err(read_error), Err(close_error)) => {
                error!("Failed to close detail window for {}: {}", external_id, close_error);
                Err(read_error)
            }
        }
    }
}
