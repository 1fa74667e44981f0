//! Upsert of a scraped batch into the product store
//!
//! Items are processed one at a time in extraction order. Products seen for
//! the first time at a location are created immediately and backfilled from
//! their history table; every item then records a new observation when its
//! final price changed or the latest record went stale. All observations of
//! a batch are written in one transaction at the end.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::domain::progress::percent_of;
use crate::domain::{
    HistorySource, Location, NewObservation, NewProduct, PriceObservation, Product,
    ProductRepository, ProgressSink, ScrapedItem,
};
use crate::infrastructure::config::defaults;
use crate::infrastructure::parsing::price::price_value;

/// Counts for one processed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpsertSummary {
    pub items: usize,
    /// Products created in this batch
    pub created: usize,
    /// Observations taken from history tables
    pub backfilled: usize,
    /// Observations recorded from the scraped prices
    pub recorded: usize,
    /// Items whose price matched a recent observation
    pub unchanged: usize,
}

impl UpsertSummary {
    #[must_use]
    pub const fn inserted(&self) -> usize {
        self.backfilled + self.recorded
    }
}

/// Most recent record of a product, stored or queued.
#[derive(Debug, Clone, Copy)]
struct Latest {
    observed_at: DateTime<Utc>,
    final_price: Option<Decimal>,
}

impl From<&PriceObservation> for Latest {
    fn from(observation: &PriceObservation) -> Self {
        Self {
            observed_at: observation.observed_at,
            final_price: observation.final_price,
        }
    }
}

impl From<&NewObservation> for Latest {
    fn from(observation: &NewObservation) -> Self {
        Self {
            observed_at: observation.observed_at,
            final_price: observation.final_price,
        }
    }
}

pub struct UpsertEngine {
    repository: Arc<dyn ProductRepository>,
    staleness: Duration,
    last_scraped: watch::Sender<Arc<Vec<ScrapedItem>>>,
}

impl UpsertEngine {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self::with_staleness(repository, Duration::days(defaults::STALENESS_DAYS))
    }

    pub fn with_staleness(repository: Arc<dyn ProductRepository>, staleness: Duration) -> Self {
        Self {
            repository,
            staleness,
            last_scraped: watch::channel(Arc::new(Vec::new())).0,
        }
    }

    pub fn repository(&self) -> &Arc<dyn ProductRepository> {
        &self.repository
    }

    /// Batch most recently handed to [`upsert_batch`](Self::upsert_batch).
    pub fn last_scraped(&self) -> Arc<Vec<ScrapedItem>> {
        self.last_scraped.borrow().clone()
    }

    pub fn subscribe_last_scraped(&self) -> watch::Receiver<Arc<Vec<ScrapedItem>>> {
        self.last_scraped.subscribe()
    }

    /// Process a batch for `location`.
    ///
    /// The batch becomes the last scraped snapshot before anything is
    /// persisted, so it is kept even when persistence fails.
    pub async fn upsert_batch(
        &self,
        location: Location,
        items: &[ScrapedItem],
        history: &dyn HistorySource,
        progress: &dyn ProgressSink,
    ) -> Result<UpsertSummary> {
        self.last_scraped.send_replace(Arc::new(items.to_vec()));

        let now = Utc::now();
        let total = items.len();
        let mut summary = UpsertSummary {
            items: total,
            ..UpsertSummary::default()
        };
        let mut pending: Vec<NewObservation> = Vec::new();

        for item in items {
            let product = match self.repository.find_product(&item.external_id, location).await? {
                Some(product) => product,
                None => {
                    let product = self.create_product(item, location).await?;
                    summary.created += 1;

                    let rows = history
                        .fetch_history(&item.external_id)
                        .await
                        .with_context(|| format!("Failed to read history for {}", item.external_id))?;
                    pending.extend(rows.iter().map(|row| NewObservation::from_history(product.id, row)));
                    summary.backfilled += rows.len();

                    progress.report(percent_of(summary.created, total));
                    product
                }
            };

            let candidate = NewObservation {
                product_id: product.id,
                observed_at: now,
                full_price: price_value(&item.full_price),
                discount: price_value(&item.discount).map(|d| d.abs()),
                final_price: price_value(&item.final_price),
            };

            let stored = self.repository.latest_observation(product.id).await?;
            let latest = latest_of(stored.as_ref().map(Latest::from), &pending, product.id);

            if self.should_record(latest, &candidate) {
                debug!("Recording {} at {:?}", item.external_id, candidate.final_price);
                pending.push(candidate);
                summary.recorded += 1;
            } else {
                summary.unchanged += 1;
            }
        }

        self.repository
            .insert_observations(&pending)
            .await
            .context("Failed to persist price observations")?;
        progress.report(100);

        info!(
            "Upserted {} items for {}: {} created, {} backfilled, {} recorded, {} unchanged",
            summary.items, location, summary.created, summary.backfilled, summary.recorded, summary.unchanged
        );
        Ok(summary)
    }

    async fn create_product(&self, item: &ScrapedItem, location: Location) -> Result<Product> {
        let template = self.repository.find_template(&item.external_id, location).await?;
        let (category, preference) = template
            .map(|t| (t.category, t.preference))
            .unwrap_or_default();

        let product = self
            .repository
            .create_product(&NewProduct {
                external_id: item.external_id.clone(),
                name: item.display_name().to_string(),
                category,
                preference,
                location,
            })
            .await?;

        debug!("Created product {} ({}) at {}", product.external_id, product.name, location);
        Ok(product)
    }

    fn should_record(&self, latest: Option<Latest>, candidate: &NewObservation) -> bool {
        match latest {
            None => true,
            Some(latest) => {
                latest.final_price != candidate.final_price || candidate.observed_at - latest.observed_at > self.staleness
            }
        }
    }
}

fn latest_of(stored: Option<Latest>, pending: &[NewObservation], product_id: i64) -> Option<Latest> {
    pending
        .iter()
        .filter(|o| o.product_id == product_id)
        .map(Latest::from)
        .chain(stored)
        .max_by_key(|latest| latest.observed_at)
}
