//! Deal board
//!
//! Joins the last scraped batch with the stored products of a location into
//! display rows. Rows carry the scraped price texts verbatim, the user's
//! category and preference, the previous price found in history, and the
//! trend alert. Refreshed rows are published on a `watch` channel.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::price_alert::evaluate_observations;
use crate::domain::{
    AlertResult, Location, PriceObservation, PriceText, Preference, ProductCategory, ProductRepository,
    ScrapedItem,
};

/// Shown when history holds fewer than two priced observations.
pub const NOT_FOUND: &str = "Not Found";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealRow {
    pub product_id: i64,
    pub external_id: String,
    pub name: String,
    pub full_price: PriceText,
    pub discount: PriceText,
    pub final_price: PriceText,
    pub expiration: Option<String>,
    pub image_url: Option<String>,
    pub last_price_found: String,
    pub category: ProductCategory,
    pub preference: Preference,
    pub in_shopping_list: bool,
    pub alert: AlertResult,
}

/// Row filter; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealFilter {
    /// Case-insensitive substring of the name
    pub name: Option<String>,
    pub category: Option<ProductCategory>,
    pub preference: Option<Preference>,
}

impl DealFilter {
    #[must_use]
    pub fn matches(&self, row: &DealRow) -> bool {
        let name_matches = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .is_none_or(|needle| row.name.to_lowercase().contains(&needle.to_lowercase()));

        name_matches
            && self.category.is_none_or(|category| row.category == category)
            && self.preference.is_none_or(|preference| row.preference == preference)
    }
}

/// Second most recent priced observation, two decimals, else [`NOT_FOUND`].
#[must_use]
pub fn last_price_found(observations: &[PriceObservation]) -> String {
    let mut priced: Vec<(chrono::DateTime<chrono::Utc>, Decimal)> = observations
        .iter()
        .filter_map(|o| o.final_price.map(|price| (o.observed_at, price)))
        .collect();
    priced.sort_by_key(|(observed_at, _)| *observed_at);

    match priced.as_slice() {
        [.., (_, previous), _] => format!("{:.2}", previous.round_dp(2)),
        _ => NOT_FOUND.to_string(),
    }
}

pub struct DealBoard {
    repository: Arc<dyn ProductRepository>,
    rows: watch::Sender<Arc<Vec<DealRow>>>,
}

impl DealBoard {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self {
            repository,
            rows: watch::channel(Arc::new(Vec::new())).0,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<DealRow>>> {
        self.rows.subscribe()
    }

    pub fn rows(&self) -> Arc<Vec<DealRow>> {
        self.rows.borrow().clone()
    }

    /// Rebuild the rows for `location` from a scraped batch.
    ///
    /// Items without a stored product are skipped. Rows keep the batch order.
    pub async fn refresh(&self, location: Location, items: &[ScrapedItem]) -> Result<Arc<Vec<DealRow>>> {
        let products: HashMap<String, _> = self
            .repository
            .products_for_location(location)
            .await?
            .into_iter()
            .map(|product| (product.external_id.clone(), product))
            .collect();

        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let Some(product) = products.get(&item.external_id) else {
                warn!("No stored product for {} at {}", item.external_id, location);
                continue;
            };

            let observations = self.repository.observations_for(product.id).await?;
            rows.push(DealRow {
                product_id: product.id,
                external_id: item.external_id.clone(),
                name: item.name.clone().unwrap_or_else(|| product.name.clone()),
                full_price: item.full_price.clone(),
                discount: item.discount.clone(),
                final_price: item.final_price.clone(),
                expiration: item.expiration.clone(),
                image_url: item.image_url.clone(),
                last_price_found: last_price_found(&observations),
                category: product.category,
                preference: product.preference,
                in_shopping_list: product.preference == Preference::AlwaysBuy,
                alert: evaluate_observations(&observations),
            });
        }

        info!("Deal board for {} has {} rows", location, rows.len());
        let rows = Arc::new(rows);
        self.rows.send_replace(Arc::clone(&rows));
        Ok(rows)
    }

    #[must_use]
    pub fn filtered(&self, filter: &DealFilter) -> Vec<DealRow> {
        self.rows.borrow().iter().filter(|row| filter.matches(row)).cloned().collect()
    }

    #[must_use]
    pub fn shopping_list(&self) -> Vec<DealRow> {
        self.rows.borrow().iter().filter(|row| row.in_shopping_list).cloned().collect()
    }

    pub async fn set_category(&self, product_id: i64, category: ProductCategory) -> Result<()> {
        if !self.repository.update_category(product_id, category).await? {
            return Err(anyhow!("Product {} does not exist", product_id));
        }
        self.update_row(product_id, |row| row.category = category);
        debug!("Product {} category set to {}", product_id, category);
        Ok(())
    }

    pub async fn set_preference(&self, product_id: i64, preference: Preference) -> Result<()> {
        if !self.repository.update_preference(product_id, preference).await? {
            return Err(anyhow!("Product {} does not exist", product_id));
        }
        self.update_row(product_id, |row| row.preference = preference);
        debug!("Product {} preference set to {}", product_id, preference);
        Ok(())
    }

    /// Toggle shopping list membership for the current rows only.
    pub fn set_in_shopping_list(&self, product_id: i64, in_list: bool) {
        self.update_row(product_id, |row| row.in_shopping_list = in_list);
    }

    fn update_row(&self, product_id: i64, apply: impl Fn(&mut DealRow)) {
        self.rows.send_if_modified(|rows| {
            let mut updated = rows.as_ref().clone();
            let mut modified = false;
            for row in updated.iter_mut().filter(|row| row.product_id == product_id) {
                apply(row);
                modified = true;
            }
            if modified {
                *rows = Arc::new(updated);
            }
            modified
        });
    }
}
