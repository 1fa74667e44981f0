//! Repository interfaces for deal tracking
//!
//! Contains the persistence and history-lookup seams used by the
//! application layer.

use async_trait::async_trait;
use anyhow::Result;

use crate::domain::labels::{Preference, ProductCategory};
use crate::domain::location::Location;
use crate::domain::product::{HistoryRow, NewObservation, NewProduct, PriceObservation, Product};

#[async_trait]
pub trait ProductRepository: Send + Sync {
    // Product identity
    async fn find_product(&self, external_id: &str, location: Location) -> Result<Option<Product>>;
    /// First product with this external id at any location other than `location`.
    async fn find_template(&self, external_id: &str, location: Location) -> Result<Option<Product>>;
    async fn create_product(&self, product: &NewProduct) -> Result<Product>;
    async fn products_for_location(&self, location: Location) -> Result<Vec<Product>>;

    // User-editable state
    async fn update_category(&self, product_id: i64, category: ProductCategory) -> Result<bool>;
    async fn update_preference(&self, product_id: i64, preference: Preference) -> Result<bool>;

    // Price log
    async fn latest_observation(&self, product_id: i64) -> Result<Option<PriceObservation>>;
    async fn observations_for(&self, product_id: i64) -> Result<Vec<PriceObservation>>;
    /// Appends all observations in one transaction.
    async fn insert_observations(&self, observations: &[NewObservation]) -> Result<()>;
}

/// Source of a product's historical price table.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Rows for `external_id` in page order. Empty when the product has no
    /// history available.
    async fn fetch_history(&self, external_id: &str) -> Result<Vec<HistoryRow>>;
}
