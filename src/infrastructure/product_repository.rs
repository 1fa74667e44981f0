//! SQLite implementation of the product repository
//!
//! Prices are stored as decimal text so values round-trip exactly, and
//! timestamps as fixed-width RFC 3339 UTC text so that lexical order in
//! SQL equals chronological order.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::domain::labels::{Preference, ProductCategory};
use crate::domain::location::Location;
use crate::domain::product::{NewObservation, NewProduct, PriceObservation, Product};
use crate::domain::repositories::ProductRepository;

const PRODUCT_COLUMNS: &str = "id, external_id, name, category, preference, location";
const OBSERVATION_COLUMNS: &str = "id, product_id, observed_at, full_price, discount, final_price";

#[derive(Clone)]
pub struct SqliteProductRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

pub(crate) fn encode_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn encode_decimal(value: Option<Decimal>) -> Option<String> {
    value.map(|d| d.normalize().to_string())
}

fn decode_decimal(row: &SqliteRow, column: &str) -> Result<Option<Decimal>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|text| {
        Decimal::from_str(&text).with_context(|| format!("Invalid decimal '{}' in column {}", text, column))
    })
    .transpose()
}

fn map_product(row: &SqliteRow) -> Result<Product> {
    let category: String = row.try_get("category")?;
    let preference: String = row.try_get("preference")?;
    let location: String = row.try_get("location")?;

    Ok(Product {
        id: row.try_get("id")?,
        external_id: row.try_get("external_id")?,
        name: row.try_get("name")?,
        category: ProductCategory::from_key(&category).unwrap_or_default(),
        preference: Preference::from_key(&preference).unwrap_or_default(),
        location: Location::from_key(&location).ok_or_else(|| anyhow!("Unknown location key '{}'", location))?,
    })
}

fn map_observation(row: &SqliteRow) -> Result<PriceObservation> {
    let observed_at: String = row.try_get("observed_at")?;
    let observed_at = DateTime::parse_from_rfc3339(&observed_at)
        .with_context(|| format!("Invalid timestamp '{}'", observed_at))?
        .with_timezone(&Utc);

    Ok(PriceObservation {
        id: row.try_get("id")?,
        product_id: row.try_get("product_id")?,
        observed_at,
        full_price: decode_decimal(row, "full_price")?,
        discount: decode_decimal(row, "discount")?,
        final_price: decode_decimal(row, "final_price")?,
    })
}

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    async fn find_product(&self, external_id: &str, location: Location) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM products WHERE external_id = ? AND location = ?",
            PRODUCT_COLUMNS
        ))
        .bind(external_id)
        .bind(location.key())
        .fetch_optional(&*self.pool)
        .await?;

        row.as_ref().map(map_product).transpose()
    }

    async fn find_template(&self, external_id: &str, location: Location) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM products WHERE external_id = ? AND location <> ? ORDER BY id LIMIT 1",
            PRODUCT_COLUMNS
        ))
        .bind(external_id)
        .bind(location.key())
        .fetch_optional(&*self.pool)
        .await?;

        row.as_ref().map(map_product).transpose()
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product> {
        let result = sqlx::query(
            r#"
            INSERT INTO products (external_id, name, category, preference, location)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.external_id)
        .bind(&product.name)
        .bind(product.category.key())
        .bind(product.preference.key())
        .bind(product.location.key())
        .execute(&*self.pool)
        .await
        .with_context(|| format!("Failed to create product {} at {}", product.external_id, product.location))?;

        let id = result.last_insert_rowid();
        debug!("Created product {} ({}) with id {}", product.external_id, product.location.key(), id);

        Ok(Product {
            id,
            external_id: product.external_id.clone(),
            name: product.name.clone(),
            category: product.category,
            preference: product.preference,
            location: product.location,
        })
    }

    async fn products_for_location(&self, location: Location) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM products WHERE location = ? ORDER BY id",
            PRODUCT_COLUMNS
        ))
        .bind(location.key())
        .fetch_all(&*self.pool)
        .await?;

        rows.iter().map(map_product).collect()
    }

    async fn update_category(&self, product_id: i64, category: ProductCategory) -> Result<bool> {
        let result = sqlx::query("UPDATE products SET category = ? WHERE id = ?")
            .bind(category.key())
            .bind(product_id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_preference(&self, product_id: i64, preference: Preference) -> Result<bool> {
        let result = sqlx::query("UPDATE products SET preference = ? WHERE id = ?")
            .bind(preference.key())
            .bind(product_id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn latest_observation(&self, product_id: i64) -> Result<Option<PriceObservation>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM price_observations WHERE product_id = ? ORDER BY observed_at DESC, id DESC LIMIT 1",
            OBSERVATION_COLUMNS
        ))
        .bind(product_id)
        .fetch_optional(&*self.pool)
        .await?;

        row.as_ref().map(map_observation).transpose()
    }

    async fn observations_for(&self, product_id: i64) -> Result<Vec<PriceObservation>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM price_observations WHERE product_id = ? ORDER BY observed_at ASC, id ASC",
            OBSERVATION_COLUMNS
        ))
        .bind(product_id)
        .fetch_all(&*self.pool)
        .await?;

        rows.iter().map(map_observation).collect()
    }

    async fn insert_observations(&self, observations: &[NewObservation]) -> Result<()> {
        if observations.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for observation in observations {
            sqlx::query(
                r#"
                INSERT INTO price_observations (product_id, observed_at, full_price, discount, final_price)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(observation.product_id)
            .bind(encode_timestamp(observation.observed_at))
            .bind(encode_decimal(observation.full_price))
            .bind(encode_decimal(observation.discount))
            .bind(encode_decimal(observation.final_price))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!("Inserted {} price observations", observations.len());
        Ok(())
    }
}
