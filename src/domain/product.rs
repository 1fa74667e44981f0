//! Product domain entities
//!
//! A [`Product`] is one external id at one location. Its price log is a list
//! of append-only [`PriceObservation`]s.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::labels::{Preference, ProductCategory};
use super::location::Location;

/// Persisted product identity, unique per `(external_id, location)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub external_id: String,
    /// Fixed at creation; later runs never overwrite it.
    pub name: String,
    pub category: ProductCategory,
    pub preference: Preference,
    pub location: Location,
}

/// Insert payload for a product seen for the first time at a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub external_id: String,
    pub name: String,
    pub category: ProductCategory,
    pub preference: Preference,
    pub location: Location,
}

/// One timestamped price record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub id: i64,
    pub product_id: i64,
    pub observed_at: DateTime<Utc>,
    pub full_price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub final_price: Option<Decimal>,
}

/// Observation queued for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewObservation {
    pub product_id: i64,
    pub observed_at: DateTime<Utc>,
    pub full_price: Option<Decimal>,
    /// Savings as a positive magnitude. The listing shows `-$3.00` and the
    /// history table `$3.00` for the same saving; both are stored as `3.00`.
    pub discount: Option<Decimal>,
    pub final_price: Option<Decimal>,
}

impl NewObservation {
    /// Backfill record for one row of a product's history table.
    #[must_use]
    pub fn from_history(product_id: i64, row: &HistoryRow) -> Self {
        Self {
            product_id,
            observed_at: row.observed_at(),
            full_price: row.full_price(),
            discount: row.savings,
            final_price: row.final_price,
        }
    }
}

/// One row of a product's historical price table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub date: NaiveDate,
    pub final_price: Option<Decimal>,
    pub savings: Option<Decimal>,
}

impl HistoryRow {
    /// `final_price + savings`, only when both are present.
    #[must_use]
    pub fn full_price(&self) -> Option<Decimal> {
        Some(self.final_price? + self.savings?)
    }

    /// Midnight UTC of the row's date.
    #[must_use]
    pub fn observed_at(&self) -> DateTime<Utc> {
        self.date.and_time(chrono::NaiveTime::MIN).and_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn row(final_price: Option<i64>, savings: Option<i64>) -> HistoryRow {
        HistoryRow {
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            final_price: final_price.map(|cents| Decimal::new(cents, 2)),
            savings: savings.map(|cents| Decimal::new(cents, 2)),
        }
    }

    #[test]
    fn test_full_price_requires_both_parts() {
        assert_eq!(row(Some(1199), Some(300)).full_price(), Some(Decimal::new(1499, 2)));
        assert_eq!(row(Some(1199), None).full_price(), None);
        assert_eq!(row(None, Some(300)).full_price(), None);
    }

    #[test]
    fn test_backfill_observation_uses_row_date() {
        let history = row(Some(899), Some(100));
        let observation = NewObservation::from_history(7, &history);

        assert_eq!(observation.product_id, 7);
        assert_eq!(observation.observed_at.to_rfc3339(), "2025-03-14T00:00:00+00:00");
        assert_eq!(observation.discount, Some(Decimal::new(100, 2)));
        assert_eq!(observation.full_price, Some(Decimal::new(999, 2)));
    }
}
