//! Domain module - Core business logic and entities
//!
//! This module contains the deal-tracking entities, value objects,
//! the price trend rules and the repository seams used by the
//! application layer.

pub mod labels;
pub mod location;
pub mod price_alert;
pub mod product;
pub mod progress;
pub mod repositories;
pub mod scraped_item;

// Re-export commonly used items for convenience
pub use labels::{Preference, ProductCategory};
pub use location::Location;
pub use price_alert::{AlertKind, AlertResult};
pub use product::{HistoryRow, NewObservation, NewProduct, PriceObservation, Product};
pub use progress::{NoProgress, ProgressFn, ProgressSink};
pub use repositories::{HistorySource, ProductRepository};
pub use scraped_item::{PriceText, ScrapedItem};
