//! Listing and detail page parsing
//!
//! - [`text_parser`] decodes one block's free text into a [`ScrapedItem`](crate::domain::ScrapedItem)
//! - [`block_extractor`] finds product containers in the scrolled listing page
//! - [`history_table`] reads the price history table of a detail page
//! - [`price`] holds the decimal helpers shared by all of them

pub mod block_extractor;
pub mod history_table;
pub mod price;
pub mod text_parser;

pub use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
pub use block_extractor::{BlockExtractor, ExtractedBlock};
pub use history_table::HistoryTableParser;
pub use text_parser::{BlockLayout, TextParser};

use scraper::Selector;

/// Compile a selector, mapping failures into [`ParsingError`].
pub(crate) fn compile_selector(selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(selector, format!("{e:?}")))
}
