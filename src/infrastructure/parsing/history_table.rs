//! Price history table on a product's detail page

#![allow(clippy::uninlined_format_args)]

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::block_extractor::inner_text;
use super::price::parse_price;
use super::{ParsingError, ParsingResult, compile_selector};
use crate::domain::HistoryRow;
use crate::infrastructure::config::yep_savings::selectors;

/// Date layouts seen in history tables.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%b %d, %Y", "%B %d, %Y", "%d %b %Y", "%Y/%m/%d"];

/// Columns are `[date, _, savings, final_price]`.
const MIN_CELLS: usize = 4;

pub struct HistoryTableParser {
    table: Selector,
    rows: Selector,
    cells: Selector,
}

impl HistoryTableParser {
    pub fn new() -> ParsingResult<Self> {
        Ok(Self {
            table: compile_selector(selectors::HISTORY_TABLE)?,
            rows: compile_selector(selectors::HISTORY_ROWS)?,
            cells: compile_selector(selectors::HISTORY_CELLS)?,
        })
    }

    /// Rows of the first history table, header row excluded.
    ///
    /// `None` when the page has no table at all. Malformed rows are skipped.
    pub fn parse(&self, html: &str) -> Option<Vec<HistoryRow>> {
        let document = Html::parse_document(html);
        let table = document.select(&self.table).next()?;

        let rows: Vec<ElementRef<'_>> = table.select(&self.rows).collect();
        if rows.len() <= 1 {
            debug!("History table has {} rows, nothing to read", rows.len());
            return Some(Vec::new());
        }

        let parsed: Vec<HistoryRow> = rows
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(index, row)| match self.parse_row(index, *row) {
                Ok(row) => Some(row),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            })
            .collect();

        debug!("Read {} history rows", parsed.len());
        Some(parsed)
    }

    fn parse_row(&self, index: usize, row: ElementRef<'_>) -> ParsingResult<HistoryRow> {
        let cells: Vec<String> = row.select(&self.cells).map(|cell| inner_text(cell).replace('\n', " ")).collect();
        if cells.len() < MIN_CELLS {
            return Err(ParsingError::malformed_row(
                index,
                format!("expected {} cells, found {}", MIN_CELLS, cells.len()),
            ));
        }

        let date = parse_date(&cells[0])
            .ok_or_else(|| ParsingError::malformed_row(index, format!("unrecognized date '{}'", cells[0])))?;

        Ok(HistoryRow {
            date,
            savings: cell_price(&cells[2]),
            final_price: cell_price(&cells[3]),
        })
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

/// A dash marks a missing value.
fn cell_price(text: &str) -> Option<Decimal> {
    match text.trim() {
        "" | "-" | "–" => None,
        value => parse_price(value),
    }
}
