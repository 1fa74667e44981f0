//! Parsing error types for listing and detail pages
//!
//! Errors raised while decoding a single block never abort a batch; callers
//! log them and move on to the next block.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Clearance block has {found} candidate prices but no '{missing}' price")]
    MissingPricePair { found: usize, missing: &'static str },

    #[error("History row {row} is malformed: {reason}")]
    MalformedHistoryRow { row: usize, reason: String },
}

impl ParsingError {
    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed_row(row: usize, reason: impl Into<String>) -> Self {
        Self::MalformedHistoryRow {
            row,
            reason: reason.into(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
