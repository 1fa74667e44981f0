//! Raw per-block values produced by one scrape run.
//!
//! A [`ScrapedItem`] is transient: it lives for one run, is written to the
//! snapshot file, and feeds the upsert engine. Price-ish fields keep the text
//! exactly as it appeared on the page so the deal board can show it verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal used on the snapshot boundary for a value the parser could not determine.
pub const NOT_DETERMINED: &str = "NA";

/// Literal for a price that is only computed at checkout.
pub const AT_REGISTER: &str = "Discount at Register";

/// A price field as read from a listing block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PriceText {
    /// The matched layout did not yield this field.
    #[default]
    NotDetermined,
    /// The price exists but is only applied at the register.
    AtRegister,
    /// Raw text shown on the page, e.g. `"14.99"` or `"-$3.00"`.
    Shown(String),
}

impl PriceText {
    pub fn shown(text: impl Into<String>) -> Self {
        Self::Shown(text.into())
    }

    /// Raw text when the page actually showed a value.
    #[must_use]
    pub fn as_shown(&self) -> Option<&str> {
        match self {
            Self::Shown(text) => Some(text.as_str()),
            Self::NotDetermined | Self::AtRegister => None,
        }
    }

    #[must_use]
    pub const fn is_determined(&self) -> bool {
        !matches!(self, Self::NotDetermined)
    }
}

impl From<String> for PriceText {
    fn from(value: String) -> Self {
        match value.as_str() {
            NOT_DETERMINED | "" => Self::NotDetermined,
            AT_REGISTER => Self::AtRegister,
            _ => Self::Shown(value),
        }
    }
}

impl From<PriceText> for String {
    fn from(value: PriceText) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PriceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotDetermined => f.write_str(NOT_DETERMINED),
            Self::AtRegister => f.write_str(AT_REGISTER),
            Self::Shown(text) => f.write_str(text),
        }
    }
}

/// One parsed listing block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedItem {
    pub external_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_price: PriceText,
    #[serde(default)]
    pub discount: PriceText,
    #[serde(default)]
    pub final_price: PriceText,
    #[serde(default)]
    pub expiration: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ScrapedItem {
    pub fn new(external_id: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            ..Self::default()
        }
    }

    /// Display name, falling back to the undetermined literal.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(NOT_DETERMINED)
    }
}
