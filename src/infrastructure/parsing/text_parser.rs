//! Heuristic decoder for listing block text.
//!
//! A block's text is one external id line followed by merged title, price and
//! promotion lines in one of four layouts. The layout is chosen by a
//! case-insensitive marker search over the lines after the id, in this order:
//!
//! 1. `REGULAR PRICE` - per-unit price with an in-store rebate
//! 2. `LESS IN-STORE REBATE` - rebate amount only
//! 3. `PRICE AT REGISTER` - regular price, instant savings and expiry lines
//! 4. anything else - clearance pricing where `.97` marks the sale price and
//!    `.99` the reference price
//!
//! Fields a layout does not determine stay [`PriceText::NotDetermined`] or
//! `None`. A block that cannot be decoded yields no item.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::price::{clean_price, is_decimal};
use crate::domain::{PriceText, ScrapedItem};
use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};

const REGULAR_PRICE: &str = "REGULAR PRICE";
const IN_STORE_REBATE: &str = "LESS IN-STORE REBATE";
const PRICE_AT_REGISTER: &str = "PRICE AT REGISTER";
const EXPIRY_PREFIX: &str = "EXP.";

static OFF_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bOFF\b").expect("off pattern compiles"));

/// Block layouts, in matching precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockLayout {
    RegularPrice,
    InStoreRebate,
    PriceAtRegister,
    Clearance,
}

impl BlockLayout {
    /// Pick the layout for the lines following the id line.
    pub fn classify(lines: &[&str]) -> Self {
        let upper = lines.join(" ").to_uppercase();
        if upper.contains(REGULAR_PRICE) {
            Self::RegularPrice
        } else if upper.contains(IN_STORE_REBATE) {
            Self::InStoreRebate
        } else if upper.contains(PRICE_AT_REGISTER) {
            Self::PriceAtRegister
        } else {
            Self::Clearance
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextParser;

impl TextParser {
    pub fn new() -> Self {
        Self
    }

    /// Decode one block. Blank input and undecodable blocks yield `None`.
    pub fn parse(&self, raw: &str) -> Option<ScrapedItem> {
        let lines: Vec<&str> = raw.split('\n').map(str::trim).filter(|l| !l.is_empty()).collect();
        let (&external_id, rest) = lines.split_first()?;

        let layout = BlockLayout::classify(rest);
        debug!("Block {} classified as {:?}", external_id, layout);

        let mut item = ScrapedItem::new(external_id);
        let decoded = match layout {
            BlockLayout::RegularPrice => {
                decode_regular_price(&lines, &mut item);
                Ok(())
            }
            BlockLayout::InStoreRebate => {
                decode_in_store_rebate(rest, &mut item);
                Ok(())
            }
            BlockLayout::PriceAtRegister => {
                decode_price_at_register(&lines, &mut item);
                Ok(())
            }
            BlockLayout::Clearance => decode_clearance(rest, &mut item),
        };

        match decoded {
            Ok(()) => {
                debug!("Parsed {}: {} -> {}", item.external_id, item.display_name(), item.final_price);
                Some(item)
            }
            Err(e) => {
                warn!("Skipping block {}: {}", external_id, e);
                None
            }
        }
    }
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Lines up to, not including, the first one containing `marker`.
fn name_before(lines: &[&str], marker: &str) -> Option<String> {
    let taken: Vec<&str> = lines
        .iter()
        .copied()
        .take_while(|line| !line.to_uppercase().contains(marker))
        .collect();
    non_empty(taken.join(" "))
}

fn decode_regular_price(lines: &[&str], item: &mut ScrapedItem) {
    item.name = name_before(&lines[1..], IN_STORE_REBATE);

    let price_lines: Vec<&str> = lines.iter().copied().filter(|line| line.contains('$')).collect();
    if let [discount, full_price, ..] = price_lines.as_slice() {
        item.discount = PriceText::shown(clean_price(discount));
        item.full_price = PriceText::shown(clean_price(full_price));
        item.final_price = PriceText::AtRegister;
    }
}

fn decode_in_store_rebate(rest: &[&str], item: &mut ScrapedItem) {
    item.name = name_before(rest, IN_STORE_REBATE);
    item.final_price = PriceText::AtRegister;
    item.discount = rest
        .iter()
        .find(|line| line.contains('$') || OFF_TOKEN.is_match(line))
        .map_or(PriceText::NotDetermined, |line| PriceText::shown(line.trim()));
}

fn decode_price_at_register(lines: &[&str], item: &mut ScrapedItem) {
    // Index 1 is the title, so the regular price is searched from index 2.
    let price_index = lines
        .iter()
        .enumerate()
        .skip(2)
        .find(|(_, line)| is_decimal(line))
        .map(|(index, _)| index);

    let full_price_line = price_index.map(|index| {
        item.name = non_empty(lines[1..index].join(" "));
        item.full_price = PriceText::shown(clean_price(lines[index]));
        lines[index]
    });

    for &line in &lines[1..] {
        let has_expiry_prefix = line
            .get(..EXPIRY_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(EXPIRY_PREFIX));

        if has_expiry_prefix {
            item.expiration = non_empty(line.get(EXPIRY_PREFIX.len()..).unwrap_or_default().to_string());
        } else if line.starts_with('-') {
            item.discount = PriceText::shown(line);
        } else if is_decimal(line) && Some(line) != full_price_line {
            item.final_price = PriceText::shown(line);
        }
    }
}

fn decode_clearance(rest: &[&str], item: &mut ScrapedItem) -> ParsingResult<()> {
    let upper = rest.join(" ").to_uppercase();
    let words: Vec<&str> = upper.split_whitespace().collect();
    let prices: Vec<&str> = words
        .iter()
        .copied()
        .filter(|word| (word.ends_with(".97") || word.ends_with(".99")) && is_decimal(word))
        .collect();

    match prices.as_slice() {
        [] => {}
        [only] => {
            item.final_price = PriceText::shown(*only);
            item.name = match rest {
                [sole] => non_empty((*sole).to_string()),
                [head @ .., _last] => non_empty(head.join(" ")),
                [] => None,
            };
        }
        many => {
            let sale = many.iter().find(|p| p.ends_with(".97")).ok_or(ParsingError::MissingPricePair {
                found: many.len(),
                missing: ".97",
            })?;
            let reference = many.iter().find(|p| p.ends_with(".99")).ok_or(ParsingError::MissingPricePair {
                found: many.len(),
                missing: ".99",
            })?;

            item.final_price = PriceText::shown(*sale);
            item.full_price = PriceText::shown(*reference);
            item.name = non_empty(words[..words.len() - 2].join(" "));
        }
    }

    Ok(())
}
