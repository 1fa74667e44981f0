//! Price text helpers.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::domain::PriceText;

/// Plain decimal with optional sign and `,` thousands groups, e.g. `-1,299.99`.
static DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d{1,3}(?:,\d{3})+|\d+)?(?:\.\d+)?$").expect("decimal pattern compiles")
});

/// Label and unit noise removed from per-unit prices.
static PRICE_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\$|regular\s+price:|/\s*kg").expect("price noise pattern compiles")
});

/// Remove currency symbols.
pub fn strip_currency(text: &str) -> String {
    text.replace(['$', '€'], "")
}

/// Whether the text is exactly one decimal number once currency symbols are removed.
pub fn is_decimal(text: &str) -> bool {
    let stripped = strip_currency(text);
    let candidate = stripped.trim();
    candidate.bytes().any(|b| b.is_ascii_digit()) && DECIMAL.is_match(candidate)
}

/// Strip the currency symbol, a `REGULAR PRICE:` label and a `/ KG` suffix.
pub fn clean_price(text: &str) -> String {
    PRICE_NOISE.replace_all(text, "").trim().to_string()
}

/// Parse a displayed price into a decimal.
///
/// Currency symbols and whitespace are ignored. A `,` is a thousands
/// separator when a `.` is also present, otherwise it is the decimal point.
pub fn parse_price(text: &str) -> Option<Decimal> {
    let compact: String = strip_currency(text).chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    let normalized = if compact.contains('.') {
        compact.replace(',', "")
    } else {
        compact.replace(',', ".")
    };

    Decimal::from_str(&normalized).ok()
}

/// Decimal value of a price field, `None` unless the page showed a parseable price.
pub fn price_value(text: &PriceText) -> Option<Decimal> {
    text.as_shown().and_then(parse_price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("14.99", true)]
    #[case("$14.99", true)]
    #[case(" $1,299.00 ", true)]
    #[case("-$3.00", true)]
    #[case("123456", true)]
    #[case(".97", true)]
    #[case("$", false)]
    #[case("14.99/ea", false)]
    #[case("Paper Towels 12pk", false)]
    #[case("12,34", false)]
    #[case("", false)]
    fn test_is_decimal(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_decimal(input), expected, "{input:?}");
    }

    #[rstest]
    #[case("$3.00", "3.00")]
    #[case("REGULAR PRICE: $12.99 / KG", "12.99")]
    #[case("regular price: $8.50/kg", "8.50")]
    #[case("  $4.49  ", "4.49")]
    fn test_clean_price(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clean_price(input), expected);
    }

    #[rstest]
    #[case("$14.99", Some("14.99"))]
    #[case("€12,99", Some("12.99"))]
    #[case("$1,299.99", Some("1299.99"))]
    #[case("-$3.00", Some("-3.00"))]
    #[case("$ 5", Some("5"))]
    #[case("NA", None)]
    #[case("$3 OFF", None)]
    #[case("", None)]
    fn test_parse_price(#[case] input: &str, #[case] expected: Option<&str>) {
        let expected = expected.map(|e| Decimal::from_str(e).unwrap());
        assert_eq!(parse_price(input), expected);
    }

    #[test]
    fn test_price_value_ignores_sentinels() {
        assert_eq!(price_value(&PriceText::NotDetermined), None);
        assert_eq!(price_value(&PriceText::AtRegister), None);
        assert_eq!(price_value(&PriceText::shown("9.97")), Some(Decimal::new(997, 2)));
    }
}
