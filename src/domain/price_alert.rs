//! Short-term price trend classification.
//!
//! Pure functions over a product's final-price history. The trend check runs
//! first; the all-time-low check runs afterwards and replaces the trend result
//! whenever it holds.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::product::PriceObservation;

/// Relative drop at or above which a decrease is reported as a hot deal.
pub const HOT_DEAL_DROP: Decimal = Decimal::from_parts(20, 0, 0, false, 2);

/// Priced observations required before an all-time low is reported.
pub const ALL_TIME_LOW_MIN_OBSERVATIONS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AlertKind {
    #[default]
    None,
    Increased,
    Decreased,
    HotDeal,
    AllTimeLow,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlertResult {
    pub kind: AlertKind,
    pub message: String,
}

impl AlertResult {
    fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

/// Classifies a product from its observations, in any order.
///
/// Observations without a final price are ignored; the rest are ordered by
/// timestamp, most recent last.
#[must_use]
pub fn evaluate_observations(observations: &[PriceObservation]) -> AlertResult {
    let mut priced: Vec<_> = observations
        .iter()
        .filter_map(|o| o.final_price.map(|price| (o.observed_at, price)))
        .collect();
    priced.sort_by_key(|(observed_at, _)| *observed_at);

    let prices: Vec<Decimal> = priced.into_iter().map(|(_, price)| price).collect();
    evaluate(&prices)
}

/// Classifies an ascending sequence of final prices.
#[must_use]
pub fn evaluate(prices: &[Decimal]) -> AlertResult {
    let [.., previous, current] = prices else {
        return AlertResult::none();
    };
    let (previous, current) = (*previous, *current);

    let mut result = if current > previous {
        AlertResult::new(AlertKind::Increased, "⚠ Price has gone up")
    } else if current == previous {
        AlertResult::none()
    } else {
        match (previous - current).checked_div(previous) {
            Some(drop) if previous > Decimal::ZERO && drop >= HOT_DEAL_DROP => {
                let percent = (drop * Decimal::ONE_HUNDRED).round_dp(2);
                AlertResult::new(AlertKind::HotDeal, format!("🔥 Hot deal!\n{percent:.2}% Cheaper!"))
            }
            _ => AlertResult::new(AlertKind::Decreased, "✔ Price has gone down"),
        }
    };

    if prices.len() >= ALL_TIME_LOW_MIN_OBSERVATIONS {
        let lowest = prices.iter().copied().min().unwrap_or(current);
        if current == lowest {
            let beaten = prices.iter().filter(|price| **price > current).count();
            result = AlertResult::new(
                AlertKind::AllTimeLow,
                format!("🏆 All-time low!\nCheaper than {beaten} of {} deals!", prices.len()),
            );
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rstest::rstest;
    use std::str::FromStr;

    fn prices(values: &[&str]) -> Vec<Decimal> {
        values.iter().map(|v| Decimal::from_str(v).unwrap()).collect()
    }

    #[rstest]
    #[case(&[], AlertKind::None)]
    #[case(&["10.00"], AlertKind::None)]
    #[case(&["10.00", "10.00"], AlertKind::None)]
    #[case(&["10.00", "12.00"], AlertKind::Increased)]
    #[case(&["10.00", "9.00"], AlertKind::Decreased)]
    #[case(&["20.00", "15.00"], AlertKind::HotDeal)]
    #[case(&["10.00", "8.00"], AlertKind::HotDeal)]
    #[case(&["10.00", "8.01"], AlertKind::Decreased)]
    #[case(&["10.00", "10.00", "10.00", "5.00"], AlertKind::AllTimeLow)]
    #[case(&["10.00", "4.00", "9.00", "8.00"], AlertKind::Decreased)]
    #[case(&["10.00", "4.00", "9.00", "12.00"], AlertKind::Increased)]
    fn test_alert_kind(#[case] values: &[&str], #[case] expected: AlertKind) {
        assert_eq!(evaluate(&prices(values)).kind, expected);
    }

    #[test]
    fn test_none_has_empty_message() {
        assert!(evaluate(&prices(&["3.99", "3.99"])).message.is_empty());
    }

    #[test]
    fn test_hot_deal_message_has_exact_percentage() {
        let result = evaluate(&prices(&["20.00", "15.00"]));
        assert!(result.message.contains("25.00%"), "{}", result.message);

        let result = evaluate(&prices(&["29.99", "19.99"]));
        assert!(result.message.contains("33.34%"), "{}", result.message);
    }

    #[test]
    fn test_all_time_low_overrides_trend_and_counts_beaten() {
        let result = evaluate(&prices(&["10.00", "10.00", "10.00", "5.00"]));
        assert_eq!(result.kind, AlertKind::AllTimeLow);
        assert!(result.message.contains("Cheaper than 3 of 4"), "{}", result.message);
    }

    #[test]
    fn test_all_time_low_also_wins_over_unchanged_price() {
        let result = evaluate(&prices(&["9.00", "7.00", "8.00", "7.00", "7.00"]));
        assert_eq!(result.kind, AlertKind::AllTimeLow);
        assert!(result.message.contains("Cheaper than 2 of 5"), "{}", result.message);
    }

    #[test]
    fn test_observations_are_ordered_and_filtered() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let observation = |days: i64, price: Option<&str>| PriceObservation {
            id: days,
            product_id: 1,
            observed_at: start + Duration::days(days),
            full_price: None,
            discount: None,
            final_price: price.map(|p| Decimal::from_str(p).unwrap()),
        };

        // Stored out of order with an unpriced row in between.
        let observations = vec![
            observation(5, Some("12.00")),
            observation(1, Some("10.00")),
            observation(3, None),
        ];
        assert_eq!(evaluate_observations(&observations).kind, AlertKind::Increased);
    }
}
