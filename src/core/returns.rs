//! Day-over-day simple returns and date alignment of two return series.

use crate::core::price::PriceRow;
use chrono::NaiveDate;
use std::collections::HashMap;

/// A single daily simple return. The date is the later of the two prices
/// the return was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnRow {
    pub date: NaiveDate,
    pub value: f64,
}

/// Converts a daily price history into simple returns `p1/p0 - 1`.
///
/// Pairs where either close is non-positive are skipped, not an error; a
/// bad tick should not abort the whole series.
pub fn to_returns(history: &[PriceRow]) -> Vec<ReturnRow> {
    history
        .windows(2)
        .filter(|pair| pair[0].close > 0.0 && pair[1].close > 0.0)
        .map(|pair| ReturnRow {
            date: pair[1].date,
            value: pair[1].close / pair[0].close - 1.0,
        })
        .collect()
}

/// Pairs two return series by common date into equal-length vectors,
/// preserving the asset series order.
///
/// An empty intersection yields two empty vectors; whether that is fatal is
/// the caller's decision.
pub fn align(asset: &[ReturnRow], market: &[ReturnRow]) -> (Vec<f64>, Vec<f64>) {
    let by_date: HashMap<NaiveDate, f64> = market.iter().map(|r| (r.date, r.value)).collect();

    let mut asset_values = Vec::new();
    let mut market_values = Vec::new();
    for row in asset {
        if let Some(market_value) = by_date.get(&row.date) {
            asset_values.push(row.value);
            market_values.push(*market_value);
        }
    }
    (asset_values, market_values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(day: u32, close: f64) -> PriceRow {
        PriceRow {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            close,
        }
    }

    fn ret(day: u32, value: f64) -> ReturnRow {
        ReturnRow {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            value,
        }
    }

    #[test]
    fn test_returns_from_prices() {
        let history = vec![row(1, 100.0), row(2, 101.0), row(3, 99.0), row(4, 102.0)];
        let returns = to_returns(&history);

        assert_eq!(returns.len(), 3);
        assert!((returns[0].value - 0.01).abs() < 1e-12);
        assert!((returns[1].value - (99.0 / 101.0 - 1.0)).abs() < 1e-12);
        assert!((returns[2].value - (102.0 / 99.0 - 1.0)).abs() < 1e-12);
        assert_eq!(returns[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_returns_skip_non_positive_prices() {
        let history = vec![row(1, 100.0), row(2, 0.0), row(3, 105.0), row(4, 110.0)];
        let returns = to_returns(&history);

        // Pairs (100, 0) and (0, 105) are both dropped.
        assert_eq!(returns.len(), 1);
        assert_eq!(returns[0].date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert!((returns[0].value - (110.0 / 105.0 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_returns_need_two_prices() {
        assert!(to_returns(&[]).is_empty());
        assert!(to_returns(&[row(1, 100.0)]).is_empty());
    }

    #[test]
    fn test_align_keeps_common_dates_in_asset_order() {
        let asset = vec![ret(2, 0.01), ret(3, -0.02), ret(5, 0.03)];
        let market = vec![ret(1, 0.001), ret(2, 0.005), ret(5, 0.015)];

        let (a, m) = align(&asset, &market);
        assert_eq!(a.len(), m.len());
        assert_eq!(a, vec![0.01, 0.03]);
        assert_eq!(m, vec![0.005, 0.015]);
    }

    #[test]
    fn test_align_length_equals_date_intersection() {
        let asset = vec![ret(1, 0.1), ret(2, 0.2), ret(3, 0.3), ret(4, 0.4)];
        let market = vec![ret(2, 0.02), ret(4, 0.04), ret(6, 0.06)];

        let (a, m) = align(&asset, &market);
        assert_eq!(a.len(), 2);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_align_no_overlap_is_empty() {
        let asset = vec![ret(1, 0.1)];
        let market = vec![ret(2, 0.2)];

        let (a, m) = align(&asset, &market);
        assert!(a.is_empty());
        assert!(m.is_empty());
    }
}
