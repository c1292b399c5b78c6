//! Beta estimation: covariance of asset and market returns divided by the
//! variance of market returns, both with the sample (n-1) divisor.

use serde::{Deserialize, Serialize};

/// Estimates with fewer paired observations than this are annotated as
/// unreliable by callers; the value is still reported and aggregated.
pub const RELIABLE_SAMPLE_SIZE: usize = 60;

/// A beta estimate. `beta` is `None` when the computation is degenerate
/// (fewer than 2 paired points, or zero market variance); a NaN never
/// leaks to callers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaEstimate {
    pub beta: Option<f64>,
    pub sample_size: usize,
}

impl BetaEstimate {
    pub fn undefined(sample_size: usize) -> Self {
        BetaEstimate {
            beta: None,
            sample_size,
        }
    }

    pub fn is_reliable(&self) -> bool {
        self.beta.is_some() && self.sample_size >= RELIABLE_SAMPLE_SIZE
    }
}

/// Computes beta over two index-aligned return vectors.
///
/// Equal lengths are a precondition; unequal inputs are a programming error
/// upstream of this function, not a recoverable condition.
pub fn beta(asset: &[f64], market: &[f64]) -> BetaEstimate {
    assert_eq!(
        asset.len(),
        market.len(),
        "aligned return vectors must have equal length"
    );

    let n = market.len();
    if n < 2 {
        return BetaEstimate::undefined(n);
    }

    let mean_asset = asset.iter().sum::<f64>() / n as f64;
    let mean_market = market.iter().sum::<f64>() / n as f64;

    let variance = market
        .iter()
        .map(|m| (m - mean_market).powi(2))
        .sum::<f64>()
        / (n - 1) as f64;
    if variance == 0.0 {
        return BetaEstimate::undefined(n);
    }

    let covariance = asset
        .iter()
        .zip(market)
        .map(|(a, m)| (a - mean_asset) * (m - mean_market))
        .sum::<f64>()
        / (n - 1) as f64;

    BetaEstimate {
        beta: Some(covariance / variance),
        sample_size: n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::returns::to_returns;
    use crate::core::price::PriceRow;
    use chrono::NaiveDate;

    #[test]
    fn test_beta_against_itself_is_one() {
        let series = vec![0.01, -0.02, 0.03, 0.005, -0.01];
        let estimate = beta(&series, &series);
        assert!((estimate.beta.unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(estimate.sample_size, 5);
    }

    #[test]
    fn test_beta_undefined_below_two_points() {
        assert_eq!(beta(&[], &[]), BetaEstimate::undefined(0));
        assert_eq!(beta(&[0.01], &[0.02]), BetaEstimate::undefined(1));
    }

    #[test]
    fn test_beta_undefined_for_zero_variance_market() {
        let asset = vec![0.01, -0.02, 0.03];
        let market = vec![0.005, 0.005, 0.005];
        let estimate = beta(&asset, &market);
        assert_eq!(estimate.beta, None);
        assert_eq!(estimate.sample_size, 3);
        assert!(!estimate.is_reliable());
    }

    #[test]
    #[should_panic]
    fn test_beta_panics_on_unequal_lengths() {
        beta(&[0.01, 0.02], &[0.01]);
    }

    #[test]
    fn test_reliability_threshold() {
        let reliable = BetaEstimate {
            beta: Some(1.2),
            sample_size: RELIABLE_SAMPLE_SIZE,
        };
        let thin = BetaEstimate {
            beta: Some(1.2),
            sample_size: RELIABLE_SAMPLE_SIZE - 1,
        };
        assert!(reliable.is_reliable());
        assert!(!thin.is_reliable());
        assert!(!BetaEstimate::undefined(500).is_reliable());
    }

    // Regression fixture: 4 aligned trading days of prices for an asset and
    // a market proxy, checked against a direct recomputation of the sample
    // covariance/variance quotient.
    #[test]
    fn test_beta_known_price_fixture() {
        let dates: Vec<NaiveDate> = (1..=4)
            .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
            .collect();
        let asset_prices: Vec<PriceRow> = dates
            .iter()
            .zip([100.0, 101.0, 99.0, 102.0])
            .map(|(date, close)| PriceRow { date: *date, close })
            .collect();
        let market_prices: Vec<PriceRow> = dates
            .iter()
            .zip([100.0, 100.5, 99.5, 101.0])
            .map(|(date, close)| PriceRow { date: *date, close })
            .collect();

        let asset: Vec<f64> = to_returns(&asset_prices).iter().map(|r| r.value).collect();
        let market: Vec<f64> = to_returns(&market_prices)
            .iter()
            .map(|r| r.value)
            .collect();
        assert_eq!(asset.len(), 3);
        assert!((asset[0] - 0.01).abs() < 1e-4);
        assert!((asset[1] + 0.0198).abs() < 1e-4);
        assert!((asset[2] - 0.0303).abs() < 1e-4);
        assert!((market[0] - 0.005).abs() < 1e-4);
        assert!((market[1] + 0.00995).abs() < 1e-4);
        assert!((market[2] - 0.01508).abs() < 1e-4);

        let estimate = beta(&asset, &market);
        assert_eq!(estimate.sample_size, 3);

        // Direct recomputation with n-1 divisors.
        let mean_a = asset.iter().sum::<f64>() / 3.0;
        let mean_m = market.iter().sum::<f64>() / 3.0;
        let cov = asset
            .iter()
            .zip(&market)
            .map(|(a, m)| (a - mean_a) * (m - mean_m))
            .sum::<f64>()
            / 2.0;
        let var = market.iter().map(|m| (m - mean_m).powi(2)).sum::<f64>() / 2.0;

        let expected = cov / var;
        assert!((estimate.beta.unwrap() - expected).abs() < 1e-12);
        // Sanity: this fixture lands close to 2.
        assert!((expected - 2.0).abs() < 0.01);
    }
}
