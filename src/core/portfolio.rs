//! Portfolio-level beta: weight normalization, per-holding computation and
//! aggregation into a single statistic.

use crate::core::beta::{BetaEstimate, beta};
use crate::core::cache::BetaCache;
use crate::core::price::PriceSource;
use crate::core::returns::{ReturnRow, align, to_returns};
use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A holding as supplied by the caller: raw positive weight, fraction or
/// percentage, normalized later.
#[derive(Debug, Clone)]
pub struct Holding {
    pub ticker: String,
    pub weight: f64,
}

/// Outcome for one holding in a batch.
#[derive(Debug, Clone)]
pub struct HoldingBeta {
    pub ticker: String,
    /// Provider-specific resolved identifier, also used in cache keys.
    pub symbol: String,
    /// Normalized weight in (0, 1]; all weights in one result sum to 1.
    pub weight: f64,
    pub beta: Option<f64>,
    pub sample_size: usize,
    pub from_cache: bool,
    pub failed: bool,
}

impl HoldingBeta {
    pub fn is_reliable(&self) -> bool {
        !self.failed
            && BetaEstimate {
                beta: self.beta,
                sample_size: self.sample_size,
            }
            .is_reliable()
    }
}

#[derive(Debug)]
pub struct PortfolioResult {
    pub holdings: Vec<HoldingBeta>,
    pub portfolio_beta: f64,
}

/// Replaces raw weights with `w_i / Σw`. A non-positive total fails the
/// whole request; nothing sensible can be aggregated from it.
pub fn normalize_weights(holdings: &[Holding]) -> Result<Vec<f64>> {
    let total: f64 = holdings.iter().map(|h| h.weight).sum();
    if total <= 0.0 {
        return Err(anyhow!(
            "Total portfolio weight must be positive, got {total}"
        ));
    }
    Ok(holdings.iter().map(|h| h.weight / total).collect())
}

/// Drives the batch: market series once, then each holding strictly in
/// sequence through cache -> fetch -> returns -> align -> beta.
pub struct BetaEngine {
    source: Arc<dyn PriceSource>,
    cache: BetaCache,
    fetch_delay: Duration,
}

impl BetaEngine {
    pub fn new(source: Arc<dyn PriceSource>, cache: BetaCache, fetch_delay: Duration) -> Self {
        BetaEngine {
            source,
            cache,
            fetch_delay,
        }
    }

    /// Pauses between consecutive remote fetches, excluding the first, to
    /// stay polite to the provider.
    async fn throttle(&self, fetched_before: &mut bool) {
        if *fetched_before && !self.fetch_delay.is_zero() {
            debug!("Waiting {:?} before next fetch", self.fetch_delay);
            tokio::time::sleep(self.fetch_delay).await;
        }
        *fetched_before = true;
    }

    /// Beta of a single instrument against a market proxy.
    pub async fn compute_beta(
        &self,
        ticker: &str,
        market_ticker: &str,
        lookback_days: u32,
    ) -> Result<BetaEstimate> {
        let symbol = self.source.normalize_symbol(ticker);
        let market_symbol = self.source.normalize_symbol(market_ticker);

        if let Some(cached) = self
            .cache
            .get(self.source.kind(), &symbol, &market_symbol, lookback_days)
            .await
        {
            return Ok(cached);
        }

        let market_history = self
            .source
            .fetch_history(&market_symbol, lookback_days)
            .await
            .with_context(|| format!("Failed to fetch market history for {market_symbol}"))?;
        let market_returns = to_returns(&market_history);

        let mut fetched_before = true;
        let estimate = self
            .fetch_and_estimate(
                &symbol,
                &market_symbol,
                &market_returns,
                lookback_days,
                &mut fetched_before,
            )
            .await
            .with_context(|| format!("Failed to compute beta for {symbol}"))?;
        Ok(estimate)
    }

    /// Betas for a weighted set of holdings, aggregated into one portfolio
    /// beta. `progress` is invoked once per completed holding.
    pub async fn compute_portfolio_beta(
        &self,
        holdings: &[Holding],
        market_ticker: &str,
        lookback_days: u32,
        progress: &(dyn Fn() + Send + Sync),
    ) -> Result<PortfolioResult> {
        // Batch-fatal conditions are checked before any network activity.
        if holdings.is_empty() {
            return Err(anyhow!("No holdings to compute beta for"));
        }
        let weights = normalize_weights(holdings)?;

        let market_symbol = self.source.normalize_symbol(market_ticker);
        let market_history = self
            .source
            .fetch_history(&market_symbol, lookback_days)
            .await
            .with_context(|| format!("Failed to fetch market history for {market_symbol}"))?;
        let market_returns = to_returns(&market_history);
        info!(
            "Market series {}: {} daily returns",
            market_symbol,
            market_returns.len()
        );

        let mut fetched_before = true;
        let mut results = Vec::with_capacity(holdings.len());
        let mut portfolio_beta = 0.0;

        for (holding, weight) in holdings.iter().zip(weights) {
            let symbol = self.source.normalize_symbol(&holding.ticker);

            let cached = self
                .cache
                .get(self.source.kind(), &symbol, &market_symbol, lookback_days)
                .await;
            let (estimate, from_cache, failed) = match cached {
                Some(estimate) => (estimate, true, false),
                None => {
                    match self
                        .fetch_and_estimate(
                            &symbol,
                            &market_symbol,
                            &market_returns,
                            lookback_days,
                            &mut fetched_before,
                        )
                        .await
                    {
                        Ok(estimate) => (estimate, false, false),
                        Err(e) => {
                            // One bad quote does not abort the batch.
                            warn!("Beta computation failed for {}: {}", symbol, e);
                            (BetaEstimate::undefined(0), false, true)
                        }
                    }
                }
            };

            // Undefined betas contribute zero, but the weight stays in the
            // basis; the sum is deliberately not renormalized over the
            // holdings that worked.
            portfolio_beta += weight * estimate.beta.unwrap_or(0.0);

            results.push(HoldingBeta {
                ticker: holding.ticker.clone(),
                symbol,
                weight,
                beta: estimate.beta,
                sample_size: estimate.sample_size,
                from_cache,
                failed,
            });
            progress();
        }

        Ok(PortfolioResult {
            holdings: results,
            portfolio_beta,
        })
    }

    async fn fetch_and_estimate(
        &self,
        symbol: &str,
        market_symbol: &str,
        market_returns: &[ReturnRow],
        lookback_days: u32,
        fetched_before: &mut bool,
    ) -> Result<BetaEstimate> {
        self.throttle(fetched_before).await;
        let history = self.source.fetch_history(symbol, lookback_days).await?;

        let asset_returns = to_returns(&history);
        let (asset_vec, market_vec) = align(&asset_returns, market_returns);
        let estimate = beta(&asset_vec, &market_vec);
        debug!(
            "Computed beta for {} vs {}: {:?} over {} points",
            symbol, market_symbol, estimate.beta, estimate.sample_size
        );

        self.cache
            .put(
                self.source.kind(),
                symbol,
                market_symbol,
                lookback_days,
                estimate,
            )
            .await;
        Ok(estimate)
    }
}
