use crate::core::price::{PriceError, PriceHistory, PriceRow, PriceSource, ProviderKind};
use crate::providers::truncate_lookback;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Daily history provider backed by Yahoo Finance's chart endpoint.
/// Timestamps and closes arrive as parallel arrays; adjusted closes are
/// preferred when present.
pub struct YahooProvider {
    base_url: String,
    client: reqwest::Client,
}

impl YahooProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("mbeta/0.2")
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(YahooProvider {
            base_url: base_url.to_string(),
            client,
        })
    }
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize, Debug)]
struct AdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

/// Smallest chart range covering the lookback window.
fn range_for_days(lookback_days: u32) -> &'static str {
    match lookback_days {
        0..=5 => "5d",
        6..=30 => "1mo",
        31..=90 => "3mo",
        91..=180 => "6mo",
        181..=365 => "1y",
        366..=730 => "2y",
        731..=1825 => "5y",
        _ => "10y",
    }
}

/// Zips the parallel timestamp/price arrays into rows, preferring adjusted
/// close and skipping null entries.
fn extract_history(symbol: &str, item: &ChartItem) -> Result<PriceHistory, PriceError> {
    let timestamps = item
        .timestamp
        .as_ref()
        .ok_or_else(|| PriceError::unavailable(symbol, "missing timestamps"))?;

    let indicators = item
        .indicators
        .as_ref()
        .ok_or_else(|| PriceError::unavailable(symbol, "missing indicators"))?;
    let adjusted = indicators
        .adjclose
        .as_ref()
        .and_then(|a| a.first())
        .and_then(|a| a.adjclose.as_ref());
    let raw = indicators.quote.first().and_then(|q| q.close.as_ref());
    let prices = adjusted
        .or(raw)
        .ok_or_else(|| PriceError::unavailable(symbol, "missing close prices"))?;

    let mut history: PriceHistory = timestamps
        .iter()
        .zip(prices)
        .filter_map(|(ts, close)| {
            let close = (*close)?;
            let date = Utc.timestamp_opt(*ts, 0).single()?.date_naive();
            Some(PriceRow { date, close })
        })
        .collect();

    // Re-sort defensively and keep one row per trading day.
    history.sort_by_key(|row| row.date);
    history.dedup_by_key(|row| row.date);

    if history.len() < 2 {
        return Err(PriceError::unavailable(
            symbol,
            format!("only {} usable rows", history.len()),
        ));
    }
    Ok(history)
}

#[async_trait]
impl PriceSource for YahooProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Yahoo
    }

    fn normalize_symbol(&self, ticker: &str) -> String {
        // Share-class tickers use hyphens on this provider (BRK.B -> BRK-B).
        ticker.trim().to_uppercase().replace('.', "-")
    }

    #[instrument(name = "YahooHistoryFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_history(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<PriceHistory, PriceError> {
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range={}",
            self.base_url,
            symbol,
            range_for_days(lookback_days)
        );
        debug!("Requesting price history from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PriceError::Network {
                symbol: symbol.to_string(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(PriceError::unavailable(
                symbol,
                format!("HTTP status {}", response.status()),
            ));
        }

        let text = response.text().await.map_err(|e| PriceError::Network {
            symbol: symbol.to_string(),
            source: e,
        })?;

        let data: YahooChartResponse = serde_json::from_str(&text)
            .map_err(|e| PriceError::unavailable(symbol, format!("unparseable response: {e}")))?;
        let item = data
            .chart
            .result
            .as_ref()
            .and_then(|items| items.first())
            .ok_or_else(|| PriceError::unavailable(symbol, "no chart result"))?;

        let history = extract_history(symbol, item)?;
        Ok(truncate_lookback(history, lookback_days))
    }
}
