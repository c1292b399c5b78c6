use crate::core::price::{PriceError, PriceHistory, PriceRow, PriceSource, ProviderKind};
use crate::providers::truncate_lookback;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{debug, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Daily history provider backed by Stooq's delimited-text download
/// endpoint. The header row names the columns; rows may arrive unordered.
pub struct StooqProvider {
    base_url: String,
    client: reqwest::Client,
}

impl StooqProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("mbeta/0.2")
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(StooqProvider {
            base_url: base_url.to_string(),
            client,
        })
    }
}

/// Parses the delimited body into rows, tolerating column reordering and
/// skipping malformed lines. Returns rows sorted by date without
/// duplicates.
fn parse_csv_history(symbol: &str, body: &str) -> Result<PriceHistory, PriceError> {
    let mut lines = body.lines();
    let header = lines
        .next()
        .ok_or_else(|| PriceError::unavailable(symbol, "empty response"))?;

    let columns: Vec<String> = header
        .split(',')
        .map(|c| c.trim().to_lowercase())
        .collect();
    let date_idx = columns.iter().position(|c| c == "date");
    let close_idx = columns.iter().position(|c| c == "close");
    let (date_idx, close_idx) = match (date_idx, close_idx) {
        (Some(d), Some(c)) => (d, c),
        _ => {
            return Err(PriceError::unavailable(
                symbol,
                format!("header missing date/close columns: '{header}'"),
            ));
        }
    };

    let mut history: PriceHistory = lines
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(',').collect();
            let date = fields
                .get(date_idx)
                .and_then(|f| NaiveDate::parse_from_str(f.trim(), "%Y-%m-%d").ok())?;
            let close = fields.get(close_idx).and_then(|f| f.trim().parse().ok())?;
            Some(PriceRow { date, close })
        })
        .collect();

    // Re-sort defensively; the endpoint does not guarantee order.
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

/// True when the ticker already ends in a dot plus two-letter market code.
fn has_market_suffix(ticker: &str) -> bool {
    ticker.rsplit_once('.').is_some_and(|(_, suffix)| {
        suffix.len() == 2 && suffix.chars().all(|c| c.is_ascii_alphabetic())
    })
}

#[async_trait]
impl PriceSource for StooqProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Stooq
    }

    fn normalize_symbol(&self, ticker: &str) -> String {
        let lower = ticker.trim().to_lowercase();
        if has_market_suffix(&lower) {
            lower
        } else {
            format!("{lower}.us")
        }
    }

    #[instrument(name = "StooqHistoryFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_history(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<PriceHistory, PriceError> {
        let url = format!("{}/q/d/l/?s={}&i=d", self.base_url, symbol);
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

        let body = response.text().await.map_err(|e| PriceError::Network {
            symbol: symbol.to_string(),
            source: e,
        })?;

        let history = parse_csv_history(symbol, &body)?;
        Ok(truncate_lookback(history, lookback_days))
    }
}
