//! Pricing abstractions and core types

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// A single daily observation: closing price for one trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub close: f64,
}

/// Daily price history, strictly increasing by date, one row per date.
/// Providers sort and dedup before returning, so consumers can rely on it.
pub type PriceHistory = Vec<PriceRow>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    Stooq,
    Yahoo,
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ProviderKind::Stooq => "stooq",
                ProviderKind::Yahoo => "yahoo",
            }
        )
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stooq" => Ok(ProviderKind::Stooq),
            "yahoo" => Ok(ProviderKind::Yahoo),
            _ => Err(anyhow::anyhow!("Invalid price provider: {}", s)),
        }
    }
}

/// Failure modes a provider can surface. The aggregator treats both as a
/// per-holding failure; callers never see provider-specific structure.
#[derive(Debug, Error)]
pub enum PriceError {
    #[error("no usable price data for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("request failed for {symbol}: {source}")]
    Network {
        symbol: String,
        #[source]
        source: reqwest::Error,
    },
}

impl PriceError {
    pub fn unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        PriceError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Identifies the provider for cache-key composition.
    fn kind(&self) -> ProviderKind;

    /// Maps a raw ticker to the form this provider expects. Applied both
    /// when fetching and when composing cache keys, so keys for the same
    /// logical instrument always collide.
    fn normalize_symbol(&self, ticker: &str) -> String;

    /// Fetches the trailing `lookback_days` of daily closes for an already
    /// normalized symbol.
    async fn fetch_history(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<PriceHistory, PriceError>;
}
