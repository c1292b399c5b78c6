pub mod cli;
pub mod config;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::cache::BetaCache;
use crate::core::portfolio::{BetaEngine, Holding};
use crate::core::price::{PriceSource, ProviderKind};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    /// Portfolio beta for every configured holding.
    Portfolio,
    /// Beta of a single instrument against the configured market.
    Symbol(String),
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Beta estimator starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let kind: ProviderKind = config.provider.parse()?;
    let source: Arc<dyn PriceSource> = match kind {
        ProviderKind::Yahoo => Arc::new(providers::yahoo::YahooProvider::new(
            config.yahoo_base_url(),
        )?),
        ProviderKind::Stooq => Arc::new(providers::stooq::StooqProvider::new(
            config.stooq_base_url(),
        )?),
    };

    let store = match &config.cache_dir {
        Some(path) => store::KeyValueStore::new_at(path),
        None => store::KeyValueStore::new(),
    };
    let cache = BetaCache::new(store.collection("betas"));
    let engine = BetaEngine::new(
        source,
        cache,
        Duration::from_millis(config.fetch_delay_ms),
    );

    match command {
        AppCommand::Portfolio => {
            let holdings: Vec<Holding> = config
                .portfolio
                .iter()
                .map(|h| Holding {
                    ticker: h.ticker.clone(),
                    weight: h.weight,
                })
                .collect();
            cli::beta::run_portfolio(&engine, &holdings, &config.market, config.lookback_days)
                .await
        }
        AppCommand::Symbol(ticker) => {
            cli::beta::run_symbol(&engine, &ticker, &config.market, config.lookback_days).await
        }
    }
}
