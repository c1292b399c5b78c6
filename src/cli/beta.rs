//! Renders portfolio and single-symbol beta results to the terminal.

use crate::cli::ui;
use crate::core::beta::{BetaEstimate, RELIABLE_SAMPLE_SIZE};
use crate::core::portfolio::{BetaEngine, Holding, PortfolioResult};
use anyhow::Result;
use comfy_table::Cell;
use tracing::info;

pub async fn run_portfolio(
    engine: &BetaEngine,
    holdings: &[Holding],
    market: &str,
    lookback_days: u32,
) -> Result<()> {
    info!(
        "Estimating betas for {} holdings against {}",
        holdings.len(),
        market
    );

    let pb = ui::new_progress_bar(holdings.len() as u64, false);
    let result = engine
        .compute_portfolio_beta(holdings, market, lookback_days, &|| pb.inc(1))
        .await;
    pb.finish_and_clear();

    display_portfolio(&result?, market, lookback_days);
    Ok(())
}

pub async fn run_symbol(
    engine: &BetaEngine,
    ticker: &str,
    market: &str,
    lookback_days: u32,
) -> Result<()> {
    let estimate = engine.compute_beta(ticker, market, lookback_days).await?;
    display_symbol(ticker, market, lookback_days, &estimate);
    Ok(())
}

fn display_portfolio(result: &PortfolioResult, market: &str, lookback_days: u32) {
    let title = format!("Portfolio beta vs {market} ({lookback_days}d lookback)");
    println!("{}", ui::style_text(&title, ui::StyleType::Title));

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Ticker"),
        ui::header_cell("Symbol"),
        ui::header_cell("Weight (%)"),
        ui::header_cell("Beta"),
        ui::header_cell("Samples"),
        ui::header_cell("Source"),
    ]);

    for holding in &result.holdings {
        let beta_cell = match holding.beta {
            Some(beta) => ui::beta_cell(beta, holding.is_reliable()),
            None => ui::na_cell(holding.failed),
        };
        let source = if holding.failed {
            ui::style_text("failed", ui::StyleType::Error)
        } else if holding.from_cache {
            "cache".to_string()
        } else {
            "fresh".to_string()
        };

        table.add_row(vec![
            Cell::new(holding.ticker.clone()),
            Cell::new(holding.symbol.clone()),
            ui::number_cell(format!("{:.2}", holding.weight * 100.0)),
            beta_cell,
            ui::number_cell(holding.sample_size.to_string()),
            Cell::new(source),
        ]);
    }

    println!("{table}");
    println!(
        "{} {}",
        ui::style_text("Portfolio beta:", ui::StyleType::TotalLabel),
        ui::style_text(
            &format!("{:.3}", result.portfolio_beta),
            ui::StyleType::TotalValue
        ),
    );

    let thin = result
        .holdings
        .iter()
        .filter(|h| !h.failed && h.sample_size < RELIABLE_SAMPLE_SIZE)
        .count();
    if thin > 0 {
        println!(
            "{}",
            ui::style_text(
                &format!(
                    "{thin} holding(s) estimated from fewer than {RELIABLE_SAMPLE_SIZE} samples"
                ),
                ui::StyleType::Subtle
            )
        );
    }
}

fn display_symbol(ticker: &str, market: &str, lookback_days: u32, estimate: &BetaEstimate) {
    match estimate.beta {
        Some(beta) => {
            println!(
                "Beta of {ticker} vs {market} over {lookback_days}d: {}",
                ui::style_text(&format!("{beta:.3}"), ui::StyleType::TotalValue)
            );
            if !estimate.is_reliable() {
                println!(
                    "{}",
                    ui::style_text(
                        &format!(
                            "Estimated from only {} samples (threshold {})",
                            estimate.sample_size, RELIABLE_SAMPLE_SIZE
                        ),
                        ui::StyleType::Subtle
                    )
                );
            }
        }
        None => {
            println!(
                "{}",
                ui::style_text(
                    &format!(
                        "Beta of {ticker} vs {market} is undefined over {} samples",
                        estimate.sample_size
                    ),
                    ui::StyleType::Error
                )
            );
        }
    }
}
