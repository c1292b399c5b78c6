use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use mbeta::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for mbeta::AppCommand {
    fn from(cmd: Commands) -> mbeta::AppCommand {
        match cmd {
            Commands::Beta => mbeta::AppCommand::Portfolio,
            Commands::Symbol { ticker } => mbeta::AppCommand::Symbol(ticker),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Estimate portfolio beta for the configured holdings
    Beta,
    /// Estimate beta for a single ticker against the configured market
    Symbol { ticker: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => mbeta::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = mbeta::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
portfolio:
  - ticker: "AAPL"
    weight: 50.0
  - ticker: "MSFT"
    weight: 50.0

market: "SPY"
lookback_days: 365

# One of: yahoo, stooq
provider: yahoo

providers:
  yahoo:
    base_url: "https://query1.finance.yahoo.com"
  stooq:
    base_url: "https://stooq.com"
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
