//! pricepipe CLI: fetch daily stock prices and save them as CSV.
//!
//! Commands:
//! - (none): prompt for a ticker and period, then run the pipeline once
//! - `fetch`: run the pipeline for a ticker given on the command line
//! - `periods`: list the accepted period tokens

mod prompt;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pricepipe_core::pipeline::StdoutProgress;
use pricepipe_core::{Period, Pipeline, PipelineConfig, PriceRequest, ProviderKind, Ticker};
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pricepipe",
    about = "pricepipe: download stock price history and save it as CSV"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output directory for CSV files (overrides the config file).
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Use deterministic synthetic data instead of Yahoo Finance.
    #[arg(long, global = true, default_value_t = false)]
    synthetic: bool,

    /// Skip the wait between provider requests.
    #[arg(long, global = true, default_value_t = false)]
    no_throttle: bool,

    /// Debug-level logging on stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one ticker and write a CSV file.
    Fetch {
        /// Ticker symbol (e.g., AAPL, BRK-B).
        ticker: String,

        /// Period token (e.g., 1mo, 1y, ytd). Defaults to the configured period.
        #[arg(long, short)]
        period: Option<String>,
    },
    /// List accepted period tokens.
    Periods,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("pricepipe={level},pricepipe_core={level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if cli.synthetic {
        config.provider.kind = ProviderKind::Synthetic;
    }
    if cli.no_throttle {
        config.rate_limit.min_interval_ms = 0;
    }
    debug!(?config, "effective configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(Commands::Periods) = cli.command {
        for period in Period::ALL {
            println!("{:<4} {}", period.as_str(), period.label());
        }
        return Ok(());
    }

    let config = load_config(&cli)?;

    let request = match &cli.command {
        Some(Commands::Fetch { ticker, period }) => {
            let ticker = Ticker::parse(ticker).context("invalid ticker")?;
            let period = match period {
                Some(p) => Period::parse(p).context("invalid period")?,
                None => config.default_period,
            };
            PriceRequest::new(ticker, period)
        }
        _ => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut output = io::stdout();
            match prompt::prompt_request(&mut input, &mut output, config.default_period)? {
                Some(request) => request,
                None => {
                    info!("input closed before a request was entered");
                    std::process::exit(1);
                }
            }
        }
    };

    run_pipeline(&config, &request)
}

fn run_pipeline(config: &PipelineConfig, request: &PriceRequest) -> Result<()> {
    println!("Starting data pipeline for {}...", request.ticker);

    let pipeline =
        Pipeline::from_config(config).context("failed to set up price provider")?;
    let report = pipeline.run(request, &StdoutProgress);

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
