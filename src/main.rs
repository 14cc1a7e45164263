mod batch;
mod config;
mod error;
mod fetch;
mod parser;
mod pipeline;
mod query;
mod record;
mod serializer;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use tracing::info;

use crate::config::{Settings, DEFAULT_BATCH_SIZE};
use crate::fetch::HttpFetcher;
use crate::query::{ChainQuery, Expiration, Money, OptionType};
use crate::serializer::Format;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Parser)]
#[command(name = "options_scraper", about = "NASDAQ option chain scraper")]
struct Cli {
    /// Ticker symbol
    #[arg(short, long)]
    ticker: String,
    /// Output directory (must already exist)
    #[arg(short, long)]
    odir: PathBuf,
    /// Records per output file
    #[arg(short, long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
    #[arg(short, long, value_enum)]
    callput: Option<OptionType>,
    #[arg(short, long, value_enum, default_value_t = Money::All)]
    money: Money,
    /// Exchange code
    #[arg(short, long)]
    excode: Option<String>,
    /// Expiration class
    #[arg(short = 'x', long, value_enum)]
    expir: Option<Expiration>,
    /// Serialization format
    #[arg(short, long, value_enum, default_value_t = Format::Csv)]
    serialize: Format,
    #[arg(short, long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

fn init_tracing(level: LogLevel) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.as_filter().into()),
        )
        .init();
}

fn main() -> anyhow::Result<()> {
    let t0 = Instant::now();
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    let settings = Settings::load();
    let query = ChainQuery {
        money: cli.money,
        expir: cli.expir,
        excode: cli.excode,
        callput: cli.callput,
    };

    info!("VERIFY: arguments passed {:?}", query.query_pairs());
    info!(
        "Serialization format is {}",
        cli.serialize.ext().to_uppercase()
    );
    info!("Batch Size is {}", cli.batch_size);

    let fetcher = HttpFetcher::new()?;
    let summary = serializer::run(
        &fetcher,
        &settings.base_url,
        &cli.ticker,
        &cli.odir,
        cli.batch_size,
        cli.serialize,
        &query,
    )?;

    println!(
        "Wrote {} records in {} files for {}",
        summary.records,
        summary.batches,
        cli.ticker.trim().to_uppercase()
    );
    info!("Finished Scraping");

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("Done in {}", format_duration(elapsed));
    }
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
