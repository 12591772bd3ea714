use anyhow::Result;
use chrono::{Duration, Utc};
use clap::Parser;
use fxcast::config::PipelineConfig;
use fxcast::infrastructure::bar_store::CsvBarStore;
use fxcast::infrastructure::synthetic::SyntheticBarSource;
use std::path::PathBuf;
use tracing::info;

/// Generate a synthetic random-walk bar series and store it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to TOML config; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Symbol override
    #[arg(long)]
    symbol: Option<String>,

    /// Number of bars to generate
    #[arg(long, default_value_t = 5000)]
    bars: usize,

    /// Random walk seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Starting price level
    #[arg(long, default_value_t = 145.0)]
    base_price: f64,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let args = Args::parse();
    let mut config = PipelineConfig::load_or_default(args.config.as_deref())?;
    if let Some(symbol) = args.symbol {
        config.symbol = symbol;
    }

    let start = Utc::now() - Duration::minutes(args.bars as i64);
    let source = SyntheticBarSource::new(args.seed, args.bars, args.base_price, start);
    let bars = source.generate();

    let store = CsvBarStore::new(&config.data_dir);
    store.put(&config.symbol, &bars)?;
    info!(
        "Wrote {} synthetic bars for {} under {:?}",
        bars.len(),
        config.symbol,
        config.data_dir
    );
    Ok(())
}
