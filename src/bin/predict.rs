use anyhow::{Context, Result, bail};
use clap::Parser;
use fxcast::application::feature_builder::FeatureBuilder;
use fxcast::application::inference::InferenceService;
use fxcast::config::PipelineConfig;
use fxcast::domain::ports::BarSource;
use fxcast::infrastructure::bar_store::CsvBarStore;
use fxcast::infrastructure::model_store::ModelStore;
use std::path::PathBuf;
use tracing::info;

/// Score the latest stored bars with the latest trained model.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to TOML config; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Symbol override
    #[arg(long)]
    symbol: Option<String>,

    /// Data directory override
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Score every feature row instead of only the most recent one
    #[arg(long)]
    batch: bool,

    /// Also write the JSON result to this file
    #[arg(long)]
    output: Option<PathBuf>,
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
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    let bars = CsvBarStore::new(&config.data_dir).fetch(&config.symbol)?;
    let builder = FeatureBuilder::new(&config.features, &config.label);
    let table = builder.build(&config.symbol, &bars);
    if table.is_empty() {
        bail!(
            "No scorable rows for {}: {} bars stored, need at least {}",
            config.symbol,
            bars.len(),
            config.min_bars()
        );
    }

    let Some(model) = ModelStore::new(&config.data_dir).get_latest(&config.symbol)? else {
        bail!("No trained model for {}; run train first", config.symbol);
    };
    let service =
        InferenceService::with_model(Box::new(model), config.prediction.confidence_threshold);

    let json = if args.batch {
        let results = service.predict_batch(&table)?;
        info!("Scored {} rows for {}", results.len(), config.symbol);
        serde_json::to_string_pretty(&results)?
    } else {
        let Some(result) = service.predict_latest(&table)? else {
            bail!("Inference produced no result for {}", config.symbol);
        };
        serde_json::to_string_pretty(&result)?
    };

    println!("{json}");
    if let Some(path) = args.output {
        std::fs::write(&path, &json)
            .with_context(|| format!("Failed to write prediction to {:?}", path))?;
        info!("Saved prediction to {:?}", path);
    }
    Ok(())
}
