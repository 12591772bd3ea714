use anyhow::{Result, bail};
use clap::Parser;
use fxcast::application::feature_builder::FeatureBuilder;
use fxcast::application::trainer::TrainingService;
use fxcast::config::PipelineConfig;
use fxcast::domain::ports::BarSource;
use fxcast::infrastructure::bar_store::CsvBarStore;
use fxcast::infrastructure::feature_store::CsvFeatureStore;
use fxcast::infrastructure::model_store::ModelStore;
use fxcast::infrastructure::smartcore_classifier::{ForestParams, SmartcoreClassifier};
use std::path::PathBuf;
use tracing::info;

/// Train the signal model on the latest stored bars.
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

    let bar_store = CsvBarStore::new(&config.data_dir);
    let bars = bar_store.fetch(&config.symbol)?;
    if bars.len() < config.min_bars() {
        bail!(
            "Not enough bars for {}: have {}, need at least {}. Run gen_data or store more bars first.",
            config.symbol,
            bars.len(),
            config.min_bars()
        );
    }

    let builder = FeatureBuilder::new(&config.features, &config.label);
    let table = builder.build(&config.symbol, &bars);
    if table.is_empty() {
        bail!("All rows were trimmed for {}; nothing to train on", config.symbol);
    }
    CsvFeatureStore::new(&config.data_dir).put(&table)?;

    let mut model = SmartcoreClassifier::new(ForestParams {
        n_trees: config.model.n_trees,
        max_depth: config.model.max_depth,
        min_samples_split: config.model.min_samples_split,
    });
    let trainer = TrainingService::new(config.model.validation_split);
    let report = trainer.train(&table, &mut model)?;

    ModelStore::new(&config.data_dir).put(&config.symbol, &model)?;
    info!(
        "Training complete for {}: accuracy {:.4} on {} validation rows",
        config.symbol, report.accuracy, report.validation_rows
    );
    Ok(())
}
