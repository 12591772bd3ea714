use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Indicator configuration: which rolling windows to compute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureParams {
    /// Lookback periods (bars) for percent-return columns.
    pub return_periods: Vec<usize>,
    /// Lookback periods for SMA-deviation columns.
    pub sma_periods: Vec<usize>,
    /// Lookback periods for ATR columns.
    pub atr_periods: Vec<usize>,
    pub rsi_period: usize,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            return_periods: vec![1, 5, 15, 60],
            sma_periods: vec![5, 20, 60],
            atr_periods: vec![5, 14],
            rsi_period: 14,
        }
    }
}

impl FeatureParams {
    /// Rows dropped from the head of every feature table.
    ///
    /// The maximum of the return/SMA/ATR windows; RSI rows that need more
    /// history than this are removed by the undefined-value trim instead.
    pub fn max_lookback(&self) -> usize {
        self.return_periods
            .iter()
            .chain(self.sma_periods.iter())
            .chain(self.atr_periods.iter())
            .copied()
            .max()
            .unwrap_or(0)
    }
}

/// Label construction: forward horizon and the no-trade band.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelParams {
    /// Bars to look forward when computing the target return.
    pub horizon: usize,
    /// Band half-width in percent: |return| <= threshold means no-trade.
    pub threshold_pct: f64,
}

impl Default for LabelParams {
    fn default() -> Self {
        Self {
            horizon: 60,
            threshold_pct: 0.1,
        }
    }
}

/// Forest hyperparameters and the temporal validation split.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    /// Fraction of rows held out (from the chronological tail) for validation.
    pub validation_split: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            validation_split: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionParams {
    /// Attached to every result for the consumer; never gates output here.
    pub confidence_threshold: f64,
}

impl Default for PredictionParams {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
        }
    }
}

/// Full pipeline configuration, constructed once at startup and passed by
/// reference into each component. Nothing reads ambient global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub symbol: String,
    pub data_dir: PathBuf,
    pub features: FeatureParams,
    pub label: LabelParams,
    pub model: ModelParams,
    pub prediction: PredictionParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            symbol: "USDJPY".to_string(),
            data_dir: PathBuf::from("data"),
            features: FeatureParams::default(),
            label: LabelParams::default(),
            model: ModelParams::default(),
            prediction: PredictionParams::default(),
        }
    }
}

impl PipelineConfig {
    /// Loads a TOML config file; missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file {:?}", path))
    }

    /// Loads `path` when given, otherwise returns defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Minimum bar count that can produce at least one feature row.
    pub fn min_bars(&self) -> usize {
        self.features.max_lookback() + self.label.horizon + 1
    }
}
