use thiserror::Error;

/// Errors related to raw bar data and feature construction.
///
/// Both variants are recoverable: callers treat them as "not enough data
/// yet" and either wait for more bars or fall back to cached results.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("No bar data available for {symbol}")]
    Unavailable { symbol: String },

    #[error("Insufficient history for {symbol}: {got} usable rows, need at least {need}")]
    InsufficientHistory {
        symbol: String,
        got: usize,
        need: usize,
    },

    #[error("Bar source failed for {symbol}: {reason}")]
    SourceFailure { symbol: String, reason: String },
}

/// Errors related to model training and inference.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model has not been fitted")]
    NotFitted,

    #[error("Feature schema mismatch: model was fitted on {expected:?}, got {actual:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Training failed: {reason}")]
    TrainingFailed { reason: String },

    #[error("Prediction failed: {reason}")]
    PredictionFailed { reason: String },
}

/// Top-level pipeline error combining the domain taxonomies.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Model(#[from] ModelError),
}
