use crate::domain::bar::Bar;
use crate::domain::errors::{DataError, ModelError};
use crate::domain::signal::{ClassProbabilities, SignalClass};

/// Source of ordered raw bars for a symbol.
///
/// Absence of data is a normal outcome: implementations return an empty
/// vector (or `DataError::Unavailable` when the source itself is gone),
/// never a panic.
pub trait BarSource {
    fn fetch(&self, symbol: &str) -> Result<Vec<Bar>, DataError>;
}

/// Training/inference boundary for the 3-class signal model.
///
/// The engine behind this trait is opaque to the pipeline. The only
/// contract the pipeline relies on is column discipline: `predict` must be
/// called with exactly the ordered column set recorded at `fit` time, and
/// implementations fail with `ModelError::SchemaMismatch` otherwise.
pub trait Classifier: Send + Sync {
    /// Fits the model on a feature matrix and aligned label vector.
    ///
    /// `columns` names the matrix columns in order and is recorded for
    /// later schema checks.
    fn fit(
        &mut self,
        x: &[Vec<f64>],
        y: &[SignalClass],
        columns: &[String],
    ) -> Result<(), ModelError>;

    /// Per-row probability distributions, columns ordered [SHORT, LONG, NO_TRADE].
    fn predict(
        &self,
        x: &[Vec<f64>],
        columns: &[String],
    ) -> Result<Vec<ClassProbabilities>, ModelError>;

    /// Ordered column set recorded at fit time, if fitted.
    fn feature_columns(&self) -> Option<&[String]>;

    /// Per-column importance scores, highest first. Informational only.
    fn feature_importance(&self) -> Vec<(String, f64)>;
}
