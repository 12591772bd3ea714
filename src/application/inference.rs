use crate::domain::errors::ModelError;
use crate::domain::features::FeatureTable;
use crate::domain::ports::Classifier;
use crate::domain::prediction::PredictionResult;
use crate::domain::signal::ClassProbabilities;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Applies a trained model to feature rows and packages the results.
///
/// Holds its own immutable model handle; concurrent services can score
/// independently as long as each owns its model. A service without a model
/// reports "no result" rather than failing.
pub struct InferenceService {
    model: Option<Box<dyn Classifier>>,
    confidence_threshold: f64,
}

impl InferenceService {
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            model: None,
            confidence_threshold,
        }
    }

    pub fn with_model(model: Box<dyn Classifier>, confidence_threshold: f64) -> Self {
        Self {
            model: Some(model),
            confidence_threshold,
        }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Scores the most recent row of `table`.
    ///
    /// Returns `Ok(None)` when no model is loaded or the table is empty.
    /// A column set differing from the one recorded at fit time is a
    /// configuration fault and surfaces as `ModelError::SchemaMismatch`.
    pub fn predict_latest(
        &self,
        table: &FeatureTable,
    ) -> Result<Option<PredictionResult>, ModelError> {
        let Some(model) = self.model.as_deref() else {
            warn!("No model loaded; skipping inference");
            return Ok(None);
        };
        let Some(row) = table.latest() else {
            warn!("Feature table for {} is empty; nothing to score", table.symbol);
            return Ok(None);
        };

        let probabilities = model.predict(&[row.values.clone()], &table.columns)?;
        let result = self.package(row.timestamp, &probabilities[0], row.snapshot(&table.columns));
        info!(
            "Prediction: {} (confidence {:.4})",
            result.signal, result.confidence
        );
        Ok(Some(result))
    }

    /// Scores every row of `table` in input order, one result per row.
    ///
    /// No model or an empty table yields an empty vector.
    pub fn predict_batch(
        &self,
        table: &FeatureTable,
    ) -> Result<Vec<PredictionResult>, ModelError> {
        let Some(model) = self.model.as_deref() else {
            warn!("No model loaded; skipping batch inference");
            return Ok(Vec::new());
        };
        if table.is_empty() {
            return Ok(Vec::new());
        }

        let probabilities = model.predict(&table.feature_matrix(), &table.columns)?;
        let results = table
            .rows
            .iter()
            .zip(probabilities.iter())
            .map(|(row, probs)| {
                self.package(row.timestamp, probs, row.snapshot(&table.columns))
            })
            .collect::<Vec<_>>();
        info!("Batch predictions: {} rows", results.len());
        Ok(results)
    }

    fn package(
        &self,
        timestamp: DateTime<Utc>,
        probabilities: &ClassProbabilities,
        input_snapshot: BTreeMap<String, f64>,
    ) -> PredictionResult {
        let (signal, confidence) = probabilities.argmax();
        PredictionResult {
            timestamp,
            signal,
            confidence,
            predicted_class: signal.class_index(),
            class_probabilities: *probabilities,
            confidence_threshold: self.confidence_threshold,
            input_snapshot,
        }
    }
}
