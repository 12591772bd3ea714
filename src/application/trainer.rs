use crate::application::splitter::temporal_split;
use crate::domain::errors::{DataError, PipelineError};
use crate::domain::features::FeatureTable;
use crate::domain::ports::Classifier;
use crate::domain::signal::SignalClass;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Fewest rows a table must have before a train/validation split makes sense.
const MIN_TRAINING_ROWS: usize = 10;

/// Precision/recall breakdown for one signal class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class: SignalClass,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Validation rows whose true label is this class.
    pub support: usize,
}

/// Post-training evaluation on the held-out chronological tail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub train_rows: usize,
    pub validation_rows: usize,
    pub accuracy: f64,
    pub per_class: Vec<ClassMetrics>,
    /// confusion[actual][predicted], classes in [SHORT, LONG, NO_TRADE] order.
    pub confusion: [[usize; 3]; 3],
    /// Column importances, highest first.
    pub feature_importance: Vec<(String, f64)>,
}

/// Trains a classifier on a feature table and evaluates it on the
/// chronological tail.
pub struct TrainingService {
    validation_fraction: f64,
}

impl TrainingService {
    pub fn new(validation_fraction: f64) -> Self {
        Self {
            validation_fraction,
        }
    }

    /// Splits, fits and evaluates. The label columns never enter the
    /// feature matrix; the column set handed to `fit` is recorded by the
    /// classifier and must be reused verbatim for every later prediction.
    pub fn train(
        &self,
        table: &FeatureTable,
        classifier: &mut dyn Classifier,
    ) -> Result<TrainingReport, PipelineError> {
        if table.len() < MIN_TRAINING_ROWS {
            return Err(DataError::InsufficientHistory {
                symbol: table.symbol.clone(),
                got: table.len(),
                need: MIN_TRAINING_ROWS,
            }
            .into());
        }

        let (train, validation) = temporal_split(table, self.validation_fraction);
        info!(
            "Training on {} rows, validating on {} rows ({} features)",
            train.len(),
            validation.len(),
            table.columns.len()
        );
        log_class_distribution(&train);

        classifier.fit(&train.feature_matrix(), &train.labels(), &train.columns)?;

        let report = self.evaluate(classifier, &train, &validation)?;
        info!(
            "Validation accuracy: {:.4} over {} rows",
            report.accuracy, report.validation_rows
        );
        for metrics in &report.per_class {
            info!(
                "  {:>8}: precision {:.4}, recall {:.4}, f1 {:.4} (support {})",
                metrics.class, metrics.precision, metrics.recall, metrics.f1, metrics.support
            );
        }
        for (name, score) in report.feature_importance.iter().take(10) {
            info!("  importance {name}: {score:.5}");
        }
        Ok(report)
    }

    fn evaluate(
        &self,
        classifier: &dyn Classifier,
        train: &FeatureTable,
        validation: &FeatureTable,
    ) -> Result<TrainingReport, PipelineError> {
        let mut confusion = [[0usize; 3]; 3];
        let mut correct = 0usize;

        if validation.is_empty() {
            warn!("Validation split is empty; reporting train-only metrics");
        } else {
            let probabilities =
                classifier.predict(&validation.feature_matrix(), &validation.columns)?;
            for (row, probs) in validation.rows.iter().zip(probabilities.iter()) {
                let (predicted, _) = probs.argmax();
                confusion[row.target.class_index()][predicted.class_index()] += 1;
                if predicted == row.target {
                    correct += 1;
                }
            }
        }

        let accuracy = if validation.is_empty() {
            0.0
        } else {
            correct as f64 / validation.len() as f64
        };

        let per_class = SignalClass::ALL
            .iter()
            .map(|&class| {
                let k = class.class_index();
                let support: usize = confusion[k].iter().sum();
                let predicted: usize = (0..3).map(|a| confusion[a][k]).sum();
                let hits = confusion[k][k];
                let precision = if predicted > 0 {
                    hits as f64 / predicted as f64
                } else {
                    0.0
                };
                let recall = if support > 0 {
                    hits as f64 / support as f64
                } else {
                    0.0
                };
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    class,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        Ok(TrainingReport {
            train_rows: train.len(),
            validation_rows: validation.len(),
            accuracy,
            per_class,
            confusion,
            feature_importance: classifier.feature_importance(),
        })
    }
}

fn log_class_distribution(table: &FeatureTable) {
    let mut counts = [0usize; 3];
    for row in &table.rows {
        counts[row.target.class_index()] += 1;
    }
    info!(
        "Class distribution: SHORT {}, LONG {}, NO_TRADE {}",
        counts[0], counts[1], counts[2]
    );
}
