use crate::domain::errors::ModelError;
use crate::domain::ports::Classifier;
use crate::domain::signal::{ClassProbabilities, SignalClass};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::info;

/// Fixed shuffle seed so importance scores are reproducible across runs.
const IMPORTANCE_SEED: u64 = 17;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
        }
    }
}

/// One-vs-rest random forest ensemble for the 3-class signal problem.
///
/// One regressor per class is fitted against that class's one-hot target;
/// at prediction time the three scores are normalized into a probability
/// distribution. The fitted model is immutable: prediction never mutates
/// state, so one instance can back concurrent readers.
#[derive(Serialize, Deserialize)]
pub struct SmartcoreClassifier {
    params: ForestParams,
    /// One forest per class, [SHORT, LONG, NO_TRADE]; empty until fitted.
    forests: Vec<Forest>,
    columns: Vec<String>,
    /// Permutation importance per column, aligned with `columns`.
    importance: Vec<f64>,
}

impl SmartcoreClassifier {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            forests: Vec::new(),
            columns: Vec::new(),
            importance: Vec::new(),
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.forests.len() == SignalClass::ALL.len()
    }

    fn matrix(x: &[Vec<f64>]) -> Result<DenseMatrix<f64>, ModelError> {
        DenseMatrix::from_2d_vec(&x.to_vec()).map_err(|e| ModelError::PredictionFailed {
            reason: format!("matrix construction failed: {e}"),
        })
    }

    fn forest_params(&self) -> RandomForestRegressorParameters {
        RandomForestRegressorParameters::default()
            .with_n_trees(self.params.n_trees)
            .with_max_depth(self.params.max_depth)
            .with_min_samples_split(self.params.min_samples_split)
    }

    /// Raw per-class scores for every row of `x`.
    fn scores(&self, x: &DenseMatrix<f64>, rows: usize) -> Result<Vec<[f64; 3]>, ModelError> {
        let mut scores = vec![[0.0f64; 3]; rows];
        for (k, forest) in self.forests.iter().enumerate() {
            let predictions = forest.predict(x).map_err(|e| ModelError::PredictionFailed {
                reason: format!("forest {k} prediction failed: {e}"),
            })?;
            for (row, value) in predictions.into_iter().enumerate() {
                scores[row][k] = value;
            }
        }
        Ok(scores)
    }

    /// Importance of each column as the accuracy lost when that column is
    /// shuffled across the training rows. Informational only.
    fn permutation_importance(
        &self,
        x: &[Vec<f64>],
        y: &[SignalClass],
    ) -> Result<Vec<f64>, ModelError> {
        let baseline = self.training_accuracy(x, y)?;
        let mut rng = StdRng::seed_from_u64(IMPORTANCE_SEED);
        let mut importance = Vec::with_capacity(self.columns.len());

        for col in 0..self.columns.len() {
            let mut shuffled_column: Vec<f64> = x.iter().map(|row| row[col]).collect();
            shuffled_column.shuffle(&mut rng);

            let mut permuted = x.to_vec();
            for (row, value) in permuted.iter_mut().zip(shuffled_column.into_iter()) {
                row[col] = value;
            }
            let accuracy = self.training_accuracy(&permuted, y)?;
            importance.push((baseline - accuracy).max(0.0));
        }
        Ok(importance)
    }

    fn training_accuracy(&self, x: &[Vec<f64>], y: &[SignalClass]) -> Result<f64, ModelError> {
        let matrix = Self::matrix(x)?;
        let scores = self.scores(&matrix, x.len())?;
        let correct = scores
            .iter()
            .zip(y.iter())
            .filter(|(s, label)| {
                ClassProbabilities::from_scores(**s).argmax().0 == **label
            })
            .count();
        Ok(correct as f64 / x.len() as f64)
    }
}

impl Classifier for SmartcoreClassifier {
    fn fit(
        &mut self,
        x: &[Vec<f64>],
        y: &[SignalClass],
        columns: &[String],
    ) -> Result<(), ModelError> {
        if x.is_empty() || x.len() != y.len() {
            return Err(ModelError::TrainingFailed {
                reason: format!("bad training shape: {} rows, {} labels", x.len(), y.len()),
            });
        }
        if columns.len() != x[0].len() {
            return Err(ModelError::TrainingFailed {
                reason: format!(
                    "{} columns named but rows have {} values",
                    columns.len(),
                    x[0].len()
                ),
            });
        }

        let matrix = Self::matrix(x)?;
        let mut forests = Vec::with_capacity(SignalClass::ALL.len());
        for class in SignalClass::ALL {
            let targets: Vec<f64> = y
                .iter()
                .map(|label| if *label == class { 1.0 } else { 0.0 })
                .collect();
            let forest = RandomForestRegressor::fit(&matrix, &targets, self.forest_params())
                .map_err(|e| ModelError::TrainingFailed {
                    reason: format!("forest for {class} failed: {e}"),
                })?;
            forests.push(forest);
        }

        self.forests = forests;
        self.columns = columns.to_vec();
        self.importance = self.permutation_importance(x, y)?;
        info!(
            "Fitted {} forests on {} rows x {} columns",
            self.forests.len(),
            x.len(),
            columns.len()
        );
        Ok(())
    }

    fn predict(
        &self,
        x: &[Vec<f64>],
        columns: &[String],
    ) -> Result<Vec<ClassProbabilities>, ModelError> {
        if !self.is_fitted() {
            return Err(ModelError::NotFitted);
        }
        if columns != self.columns.as_slice() {
            return Err(ModelError::SchemaMismatch {
                expected: self.columns.clone(),
                actual: columns.to_vec(),
            });
        }
        if x.is_empty() {
            return Ok(Vec::new());
        }

        let matrix = Self::matrix(x)?;
        let scores = self.scores(&matrix, x.len())?;
        Ok(scores
            .into_iter()
            .map(ClassProbabilities::from_scores)
            .collect())
    }

    fn feature_columns(&self) -> Option<&[String]> {
        if self.is_fitted() {
            Some(&self.columns)
        } else {
            None
        }
    }

    fn feature_importance(&self) -> Vec<(String, f64)> {
        let mut scored: Vec<(String, f64)> = self
            .columns
            .iter()
            .cloned()
            .zip(self.importance.iter().copied())
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_data() -> (Vec<Vec<f64>>, Vec<SignalClass>, Vec<String>) {
        // First feature separates the classes; second is noise
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..60 {
            let noise = (i as f64 * 0.37).sin();
            let (value, label) = match i % 3 {
                0 => (-1.0, SignalClass::Short),
                1 => (1.0, SignalClass::Long),
                _ => (0.0, SignalClass::NoTrade),
            };
            x.push(vec![value, noise]);
            y.push(label);
        }
        (x, y, vec!["direction".to_string(), "noise".to_string()])
    }

    fn small_params() -> ForestParams {
        ForestParams {
            n_trees: 10,
            max_depth: 4,
            min_samples_split: 2,
        }
    }

    #[test]
    fn test_unfitted_predict_fails() {
        let model = SmartcoreClassifier::new(small_params());
        let err = model
            .predict(&[vec![0.0, 0.0]], &["direction".to_string(), "noise".to_string()])
            .unwrap_err();
        assert!(matches!(err, ModelError::NotFitted));
    }

    #[test]
    fn test_fit_then_predict_separable_data() {
        let (x, y, columns) = training_data();
        let mut model = SmartcoreClassifier::new(small_params());
        model.fit(&x, &y, &columns).unwrap();

        let probs = model
            .predict(&[vec![1.0, 0.0], vec![-1.0, 0.0]], &columns)
            .unwrap();
        assert_eq!(probs.len(), 2);
        assert_eq!(probs[0].argmax().0, SignalClass::Long);
        assert_eq!(probs[1].argmax().0, SignalClass::Short);
        for p in probs {
            let sum = p.short + p.long + p.no_trade;
            assert!((sum - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_schema_mismatch_detected() {
        let (x, y, columns) = training_data();
        let mut model = SmartcoreClassifier::new(small_params());
        model.fit(&x, &y, &columns).unwrap();

        let reordered = vec!["noise".to_string(), "direction".to_string()];
        let err = model.predict(&[vec![0.0, 0.0]], &reordered).unwrap_err();
        assert!(matches!(err, ModelError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_informative_column_ranks_first() {
        let (x, y, columns) = training_data();
        let mut model = SmartcoreClassifier::new(small_params());
        model.fit(&x, &y, &columns).unwrap();

        let importance = model.feature_importance();
        assert_eq!(importance.len(), 2);
        assert_eq!(importance[0].0, "direction");
    }

    #[test]
    fn test_serde_round_trip_predicts_identically() {
        let (x, y, columns) = training_data();
        let mut model = SmartcoreClassifier::new(small_params());
        model.fit(&x, &y, &columns).unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let restored: SmartcoreClassifier = serde_json::from_str(&json).unwrap();

        let query = vec![vec![0.5, -0.2], vec![-0.7, 0.9]];
        assert_eq!(
            model.predict(&query, &columns).unwrap(),
            restored.predict(&query, &columns).unwrap()
        );
    }
}
