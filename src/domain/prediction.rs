use crate::domain::signal::{ClassProbabilities, SignalClass};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The packaged outcome of one inference call.
///
/// `confidence_threshold` is carried through from configuration for the
/// consumer to act on; the pipeline itself never gates on it. Serialized
/// timestamps are ISO-8601 in UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub timestamp: DateTime<Utc>,
    pub signal: SignalClass,
    pub confidence: f64,
    pub predicted_class: usize,
    pub class_probabilities: ClassProbabilities,
    pub confidence_threshold: f64,
    /// Feature values the model saw, keyed by column name.
    pub input_snapshot: BTreeMap<String, f64>,
}
