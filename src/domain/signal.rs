use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional signal classes.
///
/// The discriminants double as the class indices used by the model
/// adapter: probability columns are always ordered [SHORT, LONG, NO_TRADE].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalClass {
    Short,
    Long,
    NoTrade,
}

impl SignalClass {
    pub const ALL: [SignalClass; 3] = [SignalClass::Short, SignalClass::Long, SignalClass::NoTrade];

    pub fn class_index(self) -> usize {
        match self {
            SignalClass::Short => 0,
            SignalClass::Long => 1,
            SignalClass::NoTrade => 2,
        }
    }

    pub fn from_class_index(index: usize) -> Option<SignalClass> {
        match index {
            0 => Some(SignalClass::Short),
            1 => Some(SignalClass::Long),
            2 => Some(SignalClass::NoTrade),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SignalClass::Short => "SHORT",
            SignalClass::Long => "LONG",
            SignalClass::NoTrade => "NO_TRADE",
        }
    }
}

impl fmt::Display for SignalClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A probability distribution over the three signal classes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    #[serde(rename = "SHORT")]
    pub short: f64,
    #[serde(rename = "LONG")]
    pub long: f64,
    #[serde(rename = "NO_TRADE")]
    pub no_trade: f64,
}

impl ClassProbabilities {
    /// Normalizes raw non-negative scores into a distribution.
    ///
    /// Scores are clamped to [0, 1] first; an all-zero score vector maps
    /// to the uniform distribution rather than dividing by zero.
    pub fn from_scores(scores: [f64; 3]) -> Self {
        let clamped: Vec<f64> = scores.iter().map(|s| s.clamp(0.0, 1.0)).collect();
        let sum: f64 = clamped.iter().sum();
        if sum <= f64::EPSILON {
            return Self {
                short: 1.0 / 3.0,
                long: 1.0 / 3.0,
                no_trade: 1.0 / 3.0,
            };
        }
        Self {
            short: clamped[0] / sum,
            long: clamped[1] / sum,
            no_trade: clamped[2] / sum,
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.short, self.long, self.no_trade]
    }

    /// Highest-probability class and its probability.
    pub fn argmax(&self) -> (SignalClass, f64) {
        let probs = self.as_array();
        let mut best = 0;
        for i in 1..probs.len() {
            if probs[i] > probs[best] {
                best = i;
            }
        }
        (SignalClass::from_class_index(best).unwrap(), probs[best])
    }
}
