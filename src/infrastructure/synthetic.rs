use crate::domain::bar::Bar;
use crate::domain::errors::DataError;
use crate::domain::ports::BarSource;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

/// Seeded random-walk bar generator for demos and offline testing.
///
/// Deterministic for a fixed seed, so pipelines built on it are
/// reproducible end to end.
pub struct SyntheticBarSource {
    pub seed: u64,
    pub bars: usize,
    pub base_price: f64,
    pub start: DateTime<Utc>,
}

impl SyntheticBarSource {
    pub fn new(seed: u64, bars: usize, base_price: f64, start: DateTime<Utc>) -> Self {
        Self {
            seed,
            bars,
            base_price,
            start,
        }
    }

    pub fn generate(&self) -> Vec<Bar> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut close = self.base_price;
        let mut bars = Vec::with_capacity(self.bars);

        for i in 0..self.bars {
            let open = close;
            // Slight upward drift so all three label classes occur
            let step_pct = rng.random_range(-0.0020..0.0021);
            close = open * (1.0 + step_pct);
            let high = open.max(close) + rng.random_range(0.0..0.0005) * open;
            let low = open.min(close) - rng.random_range(0.0..0.0005) * open;
            bars.push(Bar {
                timestamp: self.start + Duration::minutes(i as i64),
                open,
                high,
                low,
                close,
            });
        }

        info!("Generated {} synthetic bars (seed {})", bars.len(), self.seed);
        bars
    }
}

impl BarSource for SyntheticBarSource {
    fn fetch(&self, _symbol: &str) -> Result<Vec<Bar>, DataError> {
        Ok(self.generate())
    }
}
