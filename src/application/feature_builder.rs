use crate::application::indicators;
use crate::config::{FeatureParams, LabelParams};
use crate::domain::bar::Bar;
use crate::domain::features::{FeatureRow, FeatureTable};
use crate::domain::signal::SignalClass;
use chrono::{DateTime, Datelike, Timelike, Utc};
use tracing::info;

/// Builds labeled feature tables from raw bar series.
///
/// The builder is deterministic: the same bars always produce the same
/// table, row for row, so a table can be rebuilt at any time instead of
/// being updated incrementally.
pub struct FeatureBuilder {
    features: FeatureParams,
    label: LabelParams,
}

/// Market session codes derived from the UTC hour.
///
/// Ranges overlap; precedence is the evaluation order below. Tokyo wins
/// the 15:00-16:59 overlap with London, London wins 20:00-23:59 against
/// New York.
fn market_session(hour: u32) -> u8 {
    if (8..17).contains(&hour) {
        0 // Tokyo
    } else if (15..24).contains(&hour) || hour < 2 {
        1 // London / overlap
    } else if (20..24).contains(&hour) || hour < 8 {
        2 // New York
    } else {
        3 // off-session
    }
}

fn day_of_week(ts: &DateTime<Utc>) -> u32 {
    ts.weekday().num_days_from_monday()
}

impl FeatureBuilder {
    pub fn new(features: &FeatureParams, label: &LabelParams) -> Self {
        Self {
            features: features.clone(),
            label: label.clone(),
        }
    }

    /// Ordered feature column names for this configuration.
    ///
    /// This exact order is recorded at fit time and enforced at inference
    /// time, so it must stay stable for a given configuration.
    pub fn column_names(&self) -> Vec<String> {
        let mut columns = vec![
            "open".to_string(),
            "high".to_string(),
            "low".to_string(),
            "close".to_string(),
        ];
        for p in &self.features.return_periods {
            columns.push(format!("return_{p}m"));
        }
        for p in &self.features.sma_periods {
            columns.push(format!("sma_dev_{p}m"));
        }
        for p in &self.features.atr_periods {
            columns.push(format!("atr_{p}m"));
        }
        columns.push("rsi".to_string());
        columns.push("hour".to_string());
        columns.push("market_session".to_string());
        columns.push("day_of_week".to_string());
        columns.push("is_weekend".to_string());
        columns
    }

    /// Assembles the labeled feature table for `bars`.
    ///
    /// Rows without a full lookback window, without a full label horizon,
    /// or with any undefined indicator are dropped. Empty input yields an
    /// empty table, not an error.
    pub fn build(&self, symbol: &str, bars: &[Bar]) -> FeatureTable {
        let columns = self.column_names();
        if bars.is_empty() {
            info!("No bars for {symbol}; feature table is empty");
            return FeatureTable::empty(symbol, columns);
        }

        let n = bars.len();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        // Indicator columns, one Option-series per column, in column order.
        let mut series: Vec<Vec<Option<f64>>> = Vec::with_capacity(columns.len());
        series.push(bars.iter().map(|b| Some(b.open)).collect());
        series.push(bars.iter().map(|b| Some(b.high)).collect());
        series.push(bars.iter().map(|b| Some(b.low)).collect());
        series.push(bars.iter().map(|b| Some(b.close)).collect());
        for &p in &self.features.return_periods {
            series.push(indicators::pct_return_series(&closes, p));
        }
        for &p in &self.features.sma_periods {
            series.push(indicators::sma_deviation_series(&closes, p));
        }
        for &p in &self.features.atr_periods {
            series.push(indicators::average_true_range_series(bars, p));
        }
        series.push(indicators::rsi_series(&closes, self.features.rsi_period));
        series.push(bars.iter().map(|b| Some(b.timestamp.hour() as f64)).collect());
        series.push(
            bars.iter()
                .map(|b| Some(market_session(b.timestamp.hour()) as f64))
                .collect(),
        );
        series.push(
            bars.iter()
                .map(|b| Some(day_of_week(&b.timestamp) as f64))
                .collect(),
        );
        series.push(
            bars.iter()
                .map(|b| Some(if day_of_week(&b.timestamp) >= 5 { 1.0 } else { 0.0 }))
                .collect(),
        );

        // Forward return over the label horizon; undefined for the tail.
        let target_returns: Vec<Option<f64>> = (0..n)
            .map(|t| indicators::forward_return(&closes, self.label.horizon, t))
            .collect();

        let lookback = self.features.max_lookback();
        let mut rows: Vec<FeatureRow> = Vec::new();
        for t in lookback..n {
            let Some(target_return) = target_returns[t] else {
                continue;
            };
            let mut values = Vec::with_capacity(columns.len());
            let mut complete = true;
            for column in &series {
                match column[t] {
                    Some(v) => values.push(v),
                    None => {
                        complete = false;
                        break;
                    }
                }
            }
            if !complete {
                continue;
            }
            rows.push(FeatureRow {
                timestamp: bars[t].timestamp,
                values,
                target_return,
                target: self.classify(target_return),
            });
        }

        info!(
            "Engineered {} feature rows ({} columns) from {} bars for {symbol}",
            rows.len(),
            columns.len(),
            n
        );
        FeatureTable {
            symbol: symbol.to_string(),
            columns,
            rows,
        }
    }

    /// Maps a forward return to its class via the configured band.
    fn classify(&self, target_return: f64) -> SignalClass {
        let tau = self.label.threshold_pct;
        if target_return > tau {
            SignalClass::Long
        } else if target_return < -tau {
            SignalClass::Short
        } else {
            SignalClass::NoTrade
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + Duration::minutes(i as i64),
                open: close,
                high: close + 0.1,
                low: close - 0.1,
                close,
            })
            .collect()
    }

    fn small_params() -> (FeatureParams, LabelParams) {
        (
            FeatureParams {
                return_periods: vec![1, 3],
                sma_periods: vec![3],
                atr_periods: vec![3],
                rsi_period: 3,
            },
            LabelParams {
                horizon: 2,
                threshold_pct: 0.1,
            },
        )
    }

    #[test]
    fn test_session_precedence() {
        assert_eq!(market_session(8), 0);
        assert_eq!(market_session(16), 0);
        // Tokyo wins the 15:00 overlap
        assert_eq!(market_session(15), 0);
        assert_eq!(market_session(17), 1);
        assert_eq!(market_session(23), 1);
        assert_eq!(market_session(0), 1);
        assert_eq!(market_session(1), 1);
        // London band ends at 01:59; New York covers the early morning
        assert_eq!(market_session(2), 2);
        assert_eq!(market_session(7), 2);
    }

    #[test]
    fn test_empty_bars_give_empty_table() {
        let (features, label) = small_params();
        let builder = FeatureBuilder::new(&features, &label);
        let table = builder.build("USDJPY", &[]);
        assert!(table.is_empty());
        assert_eq!(table.columns, builder.column_names());
    }

    #[test]
    fn test_label_scenario() {
        let closes = [100.0, 100.05, 100.5, 99.0, 99.5, 100.0, 100.2, 100.1];
        let (mut features, label) = small_params();
        features.return_periods = vec![1];
        features.sma_periods = vec![];
        features.atr_periods = vec![];
        features.rsi_period = 1;
        let builder = FeatureBuilder::new(&features, &label);
        let table = builder.build("USDJPY", &bars_from_closes(&closes));

        // With RSI period 1, only rows following a down move have a
        // defined RSI; of those, only t=3 still has label horizon left.
        assert_eq!(table.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.timestamp.minute(), 3);
        // (100.0 - 99.0) / 99.0 * 100
        assert!((row.target_return - 1.0101).abs() < 1e-3);
        assert_eq!(row.target, SignalClass::Long);
    }

    #[test]
    fn test_labels_match_threshold_band() {
        let (features, label) = small_params();
        let builder = FeatureBuilder::new(&features, &label);
        assert_eq!(builder.classify(0.5), SignalClass::Long);
        assert_eq!(builder.classify(-0.5), SignalClass::Short);
        assert_eq!(builder.classify(0.1), SignalClass::NoTrade);
        assert_eq!(builder.classify(-0.1), SignalClass::NoTrade);
        assert_eq!(builder.classify(0.0), SignalClass::NoTrade);
    }

    #[test]
    fn test_build_is_deterministic() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.9).sin()).collect();
        let bars = bars_from_closes(&closes);
        let (features, label) = small_params();
        let builder = FeatureBuilder::new(&features, &label);
        let a = builder.build("USDJPY", &bars);
        let b = builder.build("USDJPY", &bars);
        assert_eq!(a, b);
    }

    #[test]
    fn test_trim_accounts_for_lookback_and_horizon() {
        // Oscillating closes keep every RSI window mixed-sign, so the only
        // trims are the lookback head and the horizon tail.
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 2.1).sin()).collect();
        let bars = bars_from_closes(&closes);
        let (features, label) = small_params();
        let builder = FeatureBuilder::new(&features, &label);
        let table = builder.build("USDJPY", &bars);
        assert_eq!(
            table.len(),
            bars.len() - features.max_lookback() - label.horizon
        );
    }
}
