use chrono::{Duration, TimeZone, Utc};
use fxcast::application::feature_builder::FeatureBuilder;
use fxcast::application::splitter::temporal_split;
use fxcast::config::{FeatureParams, LabelParams};
use fxcast::domain::bar::Bar;
use fxcast::domain::signal::SignalClass;
use fxcast::infrastructure::synthetic::SyntheticBarSource;

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

fn small_builder() -> FeatureBuilder {
    let features = FeatureParams {
        return_periods: vec![1, 5],
        sma_periods: vec![5],
        atr_periods: vec![5],
        rsi_period: 5,
    };
    let label = LabelParams {
        horizon: 5,
        threshold_pct: 0.1,
    };
    FeatureBuilder::new(&features, &label)
}

fn synthetic_bars(n: usize) -> Vec<Bar> {
    SyntheticBarSource::new(
        42,
        n,
        145.0,
        Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap(),
    )
    .generate()
}

#[test]
fn empty_input_yields_empty_table_not_error() {
    let table = small_builder().build("USDJPY", &[]);
    assert!(table.is_empty());
    assert!(!table.columns.is_empty());
}

#[test]
fn too_short_input_yields_empty_table() {
    // 8 bars cannot cover lookback 5 plus horizon 5
    let closes: Vec<f64> = (0..8).map(|i| 100.0 + i as f64 * 0.1).collect();
    let table = small_builder().build("USDJPY", &bars_from_closes(&closes));
    assert!(table.is_empty());
}

#[test]
fn rebuilding_from_same_bars_is_identical() {
    let bars = synthetic_bars(400);
    let builder = small_builder();
    let first = builder.build("USDJPY", &bars);
    let second = builder.build("USDJPY", &bars);
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn every_retained_row_is_fully_defined() {
    let bars = synthetic_bars(400);
    let table = small_builder().build("USDJPY", &bars);
    for row in &table.rows {
        assert_eq!(row.values.len(), table.columns.len());
        assert!(row.values.iter().all(|v| v.is_finite()));
        assert!(row.target_return.is_finite());
    }
    for pair in table.rows.windows(2) {
        assert!(pair[0].timestamp < pair[1].timestamp);
    }
}

#[test]
fn labels_respect_threshold_band() {
    let bars = synthetic_bars(400);
    let table = small_builder().build("USDJPY", &bars);
    for row in &table.rows {
        match row.target {
            SignalClass::Long => assert!(row.target_return > 0.1),
            SignalClass::Short => assert!(row.target_return < -0.1),
            SignalClass::NoTrade => assert!(row.target_return.abs() <= 0.1),
        }
    }
}

#[test]
fn calendar_columns_are_in_range() {
    let bars = synthetic_bars(400);
    let table = small_builder().build("USDJPY", &bars);
    let hour = table.column_index("hour").unwrap();
    let session = table.column_index("market_session").unwrap();
    let dow = table.column_index("day_of_week").unwrap();
    let weekend = table.column_index("is_weekend").unwrap();
    for row in &table.rows {
        assert!((0.0..24.0).contains(&row.values[hour]));
        assert!((0.0..=3.0).contains(&row.values[session]));
        assert!((0.0..7.0).contains(&row.values[dow]));
        assert!(row.values[weekend] == 0.0 || row.values[weekend] == 1.0);
        let expected_weekend = if row.values[dow] >= 5.0 { 1.0 } else { 0.0 };
        assert_eq!(row.values[weekend], expected_weekend);
    }
}

#[test]
fn historical_and_fresh_rows_agree() {
    // A row computed over a bar prefix must equal the same row from the
    // full series: features may only depend on bars at or before the row.
    let bars = synthetic_bars(300);
    let builder = small_builder();
    let full = builder.build("USDJPY", &bars);
    let prefix = builder.build("USDJPY", &bars[..200]);
    assert!(!prefix.is_empty());

    for row in &prefix.rows {
        let counterpart = full
            .rows
            .iter()
            .find(|r| r.timestamp == row.timestamp)
            .expect("prefix row missing from full table");
        assert_eq!(counterpart.values, row.values);
        assert_eq!(counterpart.target_return, row.target_return);
        assert_eq!(counterpart.target, row.target);
    }
}

#[test]
fn validation_rows_never_precede_training_rows() {
    let bars = synthetic_bars(400);
    let table = small_builder().build("USDJPY", &bars);
    for f in [0.05, 0.2, 0.33, 0.5, 0.8, 0.95] {
        let (train, validation) = temporal_split(&table, f);
        assert_eq!(train.len() + validation.len(), table.len());
        if let (Some(last), Some(first)) = (train.rows.last(), validation.rows.first()) {
            assert!(last.timestamp < first.timestamp);
        }
    }
}
