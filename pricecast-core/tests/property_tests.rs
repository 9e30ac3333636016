//! Property tests for data-handling invariants.
//!
//! Uses proptest to verify:
//! 1. Signal saturation: a prediction never moves more than 1% off its reference
//! 2. Alignment: every aligned column has exactly the timestamp length
//! 3. Forward-fill: only a leading run of gaps can survive
//! 4. Preprocessing: output rows are complete and date-ordered

use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use pricecast_core::data::align_length;
use pricecast_core::domain::{ActionRecord, CleanBar, Dataset, FeatureRow, PriceBar, RawAction};
use pricecast_core::features::{
    forward_filled, FeaturePreprocessor, IndicatorFrame, IndicatorSource,
};
use pricecast_core::signal::SignalTranslator;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_action() -> impl Strategy<Value = RawAction> {
    prop_oneof![
        (-1e12..1e12_f64).prop_map(RawAction::Scalar),
        prop::collection::vec(-1e12..1e12_f64, 0..4).prop_map(RawAction::Sequence),
    ]
}

fn arb_close() -> impl Strategy<Value = f64> {
    (0.01..10_000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

/// Every other close becomes a gap in the indicator column.
struct HoleyIndicator;

impl IndicatorSource for HoleyIndicator {
    fn indicator_names(&self) -> Vec<String> {
        vec!["holey".into()]
    }

    fn compute(&self, bars: &[CleanBar]) -> anyhow::Result<IndicatorFrame> {
        let col = bars
            .iter()
            .enumerate()
            .map(|(i, b)| (i % 2 == 1).then_some(b.close))
            .collect();
        IndicatorFrame::new(self.indicator_names(), vec![col])
    }
}

// ── 1. Signal saturation ─────────────────────────────────────────────

proptest! {
    #[test]
    fn prediction_within_one_percent(
        hmax in 1u32..10_000,
        reference in arb_close(),
        action in arb_action(),
    ) {
        let t = SignalTranslator::new(NonZeroU32::new(hmax).unwrap());
        let predicted = t.predict_next(reference, Some(&action));
        prop_assert!((predicted / reference - 1.0).abs() <= 0.01 + 1e-12);
    }

    #[test]
    fn backtest_rows_within_one_percent_of_predecessor(
        closes in prop::collection::vec(arb_close(), 1..40),
        raw in prop::collection::vec(-500.0..500.0_f64, 0..40),
    ) {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let rows: Vec<FeatureRow> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| FeatureRow {
                ticker: "SPY".into(),
                date: start + Duration::days(i as i64),
                open: c, high: c, low: c, close: c, adj_close: c, volume: 1.0,
                indicators: vec![],
            })
            .collect();
        let actions: Vec<ActionRecord> = raw
            .iter()
            .enumerate()
            .map(|(i, &a)| ActionRecord {
                date: start + Duration::days(i as i64 * 2),
                action: RawAction::Scalar(a),
            })
            .collect();

        let t = SignalTranslator::new(NonZeroU32::new(100).unwrap());
        let series = t.price_comparison(&Dataset::new(vec![], rows), &actions);
        prop_assert_eq!(series.len(), closes.len());
        for (i, row) in series.iter().enumerate() {
            let reference = if i == 0 { closes[0] } else { closes[i - 1] };
            prop_assert!((row.predicted_close / reference - 1.0).abs() <= 0.01 + 1e-12);
            prop_assert_eq!(row.actual_close, closes[i]);
        }
    }
}

// ── 2. Alignment ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn aligned_length_matches_timestamps(
        column in prop::option::of(prop::collection::vec(prop::option::of(-1e6..1e6_f64), 0..20)),
        len in 0usize..20,
    ) {
        let aligned = align_length(column.as_deref(), len);
        prop_assert_eq!(aligned.len(), len);
        if let Some(col) = &column {
            let kept = col.len().min(len);
            prop_assert_eq!(&aligned[..kept], &col[..kept]);
            prop_assert!(aligned[kept..].iter().all(Option::is_none));
        } else {
            prop_assert!(aligned.iter().all(Option::is_none));
        }
    }
}

// ── 3. Forward-fill ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn forward_fill_leaves_only_leading_gaps(
        values in prop::collection::vec(prop::option::of(0i32..100), 0..30),
    ) {
        let filled = forward_filled(&values);
        let leading = values.iter().take_while(|v| v.is_none()).count();
        prop_assert!(filled[..leading].iter().all(Option::is_none));
        prop_assert!(filled[leading..].iter().all(Option::is_some));
        for (orig, out) in values.iter().zip(&filled) {
            if orig.is_some() {
                prop_assert_eq!(orig, out);
            }
        }
    }
}

// ── 4. Preprocessing ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn preprocessed_rows_are_complete(
        gaps in prop::collection::vec(any::<bool>(), 2..60),
    ) {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars: Vec<PriceBar> = gaps
            .iter()
            .enumerate()
            .map(|(i, &gap)| PriceBar {
                ticker: "SPY".into(),
                date: start + Duration::days(i as i64),
                open: Some(1.0),
                high: Some(1.0),
                low: Some(1.0),
                close: if gap { None } else { Some(10.0 + i as f64) },
                adj_close: Some(1.0),
                volume: Some(1.0),
            })
            .collect();
        let clean = bars.iter().filter(|b| b.close.is_some()).count();

        let pre = FeaturePreprocessor::new(Arc::new(HoleyIndicator));
        match pre.process("SPY", &bars, 1) {
            Ok(ds) => {
                // Only the first clean row lacks a value to carry.
                prop_assert_eq!(ds.len(), clean - 1);
                for w in ds.rows().windows(2) {
                    prop_assert!(w[0].date < w[1].date);
                }
                prop_assert!(ds.rows().iter().all(|r| r.indicators.len() == 1));
            }
            Err(_) => prop_assert!(clean <= 1),
        }
    }
}
