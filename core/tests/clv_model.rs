use clv_core::clv::ClvModel;
use clv_core::error::{ClvError, ClvResult};
use clv_core::features::{FeatureRow, FeatureTable};
use clv_core::transactions_model::{GlobalRate, TransactionsModel, TransactionsPrediction};
use clv_core::types::Periods;
use clv_core::value_model::{GlobalMeanValue, ValueModel, ValuePrediction};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn row(id: &str, recency: f64, frequency: f64, t: f64, value: f64) -> FeatureRow {
    FeatureRow { id: id.to_string(), recency, frequency, t, value: Some(value) }
}

/// The reference three-customer table used throughout.
fn features() -> FeatureTable {
    FeatureTable::new(vec![
        row("0", 1.0, 1.0, 2.0, 1.0),
        row("1", 1.0, 2.0, 2.0, 1.0),
        row("2", 1.0, 2.0, 1.0, 2.0),
    ])
}

fn fitted_model() -> ClvModel {
    ClvModel::new(
        Box::new(GlobalMeanValue::with_mean(1.0)),
        Box::new(GlobalRate::with_rate(1.0)),
    )
}

fn clvs(records: &[clv_core::ClvRecord]) -> Vec<f64> {
    records.iter().map(|r| r.clv).collect()
}

// ── End-to-end ───────────────────────────────────────────────────────────────

/// The worked reference example: historic block at each customer's own
/// rate and value, forecast block from the unit-rate unit-value models,
/// discounted at 15% per period.
///   customer 0: 0.5 + 0.5/1.15 + 1/1.15^2 -> 1.69
///   customer 1: 1   + 1/1.15   + 1/1.15^2 -> 2.63
///   customer 2: 4   + 1/1.15              -> 4.87
#[test]
fn predict_discounts_historic_and_forecast_blocks() {
    let records = fitted_model().predict(&features(), 1, 0.15).unwrap();

    assert_eq!(
        records.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
        ["0", "1", "2"]
    );
    assert_eq!(clvs(&records), [1.69, 2.63, 4.87]);
}

/// At discount_rate = 0 the geometric sums reduce exactly to T and
/// periods (the analytic alpha -> 1 limit), so the CLV is the plain sum
/// of realized and forecast value.
#[test]
fn zero_discount_rate_takes_the_analytic_limit() {
    let records = fitted_model().predict(&features(), 1, 0.0).unwrap();
    assert_eq!(clvs(&records), [2.0, 3.0, 5.0]);
}

/// periods = 0 leaves the historic block alone.
#[test]
fn zero_horizon_is_historic_only() {
    let records = fitted_model().predict(&features(), 0, 0.15).unwrap();
    assert_eq!(clvs(&records), [0.93, 1.87, 4.0]);

    let records = fitted_model().predict(&features(), 0, 0.0).unwrap();
    assert_eq!(clvs(&records), [1.0, 2.0, 4.0]);
}

/// Predicting on zero customers returns an empty table, not an error.
#[test]
fn empty_input_produces_empty_output() {
    let records = fitted_model()
        .predict(&FeatureTable::default(), 1, 0.15)
        .unwrap();
    assert!(records.is_empty());
}

/// A customer whose first transaction falls in the cutoff period has an
/// empty historic interval and contributes nothing historic.
#[test]
fn zero_observation_window_has_no_historic_value() {
    let features = FeatureTable::new(vec![row("new", 0.0, 2.0, 0.0, 5.0)]);

    let records = fitted_model().predict(&features, 0, 0.15).unwrap();
    assert_eq!(records[0].clv, 0.0);
}

// ── Preconditions ────────────────────────────────────────────────────────────

/// An unfitted sub-model makes the whole composite unfitted.
#[test]
fn predict_requires_both_submodels_fitted() {
    let model = ClvModel::new(
        Box::new(GlobalMeanValue::new()),
        Box::new(GlobalRate::with_rate(1.0)),
    );
    assert!(!model.is_fitted());

    let err = model.predict(&features(), 1, 0.2).unwrap_err();
    assert!(matches!(err, ClvError::NotFitted { .. }), "unexpected error: {err}");
}

/// Rows without an observed value cannot be priced: the missing column
/// is reported instead of silently valuing the historic block at zero,
/// even on the horizon-free path.
#[test]
fn predict_requires_the_value_column() {
    let features = FeatureTable::new(vec![FeatureRow {
        id: "a".to_string(),
        recency: 1.0,
        frequency: 2.0,
        t: 3.0,
        value: None,
    }]);

    let err = fitted_model().predict(&features, 0, 0.15).unwrap_err();
    assert!(
        matches!(err, ClvError::MissingColumn { ref column } if column == "value"),
        "unexpected error: {err}"
    );
}

/// Discount rates of exactly 1, above 1, and below 0 are all rejected
/// before any computation.
#[test]
fn out_of_range_discount_rates_are_rejected() {
    for rate in [1.0, 1.5, -0.5] {
        let err = fitted_model().predict(&features(), 1, rate).unwrap_err();
        assert!(
            matches!(err, ClvError::InvalidDiscountRate { .. }),
            "rate {rate}: unexpected error: {err}"
        );
    }
}

// ── periods = 0 skips the predictors entirely ───────────────────────────────

struct RefusingValueModel;

impl ValueModel for RefusingValueModel {
    fn name(&self) -> &'static str {
        "refusing_value"
    }
    fn fit(&mut self, _features: &FeatureTable) -> ClvResult<()> {
        Ok(())
    }
    fn is_fitted(&self) -> bool {
        true
    }
    fn predict(&self, _features: &FeatureTable) -> ClvResult<Vec<ValuePrediction>> {
        Err(ClvError::NotImplemented { model: "refusing_value", operation: "predict" })
    }
}

struct RefusingTransactionsModel;

impl TransactionsModel for RefusingTransactionsModel {
    fn name(&self) -> &'static str {
        "refusing_transactions"
    }
    fn fit(&mut self, _features: &FeatureTable) -> ClvResult<()> {
        Ok(())
    }
    fn is_fitted(&self) -> bool {
        true
    }
    fn predict(
        &self,
        _features: &FeatureTable,
        _periods: Periods,
    ) -> ClvResult<Vec<TransactionsPrediction>> {
        Err(ClvError::NotImplemented {
            model: "refusing_transactions",
            operation: "predict",
        })
    }
}

/// With periods = 0 the aggregator must not consult either sub-model:
/// composing it with predictors that fail on any call still succeeds.
#[test]
fn zero_horizon_never_calls_the_predictors() {
    let model = ClvModel::new(
        Box::new(RefusingValueModel),
        Box::new(RefusingTransactionsModel),
    );

    let records = model.predict(&features(), 0, 0.15).unwrap();
    assert_eq!(clvs(&records), [0.93, 1.87, 4.0]);

    // With a non-zero horizon the same composite fails, proving the
    // zero-horizon path is what skipped them.
    let err = model.predict(&features(), 1, 0.15).unwrap_err();
    assert!(matches!(err, ClvError::NotImplemented { .. }), "unexpected error: {err}");
}
