use clv_core::error::ClvError;
use clv_core::features::{FeatureRow, FeatureTable};
use clv_core::value_model::{GammaGamma, GlobalMeanValue, LocalMeanValue, ValueModel};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn row(id: &str, recency: f64, frequency: f64, t: f64, value: Option<f64>) -> FeatureRow {
    FeatureRow { id: id.to_string(), recency, frequency, t, value }
}

fn table(rows: Vec<FeatureRow>) -> FeatureTable {
    FeatureTable::new(rows)
}

// ── GlobalMeanValue ──────────────────────────────────────────────────────────

/// The fitted mean weights each customer's value by their transaction
/// count: sum(value * frequency) / sum(frequency).
#[test]
fn global_mean_is_transaction_weighted() {
    let features = table(vec![
        row("a", 0.0, 3.0, 5.0, Some(10.0)),
        row("b", 1.0, 1.0, 4.0, Some(50.0)),
    ]);

    let mut model = GlobalMeanValue::new();
    model.fit(&features).unwrap();

    // (10*3 + 50*1) / 4 = 20
    assert_eq!(model.global_mean, Some(20.0));

    let predictions = model.predict(&features).unwrap();
    assert!(predictions.iter().all(|p| p.value == 20.0));
    assert_eq!(predictions[0].id, "a");
    assert_eq!(predictions[1].id, "b");
}

/// Refitting an already-fitted model leaves the parameter untouched.
#[test]
fn global_mean_fit_is_idempotent() {
    let features = table(vec![row("a", 0.0, 2.0, 5.0, Some(10.0))]);
    let other = table(vec![row("a", 0.0, 2.0, 5.0, Some(999.0))]);

    let mut model = GlobalMeanValue::new();
    model.fit(&features).unwrap();
    let first = model.global_mean;

    model.fit(&other).unwrap();
    assert_eq!(model.global_mean, first, "second fit must be a no-op");
}

/// Predicting before fitting fails with NotFitted.
#[test]
fn global_mean_unfitted_predict_fails() {
    let features = table(vec![row("a", 0.0, 1.0, 1.0, Some(1.0))]);

    let err = GlobalMeanValue::new().predict(&features).unwrap_err();
    assert!(matches!(err, ClvError::NotFitted { .. }), "unexpected error: {err}");
}

/// Fitting without a value column fails with MissingColumn.
#[test]
fn global_mean_fit_requires_values() {
    let features = table(vec![row("a", 0.0, 1.0, 1.0, None)]);

    let err = GlobalMeanValue::new().fit(&features).unwrap_err();
    assert!(
        matches!(err, ClvError::MissingColumn { ref column } if column == "value"),
        "unexpected error: {err}"
    );
}

// ── LocalMeanValue ───────────────────────────────────────────────────────────

/// The pass-through model is always fitted and echoes each customer's
/// own observed value.
#[test]
fn local_mean_passes_observed_values_through() {
    let features = table(vec![
        row("a", 0.0, 2.0, 5.0, Some(12.5)),
        row("b", 1.0, 1.0, 4.0, Some(3.0)),
    ]);

    let model = LocalMeanValue::new();
    assert!(model.is_fitted());

    let predictions = model.predict(&features).unwrap();
    assert_eq!(predictions[0].value, 12.5);
    assert_eq!(predictions[1].value, 3.0);
}

/// Pass-through on rows without a value column fails rather than
/// inventing values.
#[test]
fn local_mean_requires_values() {
    let features = table(vec![row("a", 0.0, 1.0, 1.0, None)]);

    let err = LocalMeanValue::new().predict(&features).unwrap_err();
    assert!(matches!(err, ClvError::MissingColumn { .. }), "unexpected error: {err}");
}

// ── GammaGamma ───────────────────────────────────────────────────────────────

/// One posterior draw, computed by hand:
/// E = p * (mu + f*v) / (p*f + q - 1) = 6 * (15 + 6) / (12 + 3) = 8.4.
#[test]
fn gamma_gamma_single_sample_matches_hand_computation() {
    let model = GammaGamma::from_samples(vec![6.0], vec![4.0], vec![15.0]).unwrap();
    let features = table(vec![row("a", 1.0, 2.0, 5.0, Some(3.0))]);

    let predictions = model.predict(&features).unwrap();
    assert_eq!(predictions[0].value, 8.4);
}

/// The posterior mean averages the per-sample conditional expectation,
/// not the formula evaluated at averaged parameters. With draws
/// (p, q, mu) = (1, 2.5, 5) and (5, 6, 30) and a customer with
/// frequency 2, value 4:
///   sample 1: 1 * 13 / 3.5   = 3.714285...
///   sample 2: 5 * 38 / 15    = 12.666666...
///   mean                     = 8.190476... -> 8.19
/// whereas the averaged-parameter formula would give 76.5/9.25 = 8.27.
#[test]
fn gamma_gamma_averages_function_of_each_sample() {
    let model =
        GammaGamma::from_samples(vec![1.0, 5.0], vec![2.5, 6.0], vec![5.0, 30.0]).unwrap();
    let features = table(vec![row("a", 1.0, 2.0, 5.0, Some(4.0))]);

    let predictions = model.predict(&features).unwrap();
    assert_eq!(predictions[0].value, 8.19);
}

/// Draws with q <= 1 make the expectation undefined; they are excluded
/// from the mean and the remaining draws carry the estimate.
#[test]
fn gamma_gamma_excludes_undefined_samples() {
    let _ = env_logger::builder().is_test(true).try_init();

    let model =
        GammaGamma::from_samples(vec![6.0, 1.0], vec![4.0, 0.5], vec![15.0, 10.0]).unwrap();
    let features = table(vec![row("a", 1.0, 2.0, 5.0, Some(3.0))]);

    let predictions = model.predict(&features).unwrap();
    assert_eq!(
        predictions[0].value, 8.4,
        "only the q = 4 draw is defined, so the estimate equals its expectation"
    );
}

/// When every draw has q <= 1 there is nothing to average; the call
/// fails instead of returning NaN. q = 1 exactly is also undefined.
#[test]
fn gamma_gamma_fails_when_no_sample_is_defined() {
    let model =
        GammaGamma::from_samples(vec![6.0, 1.0], vec![0.5, 1.0], vec![15.0, 10.0]).unwrap();
    let features = table(vec![row("a", 1.0, 2.0, 5.0, Some(3.0))]);

    let err = model.predict(&features).unwrap_err();
    assert!(matches!(err, ClvError::UndefinedEstimate { .. }), "unexpected error: {err}");
}

/// Gamma-Gamma prediction needs the observed value column.
#[test]
fn gamma_gamma_requires_values() {
    let model = GammaGamma::from_samples(vec![6.0], vec![4.0], vec![15.0]).unwrap();
    let features = table(vec![row("a", 1.0, 2.0, 5.0, None)]);

    let err = model.predict(&features).unwrap_err();
    assert!(matches!(err, ClvError::MissingColumn { .. }), "unexpected error: {err}");
}
