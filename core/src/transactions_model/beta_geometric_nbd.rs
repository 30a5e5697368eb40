use super::{TransactionsModel, TransactionsPrediction};
use crate::{
    error::{ClvError, ClvResult},
    features::FeatureTable,
    posterior::{PosteriorModel, PosteriorSampler},
    types::Periods,
};
use std::collections::BTreeMap;

/// BetaGeometric/NBD parameter container.
///
/// Carries the declared posterior parameters (`lambda_shape`,
/// `lambda_rate`, `alpha`, `beta`) through the full fit / export /
/// posterior-mean machinery, so fitted state can be persisted and
/// restored. The conditional-expectation prediction is not implemented.
pub struct BetaGeometricNbd {
    pub lambda_shape: Option<Vec<f64>>,
    pub lambda_rate:  Option<Vec<f64>>,
    pub alpha:        Option<Vec<f64>>,
    pub beta:         Option<Vec<f64>>,
    sampler: Option<Box<dyn PosteriorSampler>>,
}

impl BetaGeometricNbd {
    /// An unfitted model that will fit itself through the given sampler.
    pub fn with_sampler(sampler: Box<dyn PosteriorSampler>) -> Self {
        Self { sampler: Some(sampler), ..Self::unfitted() }
    }

    /// A fitted model built from externally produced posterior draws.
    pub fn from_samples(
        lambda_shape: Vec<f64>,
        lambda_rate: Vec<f64>,
        alpha: Vec<f64>,
        beta: Vec<f64>,
    ) -> ClvResult<Self> {
        let mut draws = BTreeMap::new();
        draws.insert("lambda_shape".to_string(), lambda_shape);
        draws.insert("lambda_rate".to_string(), lambda_rate);
        draws.insert("alpha".to_string(), alpha);
        draws.insert("beta".to_string(), beta);

        let mut model = Self::unfitted();
        model.absorb_draws(draws)?;
        Ok(model)
    }
}

impl PosteriorModel for BetaGeometricNbd {
    const MODEL: &'static str = "beta_geometric_nbd";

    fn parameter_names() -> &'static [&'static str] {
        &["lambda_shape", "lambda_rate", "alpha", "beta"]
    }

    fn parameter(&self, name: &str) -> Option<&[f64]> {
        match name {
            "lambda_shape" => self.lambda_shape.as_deref(),
            "lambda_rate" => self.lambda_rate.as_deref(),
            "alpha" => self.alpha.as_deref(),
            "beta" => self.beta.as_deref(),
            _ => None,
        }
    }

    fn set_parameter(&mut self, name: &str, samples: Vec<f64>) {
        match name {
            "lambda_shape" => self.lambda_shape = Some(samples),
            "lambda_rate" => self.lambda_rate = Some(samples),
            "alpha" => self.alpha = Some(samples),
            "beta" => self.beta = Some(samples),
            _ => {}
        }
    }

    fn unfitted() -> Self {
        Self {
            lambda_shape: None,
            lambda_rate: None,
            alpha: None,
            beta: None,
            sampler: None,
        }
    }
}

impl TransactionsModel for BetaGeometricNbd {
    fn name(&self) -> &'static str {
        Self::MODEL
    }

    fn fit(&mut self, features: &FeatureTable) -> ClvResult<()> {
        if self.params_fitted() {
            return Ok(());
        }

        let data = features.sampler_data();
        let sampler = self
            .sampler
            .as_mut()
            .ok_or(ClvError::SamplerUnavailable { model: Self::MODEL })?;
        let draws = sampler.sample(&data)?;
        self.absorb_draws(draws)?;
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        self.params_fitted()
    }

    fn predict(
        &self,
        _features: &FeatureTable,
        _periods: Periods,
    ) -> ClvResult<Vec<TransactionsPrediction>> {
        Err(ClvError::NotImplemented {
            model: Self::MODEL,
            operation: "predict",
        })
    }
}
