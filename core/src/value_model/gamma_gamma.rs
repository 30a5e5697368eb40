use super::{ValueModel, ValuePrediction};
use crate::{
    error::{ClvError, ClvResult},
    features::FeatureTable,
    math::round2,
    posterior::{PosteriorModel, PosteriorSampler},
};
use std::collections::BTreeMap;

/// Bayesian Gamma-Gamma estimator of per-transaction monetary value.
///
/// Holds posterior sample vectors for the declared parameters `p`, `q`
/// and `mu`. For each customer the conditional expectation
///
/// ```text
/// E[value] = p * (mu + frequency * observed_value)
///            / (p * frequency + q - 1)
/// ```
///
/// is evaluated for every posterior sample and then averaged. Samples
/// with `q <= 1` make the expectation undefined; those samples are
/// excluded from the mean with a warning, and the call fails outright
/// when no sample survives.
pub struct GammaGamma {
    pub p:  Option<Vec<f64>>,
    pub q:  Option<Vec<f64>>,
    pub mu: Option<Vec<f64>>,
    sampler: Option<Box<dyn PosteriorSampler>>,
}

impl std::fmt::Debug for GammaGamma {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GammaGamma")
            .field("p", &self.p)
            .field("q", &self.q)
            .field("mu", &self.mu)
            .field("sampler", &self.sampler.as_ref().map(|_| "dyn PosteriorSampler"))
            .finish()
    }
}

impl GammaGamma {
    /// An unfitted model that will fit itself through the given sampler.
    pub fn with_sampler(sampler: Box<dyn PosteriorSampler>) -> Self {
        Self { sampler: Some(sampler), ..Self::unfitted() }
    }

    /// A fitted model built from externally produced posterior draws.
    pub fn from_samples(p: Vec<f64>, q: Vec<f64>, mu: Vec<f64>) -> ClvResult<Self> {
        let mut draws = BTreeMap::new();
        draws.insert("p".to_string(), p);
        draws.insert("q".to_string(), q);
        draws.insert("mu".to_string(), mu);

        let mut model = Self::unfitted();
        model.absorb_draws(draws)?;
        Ok(model)
    }
}

impl PosteriorModel for GammaGamma {
    const MODEL: &'static str = "gamma_gamma";

    fn parameter_names() -> &'static [&'static str] {
        &["p", "q", "mu"]
    }

    fn parameter(&self, name: &str) -> Option<&[f64]> {
        match name {
            "p" => self.p.as_deref(),
            "q" => self.q.as_deref(),
            "mu" => self.mu.as_deref(),
            _ => None,
        }
    }

    fn set_parameter(&mut self, name: &str, samples: Vec<f64>) {
        match name {
            "p" => self.p = Some(samples),
            "q" => self.q = Some(samples),
            "mu" => self.mu = Some(samples),
            _ => {}
        }
    }

    fn unfitted() -> Self {
        Self { p: None, q: None, mu: None, sampler: None }
    }
}

impl ValueModel for GammaGamma {
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

        log::info!(
            "gamma_gamma: fitted on {} customers ({} posterior draws)",
            features.len(),
            self.sample_count().unwrap_or(0),
        );
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        self.params_fitted()
    }

    fn predict(&self, features: &FeatureTable) -> ClvResult<Vec<ValuePrediction>> {
        let p = self.p.as_deref().ok_or(ClvError::NotFitted { model: Self::MODEL })?;
        let q = self.q.as_deref().ok_or(ClvError::NotFitted { model: Self::MODEL })?;
        let mu = self.mu.as_deref().ok_or(ClvError::NotFitted { model: Self::MODEL })?;

        let values = features.values()?;

        // The conditional expectation is undefined for q in (0, 1]:
        // the denominator crosses zero there. Policy: drop those draws
        // from the posterior mean, loudly.
        let defined: Vec<usize> = (0..q.len()).filter(|&s| q[s] > 1.0).collect();
        if defined.len() < q.len() {
            log::warn!(
                "gamma_gamma: {} of {} posterior samples have q <= 1, for which the \
                 conditional expectation is undefined; excluding them from the mean",
                q.len() - defined.len(),
                q.len(),
            );
        }
        if defined.is_empty() {
            return Err(ClvError::UndefinedEstimate {
                model: Self::MODEL,
                detail: "every posterior sample of q lies in (0, 1]".into(),
            });
        }

        let predictions = features
            .rows
            .iter()
            .zip(&values)
            .map(|(row, &value)| {
                let sum: f64 = defined
                    .iter()
                    .map(|&s| {
                        p[s] * (mu[s] + row.frequency * value)
                            / (p[s] * row.frequency + q[s] - 1.0)
                    })
                    .sum();
                ValuePrediction {
                    id: row.id.clone(),
                    value: round2(sum / defined.len() as f64),
                }
            })
            .collect();

        Ok(predictions)
    }
}
