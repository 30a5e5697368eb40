//! Posterior-parameter machinery shared by the Bayesian predictors.
//!
//! Each Bayesian model declares an explicit, fixed list of named
//! parameter vectors (one f64 per posterior draw, all vectors the same
//! length). Fit / is-fitted / export logic is written directly against
//! that declared list:
//!   - `absorb_draws` validates and stores a sampler's output
//!   - `to_table` / `from_table` move fitted state across the
//!     persistence boundary without understanding the prediction math
//!   - `posterior_mean` collapses a model to one-sample arrays for
//!     cheap repeated prediction
//!
//! The parameter-fitting procedure itself is an external collaborator
//! behind the `PosteriorSampler` trait; the engine never samples.

use crate::error::{ClvError, ClvResult};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Sampler boundary ─────────────────────────────────────────────────────────

/// The named numeric arrays handed to the external sampler: the feature
/// table's numeric columns plus the row count `n`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SamplerData {
    pub n:       usize,
    pub columns: BTreeMap<String, Vec<f64>>,
}

impl SamplerData {
    pub fn new(n: usize) -> Self {
        Self { n, columns: BTreeMap::new() }
    }

    pub fn push(&mut self, name: &str, values: Vec<f64>) {
        self.columns.insert(name.to_string(), values);
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }
}

/// The opaque Bayesian fitting collaborator. Consumes a data dictionary,
/// returns one equally-long array of posterior draws per parameter.
pub trait PosteriorSampler: Send {
    fn sample(&mut self, data: &SamplerData) -> anyhow::Result<BTreeMap<String, Vec<f64>>>;
}

// ── Persistence shape ────────────────────────────────────────────────────────

/// Fitted parameter state in flat tabular shape: one named column per
/// parameter, one row per posterior draw. This is the only shape the
/// external persistence collaborator ever sees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterTable {
    pub columns: Vec<(String, Vec<f64>)>,
}

impl ParameterTable {
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Number of posterior draws per column.
    pub fn sample_count(&self) -> usize {
        self.columns.first().map(|(_, v)| v.len()).unwrap_or(0)
    }
}

// ── Declared-parameter contract ──────────────────────────────────────────────

/// A model whose fitted state is an explicit list of named posterior
/// parameter vectors. Implementors supply the declared list and plain
/// field access; everything else is provided against that list.
pub trait PosteriorModel: Sized {
    /// Stable model name, used in errors and logs.
    const MODEL: &'static str;

    /// The declared parameter list. Order is the column order of
    /// `to_table` output.
    fn parameter_names() -> &'static [&'static str];

    /// The stored samples for one declared parameter, when present.
    fn parameter(&self, name: &str) -> Option<&[f64]>;

    /// Store samples for one declared parameter. Unknown names are a
    /// programming error on the implementor's side and are ignored.
    fn set_parameter(&mut self, name: &str, samples: Vec<f64>);

    /// A model with every declared parameter absent.
    fn unfitted() -> Self;

    /// True iff every declared parameter is present.
    fn params_fitted(&self) -> bool {
        Self::parameter_names()
            .iter()
            .all(|name| self.parameter(name).is_some())
    }

    /// The common length of the parameter vectors, when fitted.
    fn sample_count(&self) -> Option<usize> {
        Self::parameter_names()
            .first()
            .and_then(|name| self.parameter(name))
            .map(<[f64]>::len)
    }

    /// Validate a sampler's draws against the declared list and store
    /// them. Nothing is stored unless every declared parameter is
    /// present with one shared non-zero length.
    fn absorb_draws(&mut self, mut draws: BTreeMap<String, Vec<f64>>) -> ClvResult<()> {
        let mut staged: Vec<(&'static str, Vec<f64>)> = Vec::new();
        let mut expected: Option<usize> = None;

        for &name in Self::parameter_names() {
            let samples = draws.remove(name).ok_or(ClvError::MissingParameter {
                model: Self::MODEL,
                parameter: name,
            })?;

            match expected {
                None => expected = Some(samples.len()),
                Some(len) if len != samples.len() => {
                    return Err(ClvError::ParameterLengthMismatch {
                        parameter: name.to_string(),
                        expected: len,
                        actual: samples.len(),
                    });
                }
                Some(_) => {}
            }

            staged.push((name, samples));
        }

        if expected == Some(0) {
            return Err(ClvError::Other(anyhow!(
                "sampler returned zero posterior draws for '{}'",
                Self::MODEL
            )));
        }

        for (name, samples) in staged {
            self.set_parameter(name, samples);
        }

        log::debug!(
            "{}: absorbed {} posterior draws per parameter",
            Self::MODEL,
            expected.unwrap_or(0),
        );

        Ok(())
    }

    /// Export fitted state for the persistence collaborator.
    fn to_table(&self) -> ClvResult<ParameterTable> {
        let mut columns = Vec::with_capacity(Self::parameter_names().len());
        for &name in Self::parameter_names() {
            let samples = self
                .parameter(name)
                .ok_or(ClvError::NotFitted { model: Self::MODEL })?;
            columns.push((name.to_string(), samples.to_vec()));
        }
        Ok(ParameterTable { columns })
    }

    /// Restore fitted state from the persistence collaborator's shape.
    fn from_table(table: &ParameterTable) -> ClvResult<Self> {
        let draws: BTreeMap<String, Vec<f64>> = table.columns.iter().cloned().collect();
        let mut model = Self::unfitted();
        model.absorb_draws(draws)?;
        Ok(model)
    }

    /// A collapsed copy: each parameter replaced by a one-sample array
    /// holding its posterior mean. The copy is fitted and equally
    /// shaped, so callers can swap it in for cheap repeated prediction.
    fn posterior_mean(&self) -> ClvResult<Self> {
        let mut model = Self::unfitted();
        for &name in Self::parameter_names() {
            let samples = self
                .parameter(name)
                .ok_or(ClvError::NotFitted { model: Self::MODEL })?;
            let mean = samples.iter().sum::<f64>() / samples.len() as f64;
            model.set_parameter(name, vec![mean]);
        }
        Ok(model)
    }
}
