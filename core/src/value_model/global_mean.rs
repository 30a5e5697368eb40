use super::{ValueModel, ValuePrediction};
use crate::{
    error::{ClvError, ClvResult},
    features::FeatureTable,
};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};

/// Broadcasts one transaction-weighted global mean value to every
/// customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalMeanValue {
    pub global_mean: Option<f64>,
}

impl GlobalMeanValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pre-fitted model with a known mean.
    pub fn with_mean(global_mean: f64) -> Self {
        Self { global_mean: Some(global_mean) }
    }
}

impl ValueModel for GlobalMeanValue {
    fn name(&self) -> &'static str {
        "global_mean_value"
    }

    fn fit(&mut self, features: &FeatureTable) -> ClvResult<()> {
        if self.is_fitted() {
            return Ok(());
        }

        let values = features.values()?;
        let total_transactions: f64 = features.rows.iter().map(|r| r.frequency).sum();
        if total_transactions <= 0.0 {
            return Err(ClvError::Other(anyhow!(
                "cannot fit global mean value: no observed transactions"
            )));
        }

        let weighted: f64 = features
            .rows
            .iter()
            .zip(&values)
            .map(|(row, value)| value * row.frequency)
            .sum();

        let mean = weighted / total_transactions;
        self.global_mean = Some(mean);
        log::debug!(
            "global_mean_value: fitted mean {mean:.4} over {} customers",
            features.len(),
        );
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        self.global_mean.is_some()
    }

    fn predict(&self, features: &FeatureTable) -> ClvResult<Vec<ValuePrediction>> {
        let global_mean = self
            .global_mean
            .ok_or(ClvError::NotFitted { model: self.name() })?;

        Ok(features
            .rows
            .iter()
            .map(|row| ValuePrediction { id: row.id.clone(), value: global_mean })
            .collect())
    }
}
