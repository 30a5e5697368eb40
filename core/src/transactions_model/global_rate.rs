//! Constant-global-rate transaction models.
//!
//! Both variants fit the same scalar, the mean of each customer's
//! observed rate `frequency / T`. They differ in what `predict` quotes:
//!   - `GlobalRate` forecasts the block after the observation window,
//!     (T, T + periods]: `mean_rate * periods`, independent of T. This
//!     is the variant the CLV aggregator composes with, since the
//!     aggregator discounts exactly that block.
//!   - `CumulativeGlobalRate` quotes cumulative transactions through
//!     period `periods` counted from the customer's origin:
//!     `frequency + mean_rate * (periods - T)`. The horizon must cover
//!     every customer's observation window.

use super::{TransactionsModel, TransactionsPrediction};
use crate::{
    error::{ClvError, ClvResult},
    features::FeatureTable,
    types::Periods,
};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};

fn fit_mean_rate(features: &FeatureTable, model: &'static str) -> ClvResult<f64> {
    if features.is_empty() {
        return Err(ClvError::Other(anyhow!(
            "cannot fit {model}: empty feature table"
        )));
    }

    let sum: f64 = features.rows.iter().map(|r| r.frequency / r.t).sum();
    let mean = sum / features.len() as f64;
    if !mean.is_finite() {
        return Err(ClvError::Other(anyhow!(
            "cannot fit {model}: mean transaction rate is not finite (customer with T = 0?)"
        )));
    }

    log::debug!("{model}: fitted mean rate {mean:.4} over {} customers", features.len());
    Ok(mean)
}

/// Broadcasts one fitted transaction rate; quotes purely prospective
/// forecasts over `(T, T + periods]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalRate {
    pub mean_transaction_rate: Option<f64>,
}

impl GlobalRate {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pre-fitted model with a known rate.
    pub fn with_rate(mean_transaction_rate: f64) -> Self {
        Self { mean_transaction_rate: Some(mean_transaction_rate) }
    }
}

impl TransactionsModel for GlobalRate {
    fn name(&self) -> &'static str {
        "global_rate"
    }

    fn fit(&mut self, features: &FeatureTable) -> ClvResult<()> {
        if self.is_fitted() {
            return Ok(());
        }
        self.mean_transaction_rate = Some(fit_mean_rate(features, self.name())?);
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        self.mean_transaction_rate.is_some()
    }

    fn predict(
        &self,
        features: &FeatureTable,
        periods: Periods,
    ) -> ClvResult<Vec<TransactionsPrediction>> {
        let rate = self
            .mean_transaction_rate
            .ok_or(ClvError::NotFitted { model: self.name() })?;

        Ok(features
            .rows
            .iter()
            .map(|row| TransactionsPrediction {
                id: row.id.clone(),
                transactions: rate * f64::from(periods),
            })
            .collect())
    }
}

/// Broadcasts one fitted transaction rate; quotes cumulative
/// transactions through period `periods` from each customer's origin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CumulativeGlobalRate {
    pub mean_transaction_rate: Option<f64>,
}

impl CumulativeGlobalRate {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pre-fitted model with a known rate.
    pub fn with_rate(mean_transaction_rate: f64) -> Self {
        Self { mean_transaction_rate: Some(mean_transaction_rate) }
    }
}

impl TransactionsModel for CumulativeGlobalRate {
    fn name(&self) -> &'static str {
        "cumulative_global_rate"
    }

    fn fit(&mut self, features: &FeatureTable) -> ClvResult<()> {
        if self.is_fitted() {
            return Ok(());
        }
        self.mean_transaction_rate = Some(fit_mean_rate(features, self.name())?);
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        self.mean_transaction_rate.is_some()
    }

    fn predict(
        &self,
        features: &FeatureTable,
        periods: Periods,
    ) -> ClvResult<Vec<TransactionsPrediction>> {
        let rate = self
            .mean_transaction_rate
            .ok_or(ClvError::NotFitted { model: self.name() })?;

        // The quote is cumulative from the customer's origin, so the
        // horizon must not end inside any observation window.
        if let Some(row) = features.rows.iter().find(|r| r.t > f64::from(periods)) {
            return Err(ClvError::InvalidHorizon { t: row.t, periods });
        }

        Ok(features
            .rows
            .iter()
            .map(|row| TransactionsPrediction {
                id: row.id.clone(),
                transactions: row.frequency + rate * (f64::from(periods) - row.t),
            })
            .collect())
    }
}
