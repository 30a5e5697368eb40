//! Per-transaction monetary value predictors.
//!
//! The contract every value model must fulfill: fit on a feature table,
//! report fitted state, and produce one expected per-transaction value
//! per customer. Variants are interchangeable behind the trait:
//!   - `GlobalMeanValue`   — one transaction-weighted mean for everyone
//!   - `LocalMeanValue`    — pass-through of each customer's own mean
//!   - `GammaGamma`        — Bayesian posterior-mean estimator

mod gamma_gamma;
mod global_mean;
mod local_mean;

pub use gamma_gamma::GammaGamma;
pub use global_mean::GlobalMeanValue;
pub use local_mean::LocalMeanValue;

use crate::{error::ClvResult, features::FeatureTable, types::CustomerId};
use serde::{Deserialize, Serialize};

/// Expected monetary value per transaction for one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuePrediction {
    pub id:    CustomerId,
    pub value: f64,
}

/// The contract every value model must fulfill.
pub trait ValueModel: Send {
    /// Unique stable name for this model, used in errors and logs.
    fn name(&self) -> &'static str;

    /// Fit the model on a feature table. Must be a no-op when the model
    /// already reports fitted.
    fn fit(&mut self, features: &FeatureTable) -> ClvResult<()>;

    fn is_fitted(&self) -> bool;

    /// Expected per-transaction value for each customer in the table,
    /// ids 1:1 with the input rows.
    fn predict(&self, features: &FeatureTable) -> ClvResult<Vec<ValuePrediction>>;
}
