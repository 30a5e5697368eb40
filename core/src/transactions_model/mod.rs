//! Transaction-count predictors.
//!
//! The contract every transactions model must fulfill: fit on a feature
//! table, report fitted state, and produce an expected transaction
//! count per customer over a forecast horizon. Variants are
//! interchangeable behind the trait:
//!   - `GlobalRate`           — one fitted rate, purely prospective quote
//!   - `CumulativeGlobalRate` — one fitted rate, cumulative-to-horizon quote
//!   - `LocalRate`            — each customer's own observed rate
//!   - `ParetoNbd`            — Bayesian posterior-mean estimator
//!   - `BetaGeometricNbd`     — parameter container, prediction pending

mod beta_geometric_nbd;
mod global_rate;
mod local_rate;
mod pareto_nbd;

pub use beta_geometric_nbd::BetaGeometricNbd;
pub use global_rate::{CumulativeGlobalRate, GlobalRate};
pub use local_rate::LocalRate;
pub use pareto_nbd::{AliveProbability, ParetoNbd};

use crate::{
    error::ClvResult,
    features::FeatureTable,
    types::{CustomerId, Periods},
};
use serde::{Deserialize, Serialize};

/// Expected transaction count over the forecast horizon for one
/// customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionsPrediction {
    pub id:           CustomerId,
    pub transactions: f64,
}

/// The contract every transactions model must fulfill.
pub trait TransactionsModel: Send {
    /// Unique stable name for this model, used in errors and logs.
    fn name(&self) -> &'static str;

    /// Fit the model on a feature table. Must be a no-op when the model
    /// already reports fitted.
    fn fit(&mut self, features: &FeatureTable) -> ClvResult<()>;

    fn is_fitted(&self) -> bool;

    /// Expected transaction count for each customer, ids 1:1 with the
    /// input rows. `periods` is measured in the same period unit as T.
    fn predict(
        &self,
        features: &FeatureTable,
        periods: Periods,
    ) -> ClvResult<Vec<TransactionsPrediction>>;
}
