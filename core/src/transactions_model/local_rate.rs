use super::{TransactionsModel, TransactionsPrediction};
use crate::{error::ClvResult, features::FeatureTable, types::Periods};
use serde::{Deserialize, Serialize};

/// Extrapolates each customer's own observed rate `frequency / T` over
/// the forecast horizon. Never needs fitting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalRate;

impl LocalRate {
    pub fn new() -> Self {
        Self
    }
}

impl TransactionsModel for LocalRate {
    fn name(&self) -> &'static str {
        "local_rate"
    }

    fn fit(&mut self, _features: &FeatureTable) -> ClvResult<()> {
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        true
    }

    fn predict(
        &self,
        features: &FeatureTable,
        periods: Periods,
    ) -> ClvResult<Vec<TransactionsPrediction>> {
        Ok(features
            .rows
            .iter()
            .map(|row| TransactionsPrediction {
                id: row.id.clone(),
                transactions: row.frequency / row.t * f64::from(periods),
            })
            .collect())
    }
}
