//! CLV aggregation: historic realized value plus forecast value, under
//! a geometric discount schedule.
//!
//! One `ClvModel` composes a value predictor and a transaction-count
//! predictor behind their traits. Per customer:
//!   - the historic block covers the observed interval [1, T], priced
//!     at the customer's own observed rate and value;
//!   - the forecast block covers (T, T + periods], priced from the two
//!     predictors and discounted back from its start at T.
//! With discount factor alpha = 1 / (1 + discount_rate), a block of n
//! periods contributes the finite geometric sum
//! (1 - alpha^n) / (1 - alpha); at discount_rate = 0 that sum is
//! exactly n (the alpha -> 1 limit, taken analytically to avoid 0/0).

use crate::{
    error::{ClvError, ClvResult},
    features::FeatureTable,
    math::round2,
    transactions_model::TransactionsModel,
    types::{CustomerId, Periods},
    value_model::ValueModel,
};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Discounted lifetime value for one customer, rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClvRecord {
    pub id:  CustomerId,
    pub clv: f64,
}

/// Sum of a discount block spanning `steps` whole periods, one alpha
/// factor per period.
fn discounted_time(alpha: f64, steps: f64, discount_rate: f64) -> f64 {
    if discount_rate == 0.0 {
        steps
    } else {
        (1.0 - alpha.powf(steps)) / (1.0 - alpha)
    }
}

pub struct ClvModel {
    value_model:        Box<dyn ValueModel>,
    transactions_model: Box<dyn TransactionsModel>,
}

impl ClvModel {
    pub fn new(
        value_model: Box<dyn ValueModel>,
        transactions_model: Box<dyn TransactionsModel>,
    ) -> Self {
        Self { value_model, transactions_model }
    }

    /// Fit both sub-models. Each sub-model's own fit is idempotent, so
    /// refitting an already-fitted composite leaves it unchanged.
    pub fn fit(&mut self, features: &FeatureTable) -> ClvResult<()> {
        self.value_model.fit(features)?;
        self.transactions_model.fit(features)?;
        log::debug!(
            "clv: fitted {} + {} on {} customers",
            self.value_model.name(),
            self.transactions_model.name(),
            features.len(),
        );
        Ok(())
    }

    pub fn is_fitted(&self) -> bool {
        self.value_model.is_fitted() && self.transactions_model.is_fitted()
    }

    /// Per-customer CLV over the observed window plus a forecast
    /// horizon of `periods`, discounted at `discount_rate` per period.
    ///
    /// When `periods` is zero the sub-models are not consulted at all
    /// and the result is the historic block alone. Zero input rows
    /// produce an empty table. Every row must carry an observed value;
    /// a table built without a value column fails with `MissingColumn`
    /// rather than pricing the historic block at zero.
    pub fn predict(
        &self,
        features: &FeatureTable,
        periods: Periods,
        discount_rate: f64,
    ) -> ClvResult<Vec<ClvRecord>> {
        if !self.is_fitted() {
            return Err(ClvError::NotFitted { model: "clv" });
        }
        if !(0.0..1.0).contains(&discount_rate) {
            return Err(ClvError::InvalidDiscountRate { rate: discount_rate });
        }
        if features.is_empty() {
            return Ok(Vec::new());
        }

        // The historic block prices each customer's own observed value,
        // so the value column must be fully populated.
        let observed_values = features.values()?;

        let alpha = 1.0 / (1.0 + discount_rate);

        // Historic block [1, T]: the customer's own realized rate and
        // value, discounted back to present. An empty observation
        // window (T = 0) contributes nothing.
        let mut records: Vec<ClvRecord> = features
            .rows
            .iter()
            .zip(&observed_values)
            .map(|(row, &observed_value)| {
                let historic = if row.t > 0.0 {
                    let transaction_rate = row.frequency / row.t;
                    round2(
                        transaction_rate
                            * observed_value
                            * discounted_time(alpha, row.t, discount_rate),
                    )
                } else {
                    0.0
                };
                ClvRecord { id: row.id.clone(), clv: historic }
            })
            .collect();

        if periods == 0 {
            return Ok(records);
        }

        // Forecast block (T, T + periods]: predictor outputs, with the
        // whole block discounted back from its start at T.
        let transactions = self.transactions_model.predict(features, periods)?;
        let values = self.value_model.predict(features)?;

        let transactions_by_id: HashMap<&CustomerId, f64> = transactions
            .iter()
            .map(|p| (&p.id, p.transactions))
            .collect();
        let values_by_id: HashMap<&CustomerId, f64> =
            values.iter().map(|p| (&p.id, p.value)).collect();

        let block = discounted_time(alpha, f64::from(periods), discount_rate);

        for (record, row) in records.iter_mut().zip(&features.rows) {
            let predicted = transactions_by_id.get(&row.id).ok_or_else(|| {
                ClvError::Other(anyhow!(
                    "transactions model dropped customer '{}'",
                    row.id
                ))
            })?;
            let value = values_by_id.get(&row.id).ok_or_else(|| {
                ClvError::Other(anyhow!("value model dropped customer '{}'", row.id))
            })?;

            let transaction_rate = predicted / f64::from(periods);
            let forecast = transaction_rate * value * alpha.powf(row.t) * block;
            record.clv = round2(record.clv + forecast);
        }

        Ok(records)
    }
}
