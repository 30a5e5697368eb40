//! Per-customer feature rows consumed by every predictor.
//!
//! One `FeatureRow` summarises a customer's transaction history as
//! recency / frequency / observation length T / optional mean value,
//! all measured in whole periods. Rows are produced once by the RFM
//! transform (see `rfm`) and consumed read-only everywhere else.

use crate::{
    error::{ClvError, ClvResult},
    posterior::SamplerData,
    types::CustomerId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub id:        CustomerId,
    /// Whole periods between the last observed transaction and the cutoff.
    pub recency:   f64,
    /// Count of bucketed transaction periods in the observation window.
    pub frequency: f64,
    /// Whole periods between the first observed transaction and the cutoff.
    /// Invariant: `t >= recency >= 0`.
    pub t:         f64,
    /// Mean monetary value per bucketed transaction, when a value column
    /// was supplied to the transform.
    pub value:     Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn new(rows: Vec<FeatureRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The monetary column as a dense vector. Fails if any row was built
    /// without a value, since the value-based predictors cannot run on a
    /// partially-populated column.
    pub fn values(&self) -> ClvResult<Vec<f64>> {
        self.rows
            .iter()
            .map(|row| {
                row.value.ok_or_else(|| ClvError::MissingColumn {
                    column: "value".into(),
                })
            })
            .collect()
    }

    /// The numeric columns plus row count, in the shape the external
    /// Bayesian sampler consumes.
    pub fn sampler_data(&self) -> SamplerData {
        let mut data = SamplerData::new(self.len());
        data.push("recency", self.rows.iter().map(|r| r.recency).collect());
        data.push("frequency", self.rows.iter().map(|r| r.frequency).collect());
        data.push("T", self.rows.iter().map(|r| r.t).collect());
        if self.rows.iter().all(|r| r.value.is_some()) {
            data.push(
                "value",
                self.rows.iter().filter_map(|r| r.value).collect(),
            );
        }
        data
    }
}
