use super::{ValueModel, ValuePrediction};
use crate::{
    error::{ClvError, ClvResult},
    features::FeatureTable,
};
use serde::{Deserialize, Serialize};

/// Pass-through of each customer's own observed mean value. Never needs
/// fitting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalMeanValue;

impl LocalMeanValue {
    pub fn new() -> Self {
        Self
    }
}

impl ValueModel for LocalMeanValue {
    fn name(&self) -> &'static str {
        "local_mean_value"
    }

    fn fit(&mut self, _features: &FeatureTable) -> ClvResult<()> {
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        true
    }

    fn predict(&self, features: &FeatureTable) -> ClvResult<Vec<ValuePrediction>> {
        features
            .rows
            .iter()
            .map(|row| {
                let value = row.value.ok_or_else(|| ClvError::MissingColumn {
                    column: "value".into(),
                })?;
                Ok(ValuePrediction { id: row.id.clone(), value })
            })
            .collect()
    }
}
