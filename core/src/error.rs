use crate::types::Periods;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClvError {
    #[error("Required column '{column}' is missing from the input")]
    MissingColumn { column: String },

    #[error("Column '{column}' holds the wrong kind of data: expected {expected}")]
    ColumnType { column: String, expected: &'static str },

    #[error("Model '{model}' must be fitted with a call to fit before predict can be called")]
    NotFitted { model: &'static str },

    #[error("Discount rate must be in [0,1); got {rate}")]
    InvalidDiscountRate { rate: f64 },

    #[error("Observation period T={t} exceeds the prediction horizon of {periods} periods")]
    InvalidHorizon { t: f64, periods: Periods },

    #[error("Conditional expectation of '{model}' is undefined for every posterior sample: {detail}")]
    UndefinedEstimate { model: &'static str, detail: String },

    #[error("Model '{model}' does not implement {operation}")]
    NotImplemented { model: &'static str, operation: &'static str },

    #[error("Posterior draws for '{model}' are missing parameter '{parameter}'")]
    MissingParameter { model: &'static str, parameter: &'static str },

    #[error("Parameter '{parameter}' has {actual} posterior samples; expected {expected}")]
    ParameterLengthMismatch { parameter: String, expected: usize, actual: usize },

    #[error("Model '{model}' has no attached sampler and cannot be fitted")]
    SamplerUnavailable { model: &'static str },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ClvResult<T> = Result<T, ClvError>;
