//! clv-core: customer lifetime value computation engine.
//!
//! The engine turns raw transaction logs into per-customer CLV numbers
//! in three stages:
//!   1. `rfm` transforms (customer, timestamp, value) rows into
//!      recency / frequency / T / value feature rows;
//!   2. interchangeable value and transaction-count predictors produce
//!      expected per-transaction value and expected transaction counts
//!      (closed-form Bayesian variants average over posterior samples);
//!   3. `clv::ClvModel` merges realized and forecast value under a
//!      geometric discount schedule.
//!
//! Everything is pure in-memory computation: sampling and persistence
//! are external collaborators behind the traits in `posterior`.

pub mod clv;
pub mod error;
pub mod features;
pub mod math;
pub mod posterior;
pub mod rfm;
pub mod transactions_model;
pub mod types;
pub mod value_model;

pub use clv::{ClvModel, ClvRecord};
pub use error::{ClvError, ClvResult};
pub use features::{FeatureRow, FeatureTable};
