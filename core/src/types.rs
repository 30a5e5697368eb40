//! Shared primitive types used across the entire engine.

/// A stable, unique identifier for a customer.
pub type CustomerId = String;

/// A forecast horizon length, in whole periods.
pub type Periods = u32;
