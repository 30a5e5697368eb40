//! Feature-extraction transform: raw transaction logs to RFM rows.
//!
//! Input is a column-oriented `TransactionFrame` (named columns, so the
//! transform can report exactly which required column is absent). Output
//! is one `FeatureRow` per customer:
//!   - timestamps bucket into whole periods of the configured granularity
//!   - several transactions in one customer+period collapse into a single
//!     record whose value is the mean of the constituent values
//!   - T / recency are whole-period distances from the first / last
//!     bucketed transaction to the bucketed cutoff
//!   - frequency is the count of bucketed transaction periods

use crate::{
    error::{ClvError, ClvResult},
    features::{FeatureRow, FeatureTable},
    math::round2,
    types::CustomerId,
};
use anyhow::anyhow;
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Period granularity ───────────────────────────────────────────────────────

/// Bucketing granularity for the transform. One unit of T / recency /
/// the forecast horizon corresponds to one period of this size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Day,
    Week,
    Month,
}

impl Period {
    /// Map a timestamp to its period index. Indices of the same
    /// granularity differ by exactly the number of whole periods
    /// between the two dates' buckets.
    fn index(self, at: NaiveDateTime) -> i64 {
        let date = at.date();
        match self {
            Period::Day => i64::from(date.num_days_from_ce()),
            // CE day 1 (0001-01-01) is a Monday, so this buckets into
            // Monday-aligned weeks.
            Period::Week => i64::from(date.num_days_from_ce() - 1).div_euclid(7),
            Period::Month => i64::from(date.year()) * 12 + i64::from(date.month0()),
        }
    }
}

// ── Column-oriented input ────────────────────────────────────────────────────

/// One named column of raw transaction data.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Ids(Vec<CustomerId>),
    Timestamps(Vec<NaiveDateTime>),
    Values(Vec<f64>),
}

/// A raw transaction log with caller-named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFrame {
    columns: Vec<(String, Column)>,
}

impl TransactionFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: &str, column: Column) -> Self {
        self.columns.push((name.to_string(), column));
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    fn require(&self, name: &str) -> ClvResult<&Column> {
        self.column(name).ok_or_else(|| ClvError::MissingColumn {
            column: name.to_string(),
        })
    }

    fn ids(&self, name: &str) -> ClvResult<&[CustomerId]> {
        match self.require(name)? {
            Column::Ids(v) => Ok(v),
            _ => Err(ClvError::ColumnType {
                column: name.to_string(),
                expected: "customer identifiers",
            }),
        }
    }

    fn timestamps(&self, name: &str) -> ClvResult<&[NaiveDateTime]> {
        match self.require(name)? {
            Column::Timestamps(v) => Ok(v),
            _ => Err(ClvError::ColumnType {
                column: name.to_string(),
                expected: "timestamps",
            }),
        }
    }

    fn values(&self, name: &str) -> ClvResult<&[f64]> {
        match self.require(name)? {
            Column::Values(v) => Ok(v),
            _ => Err(ClvError::ColumnType {
                column: name.to_string(),
                expected: "monetary values",
            }),
        }
    }
}

// ── The transform ────────────────────────────────────────────────────────────

struct CustomerBuckets {
    first: i64,
    last:  i64,
    /// period index -> (value sum, transaction count)
    buckets: HashMap<i64, (f64, u32)>,
}

/// Transform a raw transaction log into one RFM row per customer.
///
/// `observation_period_end` defaults to the latest timestamp in the
/// frame; transactions strictly after it are dropped. Customers appear
/// in first-seen order. An empty frame yields an empty table.
pub fn rfm(
    transactions: &TransactionFrame,
    customer_id_col: &str,
    date_col: &str,
    value_col: Option<&str>,
    period: Period,
    observation_period_end: Option<NaiveDateTime>,
) -> ClvResult<FeatureTable> {
    let ids = transactions.ids(customer_id_col)?;
    let dates = transactions.timestamps(date_col)?;
    let values = match value_col {
        Some(name) => Some(transactions.values(name)?),
        None => None,
    };

    if ids.len() != dates.len() || values.is_some_and(|v| v.len() != ids.len()) {
        return Err(ClvError::Other(anyhow!(
            "transaction columns have mismatched lengths"
        )));
    }

    let cutoff = match observation_period_end.or_else(|| dates.iter().max().copied()) {
        Some(cutoff) => cutoff,
        None => return Ok(FeatureTable::default()),
    };
    let cutoff_idx = period.index(cutoff);

    let mut order: Vec<CustomerId> = Vec::new();
    let mut per_customer: HashMap<CustomerId, CustomerBuckets> = HashMap::new();

    for (row, (id, date)) in ids.iter().zip(dates).enumerate() {
        if *date > cutoff {
            continue;
        }
        let idx = period.index(*date);
        let value = values.map(|v| v[row]).unwrap_or(0.0);

        let acc = per_customer.entry(id.clone()).or_insert_with(|| {
            order.push(id.clone());
            CustomerBuckets { first: idx, last: idx, buckets: HashMap::new() }
        });
        acc.first = acc.first.min(idx);
        acc.last = acc.last.max(idx);
        let bucket = acc.buckets.entry(idx).or_insert((0.0, 0));
        bucket.0 += value;
        bucket.1 += 1;
    }

    let mut rows = Vec::with_capacity(order.len());
    for id in order {
        let acc = match per_customer.remove(&id) {
            Some(acc) => acc,
            None => continue,
        };

        let value = values.map(|_| {
            // Mean over periods of each period's mean constituent value.
            let sum: f64 = acc
                .buckets
                .values()
                .map(|(total, count)| total / f64::from(*count))
                .sum();
            round2(sum / acc.buckets.len() as f64)
        });

        rows.push(FeatureRow {
            id,
            recency: (cutoff_idx - acc.last) as f64,
            frequency: acc.buckets.len() as f64,
            t: (cutoff_idx - acc.first) as f64,
            value,
        });
    }

    log::debug!(
        "rfm: {} raw transactions -> {} customer rows (cutoff period {cutoff_idx})",
        ids.len(),
        rows.len(),
    );

    Ok(FeatureTable::new(rows))
}
