//! Core data types for filing records.
//!
//! This module defines the fundamental data structures:
//!
//! - [`EntityId`] - Organization identifier (ticker or CIK)
//! - [`FilingRecord`] - Fields extracted from one filing document
//! - [`RecordSet`] - Ordered collection of records with helper methods

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use polars::prelude::{Column, DataFrame, PlSmallStr};
use serde::{Deserialize, Serialize};

use crate::error::{FilingError, Result};
use crate::kind::RecordKind;

/// Number of quarterly records each year anchored by an annual record must have.
///
/// The fourth quarter of a year is reported by the annual filing itself.
pub const QUARTERS_PER_ANNUAL: usize = 3;

/// An organization identifier: a ticker symbol or a numeric CIK.
///
/// Identifiers are trimmed and uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    /// Creates a new identifier, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the identifier is a numeric CIK rather than a ticker.
    #[must_use]
    pub fn is_cik(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = FilingError;

    fn from_str(s: &str) -> Result<Self> {
        let id = Self::new(s);
        if id.0.is_empty() {
            return Err(FilingError::InvalidParameter(
                "Empty entity identifier".to_string(),
            ));
        }
        Ok(id)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Fields extracted from a single annual or quarterly filing document.
///
/// Records are built once by a repository and never modified afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingRecord {
    /// Identifier of the document the record came from.
    pub source_file: String,
    /// Organization the filing belongs to.
    pub entity_id: EntityId,
    /// Annual or quarterly.
    pub record_kind: RecordKind,
    /// Reported period-end date of the document.
    pub period_end: NaiveDate,
    /// Net income (loss).
    pub net_income: Option<i64>,
    /// Weighted average diluted shares outstanding.
    pub shares_outstanding: Option<i64>,
    /// Revenue from contracts with customers.
    pub revenue: Option<i64>,
    /// Stockholders' equity.
    pub equity: Option<i64>,
}

impl FilingRecord {
    /// Creates a record with required fields and no figures.
    #[must_use]
    pub fn new(
        source_file: impl Into<String>,
        entity_id: EntityId,
        record_kind: RecordKind,
        period_end: NaiveDate,
    ) -> Self {
        Self {
            source_file: source_file.into(),
            entity_id,
            record_kind,
            period_end,
            net_income: None,
            shares_outstanding: None,
            revenue: None,
            equity: None,
        }
    }

    /// Sets net income.
    #[must_use]
    pub const fn with_net_income(mut self, value: Option<i64>) -> Self {
        self.net_income = value;
        self
    }

    /// Sets shares outstanding.
    #[must_use]
    pub const fn with_shares_outstanding(mut self, value: Option<i64>) -> Self {
        self.shares_outstanding = value;
        self
    }

    /// Sets revenue.
    #[must_use]
    pub const fn with_revenue(mut self, value: Option<i64>) -> Self {
        self.revenue = value;
        self
    }

    /// Sets equity.
    #[must_use]
    pub const fn with_equity(mut self, value: Option<i64>) -> Self {
        self.equity = value;
        self
    }

    /// Calendar year of the reported period end.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.period_end.year()
    }
}

/// Ordered collection of filing records.
///
/// A record set only grows by ordered concatenation. Records are not keyed by
/// any field, so the same filing may appear more than once when several
/// retrieval rounds return it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    records: Vec<FilingRecord>,
}

impl RecordSet {
    /// Creates an empty record set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Creates a record set from a vector of records.
    #[must_use]
    pub const fn from_records(records: Vec<FilingRecord>) -> Self {
        Self { records }
    }

    /// Appends every record of `other`, preserving both orders.
    pub fn extend_from(&mut self, other: &Self) {
        self.records.extend(other.records.iter().cloned());
    }

    /// Concatenates record sets in order.
    #[must_use]
    pub fn concat<'a>(sets: impl IntoIterator<Item = &'a Self>) -> Self {
        let mut out = Self::new();
        for set in sets {
            out.extend_from(set);
        }
        out
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> impl Iterator<Item = &FilingRecord> {
        self.records.iter()
    }

    /// Returns the records as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[FilingRecord] {
        &self.records
    }

    /// Consumes the collection and returns the underlying vector.
    #[must_use]
    pub fn into_inner(self) -> Vec<FilingRecord> {
        self.records
    }

    /// Counts quarterly records whose period end falls in `year`.
    #[must_use]
    pub fn quarterly_in_year(&self, year: i32) -> usize {
        self.records
            .iter()
            .filter(|r| r.record_kind.is_quarterly() && r.year() == year)
            .count()
    }

    /// Returns the distinct years that carry at least one annual record.
    #[must_use]
    pub fn years_with_annual(&self) -> BTreeSet<i32> {
        self.records
            .iter()
            .filter(|r| r.record_kind == RecordKind::Annual)
            .map(FilingRecord::year)
            .collect()
    }

    /// Removes repeated records, keeping the first record seen for each
    /// `(entity_id, record_kind, period_end)`.
    #[must_use]
    pub fn dedup_by_period(&self) -> Self {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert((r.entity_id.clone(), r.record_kind, r.period_end)))
            .cloned()
            .collect()
    }

    /// Flattens the records into a table with one row per record.
    ///
    /// Columns: file, entity_id, record_kind, period_end, net_income,
    /// shares_outstanding, revenue, equity. Missing figures stay null.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let text = |name: &str, f: fn(&FilingRecord) -> String| {
            Column::new(
                PlSmallStr::from(name),
                self.records.iter().map(f).collect::<Vec<_>>(),
            )
        };
        let figure = |name: &str, f: fn(&FilingRecord) -> Option<i64>| {
            Column::new(
                PlSmallStr::from(name),
                self.records.iter().map(f).collect::<Vec<_>>(),
            )
        };

        DataFrame::new(vec![
            text("file", |r| r.source_file.clone()),
            text("entity_id", |r| r.entity_id.to_string()),
            text("record_kind", |r| r.record_kind.to_string()),
            text("period_end", |r| r.period_end.format("%Y-%m-%d").to_string()),
            figure("net_income", |r| r.net_income),
            figure("shares_outstanding", |r| r.shares_outstanding),
            figure("revenue", |r| r.revenue),
            figure("equity", |r| r.equity),
        ])
        .map_err(|e| FilingError::Export(e.to_string()))
    }
}

impl IntoIterator for RecordSet {
    type Item = FilingRecord;
    type IntoIter = std::vec::IntoIter<FilingRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a FilingRecord;
    type IntoIter = std::slice::Iter<'a, FilingRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<FilingRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = FilingRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
