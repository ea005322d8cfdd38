//! Canonical record shapes and the deduplicated table that holds them.
//!
//! Every record type is keyed by its natural key. The same key is the dedup key
//! inside the pipeline and the conflict target when the table is persisted.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::region;

/// The three tracked indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Inflation,
    ReferenceRate,
    ExchangeRate,
}

impl TableKind {
    pub const ALL: [TableKind; 3] = [Self::Inflation, Self::ReferenceRate, Self::ExchangeRate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inflation => "inflation",
            Self::ReferenceRate => "reference_rate",
            Self::ExchangeRate => "exchange_rate",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single column value in backend-neutral form. Used by both the statement
/// emitter and the remote upsert payload so the two sinks cannot drift apart.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Text(String),
}

pub trait CanonicalRecord: Clone + Serialize {
    type Key: Ord + Clone + fmt::Debug;

    const KIND: TableKind;
    /// Canonical column names, in field order.
    const COLUMNS: &'static [&'static str];

    fn key(&self) -> Self::Key;

    /// Record-level invariants. Rows failing this never enter a table.
    fn is_valid(&self) -> bool;

    /// Field values in `COLUMNS` order.
    fn fields(&self) -> Vec<FieldValue>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflationRecord {
    pub region: String,
    pub year: i32,
    pub month: u32,
    /// Year-on-year inflation, percent.
    pub rate: f64,
}

impl CanonicalRecord for InflationRecord {
    type Key = (String, i32, u32);

    const KIND: TableKind = TableKind::Inflation;
    const COLUMNS: &'static [&'static str] = &["region", "year", "month", "rate"];

    fn key(&self) -> Self::Key {
        (self.region.clone(), self.year, self.month)
    }

    fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month) && self.rate.is_finite() && region::is_canonical(&self.region)
    }

    fn fields(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Text(self.region.clone()),
            FieldValue::Int(i64::from(self.year)),
            FieldValue::Int(i64::from(self.month)),
            FieldValue::Float(self.rate),
        ]
    }
}

/// BI-7Day-RR policy rate observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRateRecord {
    pub date: NaiveDate,
    /// Percent.
    pub rate: f64,
}

impl CanonicalRecord for ReferenceRateRecord {
    type Key = NaiveDate;

    const KIND: TableKind = TableKind::ReferenceRate;
    const COLUMNS: &'static [&'static str] = &["date", "rate"];

    fn key(&self) -> Self::Key {
        self.date
    }

    fn is_valid(&self) -> bool {
        self.rate.is_finite()
    }

    fn fields(&self) -> Vec<FieldValue> {
        vec![FieldValue::Date(self.date), FieldValue::Float(self.rate)]
    }
}

/// JISDOR observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateRecord {
    pub date: NaiveDate,
    /// Rupiah per USD.
    pub rate: f64,
}

impl CanonicalRecord for ExchangeRateRecord {
    type Key = NaiveDate;

    const KIND: TableKind = TableKind::ExchangeRate;
    const COLUMNS: &'static [&'static str] = &["date", "rate"];

    fn key(&self) -> Self::Key {
        self.date
    }

    fn is_valid(&self) -> bool {
        self.rate.is_finite() && self.rate > 0.0
    }

    fn fields(&self) -> Vec<FieldValue> {
        vec![FieldValue::Date(self.date), FieldValue::Float(self.rate)]
    }
}

/// Daily series share one construction path in the normalizer.
pub trait DailyRecord: CanonicalRecord<Key = NaiveDate> {
    fn new(date: NaiveDate, rate: f64) -> Self;
    fn date(&self) -> NaiveDate;
    fn rate(&self) -> f64;
}

impl DailyRecord for ReferenceRateRecord {
    fn new(date: NaiveDate, rate: f64) -> Self {
        Self { date, rate }
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn rate(&self) -> f64 {
        self.rate
    }
}

impl DailyRecord for ExchangeRateRecord {
    fn new(date: NaiveDate, rate: f64) -> Self {
        Self { date, rate }
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn rate(&self) -> f64 {
        self.rate
    }
}

/// Normalized, typed, deduplicated record set for one indicator, ordered by key.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTable<R> {
    rows: Vec<R>,
}

impl<R: CanonicalRecord> CanonicalTable<R> {
    pub fn empty() -> Self {
        Self { rows: Vec::new() }
    }

    /// Builds a table from rows in source order: invalid rows are dropped and,
    /// per natural key, the last row seen wins. Output is sorted by key.
    pub fn from_rows(rows: impl IntoIterator<Item = R>) -> Self {
        let mut by_key: BTreeMap<R::Key, R> = BTreeMap::new();
        for row in rows {
            if !row.is_valid() {
                continue;
            }
            by_key.insert(row.key(), row);
        }
        Self {
            rows: by_key.into_values().collect(),
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        R::COLUMNS
    }

    pub fn kind(&self) -> TableKind {
        R::KIND
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<R: CanonicalRecord> Default for CanonicalTable<R> {
    fn default() -> Self {
        Self::empty()
    }
}
