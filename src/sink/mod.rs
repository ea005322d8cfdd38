//! Persistence of canonical tables: statement emission, remote upsert and
//! CSV export all share the backend table shape defined here.

pub mod export;
pub mod remote;
pub mod sql;

use serde_json::{Map, Number, Value};

use crate::config::TableNames;
use crate::data::records::{CanonicalRecord, FieldValue, TableKind};

/// Backend shape of one canonical table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub kind: TableKind,
    pub name: String,
    /// Backend column names, in canonical field order.
    pub columns: &'static [&'static str],
    /// SQL type clause per column.
    pub column_types: &'static [&'static str],
    /// Natural key; the upsert conflict target.
    pub conflict: &'static [&'static str],
    pub indexes: &'static [&'static [&'static str]],
}

impl TableSpec {
    pub fn for_kind(kind: TableKind, names: &TableNames) -> Self {
        match kind {
            TableKind::Inflation => Self {
                kind,
                name: names.inflation.clone(),
                columns: &["provinsi", "tahun", "bulan", "inflasi"],
                column_types: &[
                    "text not null",
                    "int not null",
                    "int not null check (bulan between 1 and 12)",
                    "numeric not null",
                ],
                conflict: &["provinsi", "tahun", "bulan"],
                indexes: &[&["tahun", "bulan"], &["provinsi"]],
            },
            TableKind::ReferenceRate => Self {
                kind,
                name: names.reference_rate.clone(),
                columns: &["tanggal", "bi_7day_rr"],
                column_types: &["date not null", "numeric not null"],
                conflict: &["tanggal"],
                indexes: &[&["tanggal"]],
            },
            TableKind::ExchangeRate => Self {
                kind,
                name: names.exchange_rate.clone(),
                columns: &["tanggal", "kurs"],
                column_types: &["date not null", "numeric not null"],
                conflict: &["tanggal"],
                indexes: &[&["tanggal"]],
            },
        }
    }

    pub fn of<R: CanonicalRecord>(names: &TableNames) -> Self {
        Self::for_kind(R::KIND, names)
    }

    /// Comma-joined conflict target, as the backend expects it.
    pub fn on_conflict(&self) -> String {
        self.conflict.join(",")
    }

    /// Non-key columns, updated on conflict.
    pub fn value_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns
            .iter()
            .copied()
            .filter(|c| !self.conflict.contains(c))
    }
}

fn json_value(field: FieldValue) -> Value {
    match field {
        FieldValue::Null => Value::Null,
        FieldValue::Int(i) => Value::from(i),
        FieldValue::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        FieldValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        FieldValue::Text(s) => Value::String(s),
    }
}

/// One record as a JSON object keyed by backend column names.
pub fn json_row<R: CanonicalRecord>(spec: &TableSpec, record: &R) -> Value {
    let obj: Map<String, Value> = spec
        .columns
        .iter()
        .zip(record.fields())
        .map(|(col, field)| (col.to_string(), json_value(field)))
        .collect();
    Value::Object(obj)
}
