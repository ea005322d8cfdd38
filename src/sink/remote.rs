//! Remote upsert against a PostgREST-style backend, and read-back.
//!
//! Rows go out in fixed-size batches with the natural key as the conflict
//! target. The first failing batch aborts the run; its error is classified so
//! the operator gets actionable guidance for the two common setup mistakes.

use reqwest::blocking::{Client, Response};
use serde_json::Value;
use tracing::info;

use crate::config::{Credentials, TableNames};
use crate::data::records::{
    CanonicalRecord, CanonicalTable, ExchangeRateRecord, InflationRecord, ReferenceRateRecord,
};
use crate::error::SinkError;
use crate::ingest::combine::{daily_from_json, inflation_from_json};
use crate::ingest::locate::{EXCHANGE_RATE_HEADERS, REFERENCE_RATE_HEADERS};
use crate::ingest::sources::{DataOrigin, Dataset};
use crate::sink::{json_row, TableSpec};

/// The backend operations the pipeline needs. Errors are the backend's own
/// message text; classification happens on this side.
pub trait RemoteStore {
    fn upsert(&mut self, table: &str, rows: &[Value], on_conflict: &str) -> Result<(), String>;

    fn select(&self, table: &str, limit: usize) -> Result<Vec<Value>, String>;
}

const TABLE_MISSING_MARKERS: &[&str] = &["pgrst205", "schema cache", "could not find the table"];
const ACCESS_DENIED_MARKERS: &[&str] = &["row-level security", "42501"];

/// Maps a backend error message onto operator guidance. Unrecognized
/// messages pass through unchanged.
pub fn classify_error(table: &str, message: String) -> SinkError {
    let lower = message.to_lowercase();
    let table_not_found = lower.contains("table") && lower.contains("not found");
    if table_not_found || TABLE_MISSING_MARKERS.iter().any(|m| lower.contains(m)) {
        SinkError::TableMissing {
            table: table.to_string(),
            detail: message,
        }
    } else if ACCESS_DENIED_MARKERS.iter().any(|m| lower.contains(m)) {
        SinkError::AccessDenied {
            table: table.to_string(),
            detail: message,
        }
    } else {
        SinkError::Remote(message)
    }
}

/// Sends `rows` in batches of `batch_size` (at least 1). Returns rows sent.
pub fn upsert_in_batches<S: RemoteStore + ?Sized>(
    store: &mut S,
    spec: &TableSpec,
    rows: &[Value],
    batch_size: usize,
) -> Result<usize, SinkError> {
    let batch_size = batch_size.max(1);
    let total = rows.len();
    if total == 0 {
        info!(table = %spec.name, "no rows to upsert");
        return Ok(0);
    }

    let on_conflict = spec.on_conflict();
    let mut sent = 0;
    for (index, batch) in rows.chunks(batch_size).enumerate() {
        store
            .upsert(&spec.name, batch, &on_conflict)
            .map_err(|message| classify_error(&spec.name, message))?;
        sent += batch.len();
        info!(
            table = %spec.name,
            batch = index + 1,
            rows = batch.len(),
            sent,
            total,
            "upserted batch"
        );
    }
    Ok(sent)
}

pub fn upsert_table<R: CanonicalRecord, S: RemoteStore + ?Sized>(
    store: &mut S,
    spec: &TableSpec,
    table: &CanonicalTable<R>,
    batch_size: usize,
) -> Result<usize, SinkError> {
    let rows: Vec<Value> = table.rows().iter().map(|r| json_row(spec, r)).collect();
    upsert_in_batches(store, spec, &rows, batch_size)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub inflation: usize,
    pub reference_rate: usize,
    pub exchange_rate: usize,
}

/// Upserts all three tables in order, stopping at the first failure.
pub fn upload_dataset<S: RemoteStore + ?Sized>(
    store: &mut S,
    names: &TableNames,
    dataset: &Dataset,
    batch_size: usize,
) -> Result<UploadSummary, SinkError> {
    Ok(UploadSummary {
        inflation: upsert_table(
            store,
            &TableSpec::of::<InflationRecord>(names),
            &dataset.inflation,
            batch_size,
        )?,
        reference_rate: upsert_table(
            store,
            &TableSpec::of::<ReferenceRateRecord>(names),
            &dataset.reference_rate,
            batch_size,
        )?,
        exchange_rate: upsert_table(
            store,
            &TableSpec::of::<ExchangeRateRecord>(names),
            &dataset.exchange_rate,
            batch_size,
        )?,
    })
}

/// Reads all three tables back and runs them through the same coercion and
/// dedup as local sources.
pub fn fetch_dataset<S: RemoteStore + ?Sized>(
    store: &S,
    names: &TableNames,
    limit: usize,
) -> Result<Dataset, SinkError> {
    let select = |table: &str| {
        store
            .select(table, limit.max(1))
            .map_err(|detail| SinkError::ReadFailed {
                table: table.to_string(),
                detail,
            })
    };
    Ok(Dataset {
        inflation: inflation_from_json(&select(names.inflation.as_str())?),
        reference_rate: daily_from_json(&select(names.reference_rate.as_str())?, REFERENCE_RATE_HEADERS),
        exchange_rate: daily_from_json(&select(names.exchange_rate.as_str())?, EXCHANGE_RATE_HEADERS),
        origin: DataOrigin::Remote,
    })
}

/// Blocking PostgREST client (`{url}/rest/v1/{table}`).
pub struct PostgrestClient {
    client: Client,
    base_url: String,
    key: String,
}

impl PostgrestClient {
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            client: Client::new(),
            base_url: credentials.url.trim_end_matches('/').to_string(),
            key: credentials.key.clone(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn failure(resp: Response) -> String {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        format!("request failed with status {status}: {body}")
    }
}

impl RemoteStore for PostgrestClient {
    fn upsert(&mut self, table: &str, rows: &[Value], on_conflict: &str) -> Result<(), String> {
        let resp = self
            .client
            .post(self.table_url(table))
            .query(&[("on_conflict", on_conflict)])
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows)
            .send()
            .map_err(|e| format!("upsert request failed: {e}"))?;
        if !resp.status().is_success() {
            return Err(Self::failure(resp));
        }
        Ok(())
    }

    fn select(&self, table: &str, limit: usize) -> Result<Vec<Value>, String> {
        let limit = limit.to_string();
        let resp = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "*"), ("limit", limit.as_str())])
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .send()
            .map_err(|e| format!("select request failed: {e}"))?;
        if !resp.status().is_success() {
            return Err(Self::failure(resp));
        }
        resp.json()
            .map_err(|e| format!("failed to parse select response: {e}"))
    }
}
