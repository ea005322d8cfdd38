//! JSON payloads for the data API. Each function renders one response body.

use serde::Serialize;
use serde_json::json;

use crate::data::records::{CanonicalRecord, CanonicalTable, DailyRecord, InflationRecord};
use crate::data::stats::{inflation_stats, latest_month_in_year, latest_year, InflationFilter, InflationStats};
use crate::ingest::sources::Dataset;

const NO_DATA: &str = "no data available";

pub fn health_payload() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({
        "status": "ok",
        "service": "makro-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub fn error_payload(message: &str) -> String {
    serde_json::to_string_pretty(&json!({
        "status": "error",
        "message": message
    }))
    .unwrap_or_else(|_| "{\"status\": \"error\"}".to_string())
}

#[derive(Debug, Clone, Serialize)]
pub struct TableVersion {
    pub table: &'static str,
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataVersionResponse {
    pub source: &'static str,
    pub tables: Vec<TableVersion>,
}

fn daily_version<R: DailyRecord>(table: &CanonicalTable<R>) -> TableVersion {
    TableVersion {
        table: R::KIND.as_str(),
        rows: table.len(),
        latest: table.rows().last().map(|r| r.date().to_string()),
    }
}

pub fn data_version_payload(dataset: &Dataset) -> Result<String, serde_json::Error> {
    let inflation = &dataset.inflation;
    let latest_period = latest_year(inflation).and_then(|year| {
        latest_month_in_year(inflation, year).map(|month| format!("{year}-{month:02}"))
    });
    let response = DataVersionResponse {
        source: dataset.origin.as_str(),
        tables: vec![
            TableVersion {
                table: InflationRecord::KIND.as_str(),
                rows: inflation.len(),
                latest: latest_period,
            },
            daily_version(&dataset.reference_rate),
            daily_version(&dataset.exchange_rate),
        ],
    };
    serde_json::to_string_pretty(&response)
}

#[derive(Debug, Clone, Serialize)]
pub struct RowsResponse<'a, R> {
    pub status: &'static str,
    pub source: &'static str,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub rows: Vec<&'a R>,
}

fn rows_payload<R: Serialize>(dataset: &Dataset, rows: Vec<&R>) -> Result<String, serde_json::Error> {
    let empty = rows.is_empty();
    serde_json::to_string_pretty(&RowsResponse {
        status: if empty { "empty" } else { "ok" },
        source: dataset.origin.as_str(),
        count: rows.len(),
        message: empty.then_some(NO_DATA),
        rows,
    })
}

pub fn inflation_payload(dataset: &Dataset, filter: &InflationFilter) -> Result<String, serde_json::Error> {
    rows_payload(dataset, filter.apply(&dataset.inflation))
}

pub fn reference_rate_payload(dataset: &Dataset) -> Result<String, serde_json::Error> {
    rows_payload(dataset, dataset.reference_rate.rows().iter().collect())
}

pub fn exchange_rate_payload(dataset: &Dataset) -> Result<String, serde_json::Error> {
    rows_payload(dataset, dataset.exchange_rate.rows().iter().collect())
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub status: &'static str,
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<InflationStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_month: Option<u32>,
}

pub fn inflation_stats_payload(
    dataset: &Dataset,
    filter: &InflationFilter,
) -> Result<String, serde_json::Error> {
    let stats = inflation_stats(&dataset.inflation, filter);
    let year = latest_year(&dataset.inflation);
    serde_json::to_string_pretty(&StatsResponse {
        status: if stats.is_some() { "ok" } else { "empty" },
        source: dataset.origin.as_str(),
        message: stats.is_none().then_some(NO_DATA),
        stats,
        latest_year: year,
        latest_month: year.and_then(|y| latest_month_in_year(&dataset.inflation, y)),
    })
}
