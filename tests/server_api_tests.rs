use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use makro::data::records::{CanonicalTable, InflationRecord, ReferenceRateRecord};
use makro::ingest::sources::{DataOrigin, Dataset};
use makro::server::routes::router;
use serde_json::Value;
use tower::ServiceExt;

fn dataset() -> Dataset {
    let row = |region: &str, year, month, rate| InflationRecord {
        region: region.to_string(),
        year,
        month,
        rate,
    };
    let mut dataset = Dataset::empty(DataOrigin::Local);
    dataset.inflation = CanonicalTable::from_rows(vec![
        row("Aceh", 2024, 12, 2.0),
        row("Aceh", 2025, 1, 3.5),
        row("Bali", 2025, 1, 2.5),
        row("Nasional", 2025, 1, 0.76),
    ]);
    dataset.reference_rate = CanonicalTable::from_rows(vec![ReferenceRateRecord {
        date: NaiveDate::from_ymd_opt(2025, 12, 17).unwrap(),
        rate: 4.75,
    }]);
    dataset
}

fn app() -> Router {
    router(Arc::new(dataset()), Path::new("/nonexistent/frontend/dist"))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .expect("router should respond");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let payload = serde_json::from_slice(&bytes).expect("response should be valid json");
    (status, payload)
}

#[tokio::test]
async fn health_endpoint_returns_ok_json() {
    let (status, payload) = get(app(), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["service"], "makro-api");
}

#[tokio::test]
async fn inflation_filters_by_region_alias_and_year() {
    let (status, payload) = get(app(), "/api/inflation?region=ACEH&year=2025").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["count"], 1);
    assert_eq!(payload["rows"][0]["region"], "Aceh");
    assert_eq!(payload["rows"][0]["rate"], 3.5);

    let (_, all) = get(app(), "/api/inflation").await;
    assert_eq!(all["count"], 4);
}

#[tokio::test]
async fn invalid_year_is_a_bad_request() {
    let (status, payload) = get(app(), "/api/inflation?year=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["status"], "error");
}

#[tokio::test]
async fn stats_are_rounded_and_filtered() {
    let (status, payload) = get(app(), "/api/inflation/stats?year=2025").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["stats"]["count"], 3);
    assert_eq!(payload["stats"]["max"], 3.5);
    assert_eq!(payload["stats"]["min"], 0.76);
    assert_eq!(payload["latest_year"], 2025);
    assert_eq!(payload["latest_month"], 1);
}

#[tokio::test]
async fn empty_table_is_not_an_error() {
    let (status, payload) = get(app(), "/api/exchange-rate").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["status"], "empty");
    assert_eq!(payload["message"], "no data available");

    let (_, rates) = get(app(), "/api/reference-rate").await;
    assert_eq!(rates["status"], "ok");
    assert_eq!(rates["rows"][0]["date"], "2025-12-17");
}

#[tokio::test]
async fn data_version_lists_tables() {
    let (_, payload) = get(app(), "/api/data/version").await;
    assert_eq!(payload["source"], "local");
    assert_eq!(payload["tables"].as_array().map(Vec::len), Some(3));
    assert_eq!(payload["tables"][0]["latest"], "2025-01");
}

#[tokio::test]
async fn unknown_paths_get_json_404() {
    let (status, payload) = get(app(), "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(payload["message"], "Route not found");

    let (status, _) = get(app(), "/dashboard").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn static_files_are_served_when_built() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<html>makro</html>").unwrap();
    let app = router(Arc::new(dataset()), dir.path());

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<html>makro</html>");
}
