use std::path::Path;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;
use serde::Deserialize;
use tower_http::services::ServeDir;

use crate::data::stats::InflationFilter;
use crate::ingest::sources::Dataset;
use crate::server::api;

pub const STATIC_DIR: &str = "frontend/dist";

type SharedDataset = Arc<Dataset>;

#[derive(Debug, Default, Deserialize)]
pub struct InflationQuery {
    pub region: Option<String>,
    pub year: Option<String>,
}

impl InflationQuery {
    fn filter(self) -> Result<InflationFilter, String> {
        let region = self.region.filter(|r| !r.trim().is_empty());
        let year = match self.year.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<i32>()
                    .map_err(|_| format!("invalid year '{raw}'"))?,
            ),
        };
        Ok(InflationFilter { region, year })
    }
}

fn json_response(payload: Result<String, serde_json::Error>) -> Response {
    match payload {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        api::error_payload(message),
    )
        .into_response()
}

async fn health() -> Response {
    json_response(api::health_payload())
}

async fn data_version(State(dataset): State<SharedDataset>) -> Response {
    json_response(api::data_version_payload(&dataset))
}

async fn inflation(
    State(dataset): State<SharedDataset>,
    Query(query): Query<InflationQuery>,
) -> Response {
    match query.filter() {
        Ok(filter) => json_response(api::inflation_payload(&dataset, &filter)),
        Err(message) => error_response(StatusCode::BAD_REQUEST, &message),
    }
}

async fn inflation_stats(
    State(dataset): State<SharedDataset>,
    Query(query): Query<InflationQuery>,
) -> Response {
    match query.filter() {
        Ok(filter) => json_response(api::inflation_stats_payload(&dataset, &filter)),
        Err(message) => error_response(StatusCode::BAD_REQUEST, &message),
    }
}

async fn reference_rate(State(dataset): State<SharedDataset>) -> Response {
    json_response(api::reference_rate_payload(&dataset))
}

async fn exchange_rate(State(dataset): State<SharedDataset>) -> Response {
    json_response(api::exchange_rate_payload(&dataset))
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Route not found")
}

/// API routes over a loaded dataset. Non-API paths are served from
/// `static_dir` when it exists, otherwise they get a JSON 404.
pub fn router(dataset: Arc<Dataset>, static_dir: &Path) -> Router {
    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/data/version", get(data_version))
        .route("/api/inflation", get(inflation))
        .route("/api/inflation/stats", get(inflation_stats))
        .route("/api/reference-rate", get(reference_rate))
        .route("/api/exchange-rate", get(exchange_rate))
        .route("/api/*rest", any(not_found))
        .with_state(dataset);

    if static_dir.is_dir() {
        app.fallback_service(ServeDir::new(static_dir).append_index_html_on_directories(true))
    } else {
        app.fallback(not_found)
    }
}
