//! Read-only data API over one dataset loaded at startup.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::ingest::sources::Dataset;
use crate::sink::remote::{fetch_dataset, PostgrestClient};

pub mod api;
pub mod routes;

/// Remote read-back when credentials are configured and the tables hold
/// rows, otherwise the local sources.
pub fn load_serving_dataset(config: &Config) -> Dataset {
    if let Some(credentials) = config.remote.read_credentials() {
        let client = PostgrestClient::new(&credentials);
        match fetch_dataset(&client, &config.tables, config.fetch_limit) {
            Ok(dataset) if !dataset.is_empty() => return dataset,
            Ok(_) => warn!("remote tables are empty, falling back to local sources"),
            Err(err) => warn!(error = %err, "remote read-back failed, falling back to local sources"),
        }
    }
    Dataset::load_local(&config.sources)
}

pub fn run_server(config: &Config) -> std::io::Result<()> {
    let dataset = load_serving_dataset(config);
    info!(
        source = dataset.origin.as_str(),
        inflation = dataset.inflation.len(),
        reference_rate = dataset.reference_rate.len(),
        exchange_rate = dataset.exchange_rate.len(),
        "dataset loaded"
    );
    let app = routes::router(Arc::new(dataset), Path::new(routes::STATIC_DIR));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(&config.bind).await?;
        info!(bind = %config.bind, "makro data API listening on http://{}", config.bind);
        axum::serve(listener, app).await
    })
}
