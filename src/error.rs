//! Error taxonomy for ingestion, persistence and configuration.
//!
//! Value-level parse failures are not errors at all (parsers return `Option`).
//! `IngestError` only describes file-level problems, and the loaders in
//! `ingest::sources` always recover from it with an empty table.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("source file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("unsupported source format: {}", .0.display())]
    Unsupported(PathBuf),

    #[error("failed to open workbook '{}': {message}", .path.display())]
    Workbook { path: PathBuf, message: String },

    #[error("no sheets in workbook: {}", .0.display())]
    NoSheets(PathBuf),

    #[error("failed to read csv '{}': {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Failures while persisting canonical tables.
///
/// `TableMissing` and `AccessDenied` carry operator guidance in their display
/// text; `Remote` is the backend's message passed through unchanged.
/// `ReadFailed` covers the read-back path, where upsert guidance does not apply.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error(
        "upsert into table '{table}' failed because the table does not exist yet (schema cache).\n\
         Fix:\n\
         1) Run the schema setup first: `makro seed --schema-only`, then execute the SQL in the backend's SQL editor.\n\
         2) Confirm table '{table}' exists, then rerun this command.\n\
         Detail: {detail}"
    )]
    TableMissing { table: String, detail: String },

    #[error(
        "upsert into table '{table}' was rejected by row-level security (access control).\n\
         Fix: use a privileged credential by setting SUPABASE_SERVICE_ROLE_KEY in .env (it bypasses RLS).\n\
         Alternative (less safe): add INSERT/UPDATE policies for the role you are using.\n\
         Detail: {detail}"
    )]
    AccessDenied { table: String, detail: String },

    #[error("{0}")]
    Remote(String),

    #[error("reading table '{table}' failed: {detail}")]
    ReadFailed { table: String, detail: String },

    #[error("remote backend not configured: {0}")]
    NotConfigured(String),

    #[error("failed to write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{}': {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
