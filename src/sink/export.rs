//! CSV export of canonical tables, recorded in the data registry.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::data::records::{CanonicalRecord, CanonicalTable};
use crate::data::registry::{load_registry, save_registry, DataSetEntry, DEFAULT_REGISTRY_FILE};
use crate::error::SinkError;
use crate::ingest::sources::Dataset;

pub const DEFAULT_EXPORT_DIR: &str = "exports";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedTable {
    pub kind: &'static str,
    pub path: PathBuf,
    pub rows: usize,
}

fn io_error(path: &Path) -> impl Fn(std::io::Error) -> SinkError + '_ {
    move |source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes one table as `<kind>.csv` with canonical column names.
pub fn write_table_csv<R: CanonicalRecord>(
    dir: &Path,
    table: &CanonicalTable<R>,
) -> Result<ExportedTable, SinkError> {
    let path = dir.join(format!("{}.csv", R::KIND.as_str()));
    let csv_error = |e: csv::Error| SinkError::Io {
        path: path.clone(),
        source: e.into(),
    };
    let mut writer = csv::Writer::from_path(&path).map_err(csv_error)?;
    if table.is_empty() {
        writer.write_record(R::COLUMNS).map_err(csv_error)?;
    }
    for record in table.rows() {
        writer.serialize(record).map_err(csv_error)?;
    }
    writer.flush().map_err(io_error(&path))?;

    info!(table = R::KIND.as_str(), rows = table.len(), path = %path.display(), "exported table");
    Ok(ExportedTable {
        kind: R::KIND.as_str(),
        path,
        rows: table.len(),
    })
}

/// Exports all three tables into `dir` and records them in its registry.
pub fn export_dataset(dir: &Path, dataset: &Dataset) -> Result<Vec<ExportedTable>, SinkError> {
    fs::create_dir_all(dir).map_err(io_error(dir))?;

    let exported = vec![
        write_table_csv(dir, &dataset.inflation)?,
        write_table_csv(dir, &dataset.reference_rate)?,
        write_table_csv(dir, &dataset.exchange_rate)?,
    ];

    let registry_path = dir.join(DEFAULT_REGISTRY_FILE);
    let mut registry = load_registry(&registry_path);
    let now = Utc::now().to_rfc3339();
    for table in &exported {
        let file_name = table
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        registry.insert(
            table.kind.to_string(),
            DataSetEntry {
                source: dataset.origin.as_str().to_string(),
                last_updated: Some(now.clone()),
                path: file_name,
                rows: table.rows,
            },
        );
    }
    save_registry(&registry_path, &registry).map_err(io_error(&registry_path))?;
    Ok(exported)
}
