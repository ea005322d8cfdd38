//! Per-file loaders and the bundle of all three canonical tables.
//!
//! Loaders never fail. A missing, unreadable or unrecognized file is logged
//! and contributes an empty table, so one bad file cannot abort a combine.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::SourceConfig;
use crate::data::records::{
    CanonicalRecord, CanonicalTable, ExchangeRateRecord, InflationRecord, ReferenceRateRecord,
};
use crate::error::IngestError;
use crate::ingest::combine::combine;
use crate::ingest::grid::{is_workbook_path, read_grid, SheetChoice};
use crate::ingest::normalize::{
    normalize_daily, normalize_inflation, InflationShape, EXCHANGE_RATE_SHAPE,
    REFERENCE_RATE_SHAPE,
};
use crate::ingest::parse::year_from_file_name;

/// Preferred sheet in the JISDOR workbook; the first sheet is used otherwise.
pub const JISDOR_SHEET: &str = "Informasi Kurs Jisdor";

const NATIONAL_STEM: &str = "data inflasi";
const PROVINCIAL_MARKER: &str = "inflasi tahunan";

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Routes an inflation source to its layout by file name.
pub fn inflation_shape_for(path: &Path) -> InflationShape {
    let name = file_name(path);
    let lower = name.to_lowercase();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if stem.trim() == NATIONAL_STEM {
        InflationShape::National
    } else if lower.contains(PROVINCIAL_MARKER) {
        InflationShape::ProvincialAnnual {
            year: year_from_file_name(&name),
        }
    } else {
        InflationShape::StandardHeader {
            file_year: year_from_file_name(&name),
        }
    }
}

pub fn read_inflation_file(path: &Path) -> Result<CanonicalTable<InflationRecord>, IngestError> {
    let grid = read_grid(path, SheetChoice::First)?;
    Ok(normalize_inflation(&grid, inflation_shape_for(path)))
}

pub fn read_reference_rate_file(
    path: &Path,
) -> Result<CanonicalTable<ReferenceRateRecord>, IngestError> {
    let grid = read_grid(path, SheetChoice::First)?;
    Ok(normalize_daily(&grid, REFERENCE_RATE_SHAPE))
}

pub fn read_exchange_rate_file(
    path: &Path,
) -> Result<CanonicalTable<ExchangeRateRecord>, IngestError> {
    let grid = read_grid(path, SheetChoice::Preferred(JISDOR_SHEET))?;
    Ok(normalize_daily(&grid, EXCHANGE_RATE_SHAPE))
}

fn recover<R: CanonicalRecord>(
    path: &Path,
    result: Result<CanonicalTable<R>, IngestError>,
) -> CanonicalTable<R> {
    match result {
        Ok(table) => {
            if table.is_empty() {
                warn!(file = %path.display(), table = %R::KIND, "no rows recognized");
            } else {
                info!(file = %path.display(), table = %R::KIND, rows = table.len(), "loaded");
            }
            table
        }
        Err(IngestError::Missing(_)) => {
            warn!(file = %path.display(), table = %R::KIND, "source file not found");
            CanonicalTable::empty()
        }
        Err(err) => {
            warn!(table = %R::KIND, error = %err, "unreadable source");
            CanonicalTable::empty()
        }
    }
}

fn load_all<R, F>(paths: &[PathBuf], read: F) -> CanonicalTable<R>
where
    R: CanonicalRecord,
    F: Fn(&Path) -> Result<CanonicalTable<R>, IngestError>,
{
    combine(paths.iter().map(|p| recover(p, read(p))))
}

pub fn load_inflation(paths: &[PathBuf]) -> CanonicalTable<InflationRecord> {
    load_all(paths, read_inflation_file)
}

pub fn load_reference_rate(paths: &[PathBuf]) -> CanonicalTable<ReferenceRateRecord> {
    load_all(paths, read_reference_rate_file)
}

pub fn load_exchange_rate(paths: &[PathBuf]) -> CanonicalTable<ExchangeRateRecord> {
    load_all(paths, read_exchange_rate_file)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    Local,
    Remote,
}

impl DataOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

/// All three canonical tables from one ingestion run.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub inflation: CanonicalTable<InflationRecord>,
    pub reference_rate: CanonicalTable<ReferenceRateRecord>,
    pub exchange_rate: CanonicalTable<ExchangeRateRecord>,
    pub origin: DataOrigin,
}

impl Dataset {
    pub fn empty(origin: DataOrigin) -> Self {
        Self {
            inflation: CanonicalTable::empty(),
            reference_rate: CanonicalTable::empty(),
            exchange_rate: CanonicalTable::empty(),
            origin,
        }
    }

    pub fn load_local(sources: &SourceConfig) -> Self {
        Self {
            inflation: load_inflation(&sources.inflation_paths()),
            reference_rate: load_reference_rate(&sources.reference_rate_paths()),
            exchange_rate: load_exchange_rate(&sources.exchange_rate_paths()),
            origin: DataOrigin::Local,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inflation.is_empty() && self.reference_rate.is_empty() && self.exchange_rate.is_empty()
    }
}

/// Spreadsheets in the data directory that no configured source names.
pub fn unhandled_workbooks(sources: &SourceConfig) -> Vec<String> {
    let entries = match fs::read_dir(&sources.data_dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    let handled: Vec<&str> = sources.handled_names().collect();
    let mut unknown: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_workbook_path(p))
        .map(|p| file_name(&p))
        .filter(|name| !name.starts_with("~$") && !handled.contains(&name.as_str()))
        .collect();
    unknown.sort();
    unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_inflation_files_by_name() {
        assert_eq!(
            inflation_shape_for(Path::new("data/Data Inflasi.xlsx")),
            InflationShape::National
        );
        assert_eq!(
            inflation_shape_for(Path::new(
                "data/Inflasi Tahunan (Y-on-Y) 38 Provinsi (2022=100), 2025.xlsx"
            )),
            InflationShape::ProvincialAnnual { year: Some(2025) }
        );
        assert_eq!(
            inflation_shape_for(Path::new("data/inflasi_2023.csv")),
            InflationShape::StandardHeader {
                file_year: Some(2023)
            }
        );
    }

    #[test]
    fn missing_files_contribute_empty_tables() {
        let dir = tempfile::tempdir().unwrap();
        let table = load_inflation(&[dir.path().join("Data Inflasi.xlsx")]);
        assert!(table.is_empty());
    }

    #[test]
    fn unhandled_workbooks_lists_unknown_spreadsheets() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["BI-7Day-RR.xlsx", "Extra.xlsx", "notes.txt", "~$Extra.xlsx"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let sources = SourceConfig::with_data_dir(dir.path());
        assert_eq!(unhandled_workbooks(&sources), vec!["Extra.xlsx".to_string()]);
    }
}
