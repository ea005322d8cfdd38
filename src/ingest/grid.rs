//! Headerless cell grids read from spreadsheets or CSV.
//!
//! Locators never assume a header row, so every reader produces the same raw
//! shape: rows of loosely typed cells, exactly as they sit in the file.

use std::fmt;
use std::path::Path;

use calamine::Reader;
use chrono::NaiveDate;

use crate::error::IngestError;
use crate::ingest::parse::excel_serial_to_date;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Bool(bool),
}

impl Cell {
    /// Text cell from a raw string; blank input becomes `Empty`.
    pub fn text(raw: &str) -> Self {
        let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Lowercased, whitespace-collapsed text used for header matching.
    pub fn label(&self) -> String {
        match self {
            Cell::Text(s) => s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase(),
            Cell::Empty => String::new(),
            other => other.to_string().to_lowercase(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&calamine::Data> for Cell {
    fn from(d: &calamine::Data) -> Self {
        match d {
            calamine::Data::Empty => Cell::Empty,
            calamine::Data::String(s) => Cell::text(s),
            calamine::Data::Float(f) => Cell::Number(*f),
            calamine::Data::Int(i) => Cell::Number(*i as f64),
            calamine::Data::Bool(b) => Cell::Bool(*b),
            calamine::Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
                .map(Cell::Date)
                .unwrap_or(Cell::Empty),
            calamine::Data::DateTimeIso(s) => s
                .get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
                .map(Cell::Date)
                .unwrap_or_else(|| Cell::text(s)),
            _ => Cell::Empty,
        }
    }
}

static EMPTY: Cell = Cell::Empty;

/// Rows of cells with no header assumption. Ragged rows are allowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Convenience for tests and fixtures: every value becomes a text cell.
    pub fn from_text_rows(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|row| row.iter().map(|v| Cell::text(v)).collect())
                .collect(),
        )
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Out-of-range coordinates read as `Empty`.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.iter().all(Cell::is_empty))
    }
}

/// Sheet selection for workbook sources.
#[derive(Debug, Clone, Copy, Default)]
pub enum SheetChoice<'a> {
    #[default]
    First,
    /// Use the named sheet when present, otherwise the first one.
    Preferred(&'a str),
}

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

pub fn is_workbook_path(path: &Path) -> bool {
    extension(path).is_some_and(|ext| WORKBOOK_EXTENSIONS.contains(&ext.as_str()))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Reads one sheet (or the CSV body) into a grid.
pub fn read_grid(path: &Path, sheet: SheetChoice<'_>) -> Result<Grid, IngestError> {
    if !path.exists() {
        return Err(IngestError::Missing(path.to_path_buf()));
    }
    match extension(path).as_deref() {
        Some("csv") => read_csv_grid(path),
        Some(ext) if WORKBOOK_EXTENSIONS.contains(&ext) => read_workbook_grid(path, sheet),
        _ => Err(IngestError::Unsupported(path.to_path_buf())),
    }
}

fn workbook_error(path: &Path, err: impl fmt::Display) -> IngestError {
    IngestError::Workbook {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Sheet names in workbook order. CSV files report a single unnamed sheet.
pub fn sheet_names(path: &Path) -> Result<Vec<String>, IngestError> {
    if !path.exists() {
        return Err(IngestError::Missing(path.to_path_buf()));
    }
    if !is_workbook_path(path) {
        return Ok(vec![String::new()]);
    }
    let wb = calamine::open_workbook_auto(path).map_err(|e| workbook_error(path, e))?;
    Ok(wb.sheet_names())
}

fn read_workbook_grid(path: &Path, sheet: SheetChoice<'_>) -> Result<Grid, IngestError> {
    let mut wb = calamine::open_workbook_auto(path).map_err(|e| workbook_error(path, e))?;
    let names = wb.sheet_names();
    let sheet_name = match sheet {
        SheetChoice::Preferred(wanted) => names
            .iter()
            .find(|s| s.trim().eq_ignore_ascii_case(wanted))
            .or(names.first()),
        SheetChoice::First => names.first(),
    }
    .cloned()
    .ok_or_else(|| IngestError::NoSheets(path.to_path_buf()))?;

    let range = wb
        .worksheet_range(&sheet_name)
        .map_err(|e| workbook_error(path, e))?;

    // calamine trims leading empty rows/columns; pad them back so row indices
    // match what a spreadsheet user sees.
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; start_col as usize];
        cells.extend(row.iter().map(Cell::from));
        rows.push(cells);
    }
    Ok(Grid::new(rows))
}

fn read_csv_grid(path: &Path) -> Result<Grid, IngestError> {
    let csv_error = |source: csv::Error| IngestError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(csv_error)?;
        rows.push(record.iter().map(Cell::text).collect());
    }
    Ok(Grid::new(rows))
}
