//! Workbook inspection: sheet names, sizes, first rows and the layouts the
//! locators recognize. Used by `makro inspect` and the `inspect_workbook` bin.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::IngestError;
use crate::ingest::grid::{read_grid, sheet_names, Grid, SheetChoice};
use crate::ingest::locate::{
    locate_national, locate_provincial_annual, locate_standard_inflation, locate_tabular,
    EXCHANGE_RATE_HEADERS, REFERENCE_RATE_HEADERS, ROW_NUMBER_HEADER,
};

pub const DEFAULT_PREVIEW_ROWS: usize = 25;

#[derive(Debug, Clone)]
pub struct SheetReport {
    pub name: String,
    pub height: usize,
    pub width: usize,
    pub layouts: Vec<String>,
    pub preview: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct WorkbookReport {
    pub path: PathBuf,
    pub sheets: Vec<SheetReport>,
}

/// Human-readable descriptions of every layout found in the grid.
pub fn detected_layouts(grid: &Grid) -> Vec<String> {
    let mut found = Vec::new();
    if let Some(l) = locate_national(grid) {
        found.push(format!(
            "national (header row {}, period col {}, rate col {})",
            l.header_row, l.period_col, l.rate_col
        ));
    }
    if let Some(l) = locate_provincial_annual(grid) {
        found.push(format!(
            "provincial-annual (header row {}, region col {}, {} month columns)",
            l.header_row,
            l.region_col,
            l.month_cols.len()
        ));
    }
    if let Some(l) = locate_standard_inflation(grid) {
        found.push(format!(
            "standard-header (header row {}, region col {}, month col {}, rate col {})",
            l.header_row, l.region_col, l.month_col, l.rate_col
        ));
    }
    // Only report the tabular layout when the row-number header is really there.
    let value_synonyms: Vec<&str> = REFERENCE_RATE_HEADERS
        .iter()
        .chain(EXCHANGE_RATE_HEADERS)
        .copied()
        .collect();
    if let Some(l) = locate_tabular(grid, &value_synonyms, 0) {
        let header_row = l.first_data_row - 1;
        if grid.cell(header_row, l.marker_col).label() == ROW_NUMBER_HEADER {
            found.push(format!(
                "tabular (header row {header_row}, date col {}, value col {})",
                l.date_col, l.value_col
            ));
        }
    }
    found
}

fn preview(grid: &Grid, rows: usize) -> Vec<String> {
    grid.rows()
        .iter()
        .take(rows)
        .map(|row| {
            row.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect()
}

pub fn inspect_path(path: &Path, preview_rows: usize) -> Result<WorkbookReport, IngestError> {
    let mut sheets = Vec::new();
    for name in sheet_names(path)? {
        let grid = read_grid(path, SheetChoice::Preferred(&name))?;
        sheets.push(SheetReport {
            height: grid.height(),
            width: grid.width(),
            layouts: detected_layouts(&grid),
            preview: preview(&grid, preview_rows),
            name,
        });
    }
    Ok(WorkbookReport {
        path: path.to_path_buf(),
        sheets,
    })
}

impl fmt::Display for WorkbookReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.sheets.iter().map(|s| s.name.as_str()).collect();
        writeln!(f, "{}", self.path.display())?;
        writeln!(f, "Sheets ({}): {}", names.len(), names.join(", "))?;
        for sheet in &self.sheets {
            writeln!(f)?;
            let name = if sheet.name.is_empty() { "(csv)" } else { &sheet.name };
            writeln!(f, "Sheet: {name}")?;
            writeln!(f, "Size: {} rows x {} cols", sheet.height, sheet.width)?;
            if sheet.layouts.is_empty() {
                writeln!(f, "Layouts: none recognized")?;
            } else {
                for layout in &sheet.layouts {
                    writeln!(f, "Layout: {layout}")?;
                }
            }
            writeln!(f, "First {} rows:", sheet.preview.len())?;
            for (i, line) in sheet.preview.iter().enumerate() {
                writeln!(f, "  {i}: {line}")?;
            }
        }
        Ok(())
    }
}
