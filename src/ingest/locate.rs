//! Sheet locators: find the header row and relevant columns inside a raw,
//! headerless grid.
//!
//! Every locator returns `None` when its layout is not present within the scan
//! window. "Not found" is an ordinary outcome, never an error.

use std::collections::BTreeMap;

use crate::ingest::grid::Grid;
use crate::ingest::parse::month_from_name;

pub const NATIONAL_SCAN_ROWS: usize = 50;
pub const PROVINCIAL_SCAN_ROWS: usize = 80;
pub const HEADER_SCAN_ROWS: usize = 20;

/// Header token a spreadsheet engine repeats in the row-number column.
pub const ROW_NUMBER_HEADER: &str = "no";

pub const REGION_HEADERS: &[&str] = &["provinsi", "province", "wilayah", "region"];
pub const YEAR_HEADERS: &[&str] = &["tahun", "year"];
pub const MONTH_HEADERS: &[&str] = &["bulan", "month"];
pub const INFLATION_HEADERS: &[&str] = &[
    "inflasi (%)",
    "inflasi",
    "inflation",
    "inflation (%)",
    "inflasi(%)",
    "inflasi_persen",
    "inflasi_percent",
    "inflation_percent",
    "inflation_%",
    "rate",
];
pub const DATE_HEADERS: &[&str] = &["tanggal", "date", "datetime", "tgl"];
pub const REFERENCE_RATE_HEADERS: &[&str] = &[
    "bi-7day-rr",
    "bi_7day_rr",
    "bi7dayrr",
    "bi-7day-rr(%)",
    "bi-7day-rr %",
    "bi_rate",
    "rate",
];
pub const EXCHANGE_RATE_HEADERS: &[&str] = &["kurs", "kurs_jisdor", "jisdor", "kurs tengah", "rate"];

/// Monthly national series: a period column next to an inflation column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NationalLayout {
    pub header_row: usize,
    pub period_col: usize,
    pub rate_col: usize,
}

/// One row per region, one column per month, year implied by the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvincialLayout {
    pub header_row: usize,
    pub region_col: usize,
    /// Month number to column index. May hold fewer than 12 entries.
    pub month_cols: BTreeMap<u32, usize>,
}

/// A conventional header row naming region/year/month/rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardLayout {
    pub header_row: usize,
    pub region_col: usize,
    pub year_col: Option<usize>,
    pub month_col: usize,
    pub rate_col: usize,
}

/// Daily series with a leading row-number column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularLayout {
    pub first_data_row: usize,
    pub marker_col: usize,
    pub date_col: usize,
    pub value_col: usize,
}

fn row_labels(grid: &Grid, row: usize) -> Vec<String> {
    grid.rows()
        .get(row)
        .map(|cells| cells.iter().map(|c| c.label()).collect())
        .unwrap_or_default()
}

fn find_label(labels: &[String], synonyms: &[&str]) -> Option<usize> {
    labels.iter().position(|l| synonyms.contains(&l.as_str()))
}

pub fn locate_national(grid: &Grid) -> Option<NationalLayout> {
    for row in 0..grid.height().min(NATIONAL_SCAN_ROWS) {
        let labels = row_labels(grid, row);
        let period_col = labels
            .iter()
            .rposition(|l| l == "periode" || l == "period");
        let rate_col = labels
            .iter()
            .rposition(|l| l.contains("inflasi") || l.contains("inflation"));
        if let (Some(period_col), Some(rate_col)) = (period_col, rate_col) {
            if period_col != rate_col {
                return Some(NationalLayout {
                    header_row: row,
                    period_col,
                    rate_col,
                });
            }
        }
    }
    None
}

pub fn locate_provincial_annual(grid: &Grid) -> Option<ProvincialLayout> {
    for row in 0..grid.height().min(PROVINCIAL_SCAN_ROWS) {
        let labels = row_labels(grid, row);
        let has = |names: &[&str]| labels.iter().any(|l| names.contains(&l.as_str()));
        if !(has(&["januari", "january"]) && has(&["desember", "december"])) {
            continue;
        }

        let month_cols: BTreeMap<u32, usize> = labels
            .iter()
            .enumerate()
            .filter_map(|(col, label)| month_from_name(label).map(|m| (m, col)))
            .collect();
        // Region names sit in the first column left of the month block.
        let first_month_col = month_cols.values().copied().min().unwrap_or(0);
        let region_col = labels
            .iter()
            .take(first_month_col)
            .position(|l| REGION_HEADERS.contains(&l.as_str()))
            .unwrap_or(0);

        if month_cols.len() < 12 {
            tracing::debug!(row, found = month_cols.len(), "partial month header");
        }
        return Some(ProvincialLayout {
            header_row: row,
            region_col,
            month_cols,
        });
    }
    None
}

pub fn locate_standard_inflation(grid: &Grid) -> Option<StandardLayout> {
    for row in 0..grid.height().min(HEADER_SCAN_ROWS) {
        let labels = row_labels(grid, row);
        let (Some(region_col), Some(month_col), Some(rate_col)) = (
            find_label(&labels, REGION_HEADERS),
            find_label(&labels, MONTH_HEADERS),
            find_label(&labels, INFLATION_HEADERS),
        ) else {
            continue;
        };
        return Some(StandardLayout {
            header_row: row,
            region_col,
            year_col: find_label(&labels, YEAR_HEADERS),
            month_col,
            rate_col,
        });
    }
    None
}

/// Locates a `NO | date | value [| extra]` block.
///
/// The header row is the first row (within the scan window) whose first cell
/// is the row-number token. When no such row exists, `fallback_header_row` is
/// taken as the header position. Columns are matched by synonym within the
/// first four columns and otherwise taken positionally.
pub fn locate_tabular(
    grid: &Grid,
    value_synonyms: &[&str],
    fallback_header_row: usize,
) -> Option<TabularLayout> {
    if grid.width() < 3 {
        return None;
    }

    let header_row = (0..grid.height().min(HEADER_SCAN_ROWS))
        .find(|&row| grid.cell(row, 0).label() == ROW_NUMBER_HEADER);

    let (header_row, labels) = match header_row {
        Some(row) => (row, row_labels(grid, row)),
        None => {
            tracing::debug!(fallback_header_row, "no row-number header, using fixed offset");
            (fallback_header_row, Vec::new())
        }
    };

    let block: Vec<String> = labels.into_iter().take(4).collect();
    let date_col = find_label(&block, DATE_HEADERS).unwrap_or(1);
    let value_col = find_label(&block, value_synonyms)
        .filter(|&col| col != date_col)
        .unwrap_or(2);

    Some(TabularLayout {
        first_data_row: header_row + 1,
        marker_col: 0,
        date_col,
        value_col,
    })
}
