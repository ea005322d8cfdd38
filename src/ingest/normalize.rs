//! Table normalizer: turns located grid regions into canonical tables.
//!
//! A candidate row survives only when every key field and the metric parse.
//! Anything else is dropped silently (logged at debug) and processing
//! continues with the next row.

use tracing::debug;

use crate::data::records::{CanonicalTable, DailyRecord, InflationRecord};
use crate::data::region::{canonical_region, NATIONAL};
use crate::ingest::grid::Grid;
use crate::ingest::locate::{
    self, NationalLayout, ProvincialLayout, StandardLayout, TabularLayout, ROW_NUMBER_HEADER,
};
use crate::ingest::parse::{
    parse_local_date_with, parse_month, parse_period, parse_rate, parse_year, SlashOrder,
};

/// How a source file is laid out, decided from its name before reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InflationShape {
    /// Monthly national series with a `Periode` column.
    National,
    /// Region rows by month columns. The year comes from the file name.
    ProvincialAnnual { year: Option<i32> },
    /// Conventional header row; `file_year` backs up a missing year column.
    StandardHeader { file_year: Option<i32> },
}

/// Layout of a daily series source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyShape {
    pub value_synonyms: &'static [&'static str],
    /// Header position used when no row-number header is found.
    pub fallback_header_row: usize,
    /// Component order of bare slash dates in the date column.
    pub slash_order: SlashOrder,
}

pub const REFERENCE_RATE_SHAPE: DailyShape = DailyShape {
    value_synonyms: locate::REFERENCE_RATE_HEADERS,
    fallback_header_row: 3,
    slash_order: SlashOrder::MonthFirst,
};

pub const EXCHANGE_RATE_SHAPE: DailyShape = DailyShape {
    value_synonyms: locate::EXCHANGE_RATE_HEADERS,
    fallback_header_row: 4,
    slash_order: SlashOrder::MonthFirst,
};

/// Region prefixes some provincial sheets put in front of the name.
const REGION_PREFIXES: &[&str] = &["PROV ", "Prov ", "prov ", "PROVINSI ", "Provinsi "];

fn strip_region_prefix(raw: &str) -> &str {
    let trimmed = raw.trim();
    REGION_PREFIXES
        .iter()
        .find_map(|p| trimmed.strip_prefix(p))
        .map(str::trim)
        .unwrap_or(trimmed)
}

pub fn normalize_inflation(grid: &Grid, shape: InflationShape) -> CanonicalTable<InflationRecord> {
    let rows = match shape {
        InflationShape::National => match locate::locate_national(grid) {
            Some(layout) => national_rows(grid, &layout),
            None => {
                debug!("national inflation header not found");
                Vec::new()
            }
        },
        InflationShape::ProvincialAnnual { year } => match locate::locate_provincial_annual(grid) {
            Some(layout) => provincial_rows(grid, &layout, year),
            None => {
                debug!("provincial month header not found");
                Vec::new()
            }
        },
        InflationShape::StandardHeader { file_year } => {
            match locate::locate_standard_inflation(grid) {
                Some(layout) => standard_rows(grid, &layout, file_year),
                None => {
                    debug!("standard inflation header not found");
                    Vec::new()
                }
            }
        }
    };
    CanonicalTable::from_rows(rows)
}

fn national_rows(grid: &Grid, layout: &NationalLayout) -> Vec<InflationRecord> {
    let mut out = Vec::new();
    for row in layout.header_row + 1..grid.height() {
        let period = parse_period(grid.cell(row, layout.period_col));
        let rate = parse_rate(grid.cell(row, layout.rate_col));
        match (period, rate) {
            (Some((month, year)), Some(rate)) => out.push(InflationRecord {
                region: NATIONAL.to_string(),
                year,
                month,
                rate,
            }),
            _ => debug!(row, "dropped national row"),
        }
    }
    out
}

fn provincial_rows(
    grid: &Grid,
    layout: &ProvincialLayout,
    year: Option<i32>,
) -> Vec<InflationRecord> {
    let Some(year) = year else {
        debug!("no year for provincial sheet, dropping all rows");
        return Vec::new();
    };

    let mut out = Vec::new();
    for row in layout.header_row + 1..grid.height() {
        let raw = grid.cell(row, layout.region_col).to_string();
        if raw.trim().is_empty() {
            continue;
        }
        let Some(region) = canonical_region(strip_region_prefix(&raw)) else {
            debug!(row, region = %raw, "unknown region");
            continue;
        };
        for (&month, &col) in &layout.month_cols {
            if let Some(rate) = parse_rate(grid.cell(row, col)) {
                out.push(InflationRecord {
                    region: region.to_string(),
                    year,
                    month,
                    rate,
                });
            }
        }
    }
    out
}

fn standard_rows(
    grid: &Grid,
    layout: &StandardLayout,
    file_year: Option<i32>,
) -> Vec<InflationRecord> {
    let mut out = Vec::new();
    for row in layout.header_row + 1..grid.height() {
        let region = canonical_region(&grid.cell(row, layout.region_col).to_string());
        let year = layout
            .year_col
            .and_then(|col| parse_year(grid.cell(row, col)))
            .or(file_year);
        let month = parse_month(grid.cell(row, layout.month_col));
        let rate = parse_rate(grid.cell(row, layout.rate_col));
        match (region, year, month, rate) {
            (Some(region), Some(year), Some(month), Some(rate)) => out.push(InflationRecord {
                region: region.to_string(),
                year,
                month,
                rate,
            }),
            _ => debug!(row, "dropped inflation row"),
        }
    }
    out
}

pub fn normalize_daily<R: DailyRecord>(grid: &Grid, shape: DailyShape) -> CanonicalTable<R> {
    match locate::locate_tabular(grid, shape.value_synonyms, shape.fallback_header_row) {
        Some(layout) => {
            CanonicalTable::from_rows(daily_rows(grid, &layout, shape.slash_order))
        }
        None => {
            debug!("daily series layout not found");
            CanonicalTable::empty()
        }
    }
}

fn daily_rows<R: DailyRecord>(grid: &Grid, layout: &TabularLayout, order: SlashOrder) -> Vec<R> {
    let mut out = Vec::new();
    for row in layout.first_data_row..grid.height() {
        // Spreadsheet engines re-emit the header row as data.
        if grid.cell(row, layout.marker_col).label() == ROW_NUMBER_HEADER {
            debug!(row, "skipped repeated header row");
            continue;
        }
        let date = parse_local_date_with(grid.cell(row, layout.date_col), order);
        let rate = parse_rate(grid.cell(row, layout.value_col));
        if let (Some(date), Some(rate)) = (date, rate) {
            out.push(R::new(date, rate));
        }
    }
    out
}
