//! Value parsers for locale-specific spreadsheet values.
//!
//! All parsers are total: malformed input yields `None`, never a panic or an error.

use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::ingest::grid::Cell;

/// Indonesian month names, January first.
pub const MONTHS_ID: [&str; 12] = [
    "januari",
    "februari",
    "maret",
    "april",
    "mei",
    "juni",
    "juli",
    "agustus",
    "september",
    "oktober",
    "november",
    "desember",
];

const MONTHS_EN: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Month number (1-12) for an Indonesian or English month name or common
/// three-letter abbreviation, case-insensitive.
pub fn month_from_name(raw: &str) -> Option<u32> {
    let name = raw.trim().trim_end_matches('.').to_lowercase();
    if name.is_empty() {
        return None;
    }
    if let Some(i) = MONTHS_ID.iter().position(|m| *m == name) {
        return Some(i as u32 + 1);
    }
    if let Some(i) = MONTHS_EN.iter().position(|m| *m == name) {
        return Some(i as u32 + 1);
    }
    let month = match name.as_str() {
        "jan" => 1,
        "feb" | "peb" => 2,
        "mar" => 3,
        "apr" => 4,
        "jun" => 6,
        "jul" => 7,
        "agu" | "agt" | "ags" | "aug" => 8,
        "sep" | "sept" => 9,
        "okt" | "oct" => 10,
        "nov" => 11,
        "des" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

// Excel day 0 with the 1900 leap-year bug folded in.
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
const EXCEL_MAX_SERIAL: f64 = 2_958_465.0;

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=EXCEL_MAX_SERIAL).contains(&serial) {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

// Bare numbers are only taken as Excel serials inside this window
// (1954-10-03 ..= 2119-01-08) so that years and rates are not misread as dates.
const PLAUSIBLE_SERIALS: std::ops::RangeInclusive<f64> = 20_000.0..=80_000.0;

/// Which component a bare `a/b/Y` date puts first. The other order is only
/// tried when the first cannot form a valid date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlashOrder {
    #[default]
    MonthFirst,
    DayFirst,
}

impl SlashOrder {
    fn formats(self) -> [&'static str; 2] {
        match self {
            SlashOrder::MonthFirst => ["%m/%d/%Y", "%d/%m/%Y"],
            SlashOrder::DayFirst => ["%d/%m/%Y", "%m/%d/%Y"],
        }
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%Y/%m/%d", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
];

/// Calendar date from a structured date cell, an Excel serial, the
/// `"<day> <month-name> <year>"` pattern, or a handful of generic formats.
/// Bare slash dates are read month-first.
pub fn parse_local_date(cell: &Cell) -> Option<NaiveDate> {
    parse_local_date_with(cell, SlashOrder::default())
}

pub fn parse_local_date_with(cell: &Cell, order: SlashOrder) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Number(n) if PLAUSIBLE_SERIALS.contains(n) => excel_serial_to_date(*n),
        Cell::Text(s) => parse_date_text(s, order),
        _ => None,
    }
}

pub fn parse_date_text(raw: &str, order: SlashOrder) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let parts: Vec<&str> = s.split_whitespace().collect();
    if let [day, month, year] = parts.as_slice() {
        if let (Ok(day), Some(month), Ok(year)) = (
            day.parse::<u32>(),
            month_from_name(month),
            year.parse::<i32>(),
        ) {
            return NaiveDate::from_ymd_opt(year, month, day);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    order
        .formats()
        .iter()
        .chain(DATE_FORMATS)
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            // ISO timestamps with offsets, as returned by the backend.
            s.get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
}

/// Percent or comma-decimal text to a float: `"4,75 %"` -> 4.75.
pub fn parse_percent_or_decimal(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) => finite(*n),
        Cell::Text(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| *c != '%' && !c.is_whitespace())
                .map(|c| if c == ',' { '.' } else { c })
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok().and_then(finite)
        }
        _ => None,
    }
}

/// Plain numeric coercion: numbers pass through, text must parse as a float as-is.
pub fn coerce_number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) => finite(*n),
        Cell::Text(s) => s.trim().parse::<f64>().ok().and_then(finite),
        _ => None,
    }
}

/// Rate value: direct numeric coercion first, percent-text parsing as fallback.
pub fn parse_rate(cell: &Cell) -> Option<f64> {
    coerce_number(cell).or_else(|| parse_percent_or_decimal(cell))
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

fn integral(v: f64) -> Option<i64> {
    (v.is_finite() && v.fract() == 0.0).then_some(v as i64)
}

pub fn parse_year(cell: &Cell) -> Option<i32> {
    let year = match cell {
        Cell::Number(n) => integral(*n)?,
        Cell::Text(s) => integral(s.trim().parse::<f64>().ok()?)?,
        _ => return None,
    };
    (1900..=2100).contains(&year).then_some(year as i32)
}

/// Month number from a numeric cell or a month name.
pub fn parse_month(cell: &Cell) -> Option<u32> {
    let month = match cell {
        Cell::Number(n) => integral(*n)?,
        Cell::Text(s) => match s.trim().parse::<f64>() {
            Ok(v) => integral(v)?,
            Err(_) => return month_from_name(s),
        },
        _ => return None,
    };
    (1..=12).contains(&month).then_some(month as u32)
}

/// `(month, year)` from `"<month-name> ... <year>"` text or a date cell.
/// Only the first and last tokens are read, so trailing notes survive.
pub fn parse_period(cell: &Cell) -> Option<(u32, i32)> {
    if let Some(text) = cell.as_text() {
        let parts: Vec<&str> = text.split_whitespace().collect();
        if let [month, .., year] = parts.as_slice() {
            if let (Some(m), Ok(y)) = (month_from_name(month), year.parse::<i32>()) {
                return Some((m, y));
            }
        }
    }
    parse_local_date(cell).map(|d| (d.month(), d.year()))
}

fn year_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(19\d{2}|20\d{2})").expect("year pattern is a valid regex")
    })
}

/// Last 19xx/20xx token in a file name, e.g. `... (2022=100), 2024.xlsx` -> 2024.
pub fn year_from_file_name(name: &str) -> Option<i32> {
    year_token()
        .find_iter(name)
        .last()
        .and_then(|m| m.as_str().parse().ok())
}
