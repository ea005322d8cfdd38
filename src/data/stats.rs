//! Summary statistics over the inflation table.

use serde::Serialize;

use crate::data::records::{CanonicalTable, InflationRecord};
use crate::data::region::canonical_region;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InflationStats {
    pub count: usize,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    /// Sample standard deviation; 0 when fewer than two observations.
    pub std_dev: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InflationFilter {
    /// Any known spelling; resolved through the alias table.
    pub region: Option<String>,
    pub year: Option<i32>,
}

impl InflationFilter {
    /// An unknown region matches nothing rather than everything.
    pub fn apply<'a>(&self, table: &'a CanonicalTable<InflationRecord>) -> Vec<&'a InflationRecord> {
        let region = match &self.region {
            Some(raw) => match canonical_region(raw) {
                Some(canonical) => Some(canonical),
                None => return Vec::new(),
            },
            None => None,
        };
        table
            .rows()
            .iter()
            .filter(|r| region.map_or(true, |wanted| r.region == wanted))
            .filter(|r| self.year.map_or(true, |wanted| r.year == wanted))
            .collect()
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean, extremes and sample standard deviation, each rounded to 2 decimals.
pub fn summarize(values: &[f64]) -> Option<InflationStats> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let std_dev = if values.len() < 2 {
        0.0
    } else {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        var.sqrt()
    };
    Some(InflationStats {
        count: values.len(),
        mean: round2(mean),
        max: round2(max),
        min: round2(min),
        std_dev: round2(std_dev),
    })
}

pub fn inflation_stats(
    table: &CanonicalTable<InflationRecord>,
    filter: &InflationFilter,
) -> Option<InflationStats> {
    let rates: Vec<f64> = filter.apply(table).iter().map(|r| r.rate).collect();
    summarize(&rates)
}

pub fn latest_year(table: &CanonicalTable<InflationRecord>) -> Option<i32> {
    table.rows().iter().map(|r| r.year).max()
}

pub fn latest_month_in_year(table: &CanonicalTable<InflationRecord>, year: i32) -> Option<u32> {
    table
        .rows()
        .iter()
        .filter(|r| r.year == year)
        .map(|r| r.month)
        .max()
}
