//! Dataset audit: diagnostics over the loaded canonical tables.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::data::records::{CanonicalRecord, CanonicalTable, DailyRecord};
use crate::data::region;
use crate::data::stats::latest_year;
use crate::ingest::sources::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Most severe first, insertion order otherwise.
    pub fn sorted(&self) -> Vec<&ValidationDiagnostic> {
        let mut out: Vec<&ValidationDiagnostic> = self.diagnostics.iter().collect();
        out.sort_by_key(|d| d.severity);
        out
    }
}

/// Rows must satisfy record invariants and keys must be strictly ascending.
fn check_table<R: CanonicalRecord>(report: &mut ValidationReport, table: &CanonicalTable<R>) {
    let context = R::KIND.as_str();
    if table.is_empty() {
        report.push(ValidationSeverity::Warning, context, "table is empty (no data available)");
        return;
    }
    report.push(
        ValidationSeverity::Info,
        context,
        format!("{} rows", table.len()),
    );

    let invalid = table.rows().iter().filter(|r| !r.is_valid()).count();
    if invalid > 0 {
        report.push(
            ValidationSeverity::Error,
            context,
            format!("{invalid} rows violate record invariants"),
        );
    }
    let unordered = table
        .rows()
        .windows(2)
        .filter(|pair| pair[0].key() >= pair[1].key())
        .count();
    if unordered > 0 {
        report.push(
            ValidationSeverity::Error,
            context,
            format!("{unordered} duplicate or out-of-order keys"),
        );
    }
}

fn check_daily_range<R: DailyRecord>(report: &mut ValidationReport, table: &CanonicalTable<R>) {
    if let (Some(first), Some(last)) = (table.rows().first(), table.rows().last()) {
        report.push(
            ValidationSeverity::Info,
            R::KIND.as_str(),
            format!("covers {} .. {}", first.date(), last.date()),
        );
    }
}

/// Regions present in the latest year that lack a month some other region has.
fn check_latest_year_coverage(report: &mut ValidationReport, dataset: &Dataset) {
    let table = &dataset.inflation;
    let Some(year) = latest_year(table) else {
        return;
    };

    let mut months_by_region: BTreeMap<&str, BTreeSet<u32>> = BTreeMap::new();
    for row in table.rows().iter().filter(|r| r.year == year) {
        months_by_region
            .entry(row.region.as_str())
            .or_default()
            .insert(row.month);
    }
    let expected: BTreeSet<u32> = months_by_region.values().flatten().copied().collect();

    for (name, months) in &months_by_region {
        let missing: Vec<String> = expected.difference(months).map(u32::to_string).collect();
        if !missing.is_empty() {
            report.push(
                ValidationSeverity::Warning,
                format!("inflation/{name}"),
                format!("{year} is missing month(s) {}", missing.join(", ")),
            );
        }
    }

    let absent: Vec<&str> = region::provinces()
        .filter(|p| !months_by_region.contains_key(p))
        .collect();
    if !absent.is_empty() && months_by_region.len() > 1 {
        report.push(
            ValidationSeverity::Info,
            "inflation",
            format!("{} province(s) have no data for {year}: {}", absent.len(), absent.join(", ")),
        );
    }
}

pub fn audit_dataset(dataset: &Dataset, unhandled_files: &[String]) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_table(&mut report, &dataset.inflation);
    check_table(&mut report, &dataset.reference_rate);
    check_table(&mut report, &dataset.exchange_rate);
    check_daily_range(&mut report, &dataset.reference_rate);
    check_daily_range(&mut report, &dataset.exchange_rate);
    check_latest_year_coverage(&mut report, dataset);

    if dataset.is_empty() {
        report.push(
            ValidationSeverity::Error,
            "dataset",
            "no rows loaded from any source",
        );
    }
    for name in unhandled_files {
        report.push(
            ValidationSeverity::Warning,
            format!("file/{name}"),
            "spreadsheet is not handled by any configured source",
        );
    }
    report
}
