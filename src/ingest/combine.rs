//! Multi-source combiner.
//!
//! Tables from several files (or from the remote backend) are unioned and run
//! through the same validity filter and last-write-wins dedup as a single
//! file. Input order is significant: a later table wins ties on the key.

use serde_json::Value;

use crate::data::records::{CanonicalRecord, CanonicalTable, DailyRecord, InflationRecord};
use crate::data::region::canonical_region;
use crate::ingest::grid::Cell;
use crate::ingest::locate::{
    DATE_HEADERS, INFLATION_HEADERS, MONTH_HEADERS, REGION_HEADERS, YEAR_HEADERS,
};
use crate::ingest::parse::{parse_local_date, parse_month, parse_rate, parse_year};

pub fn combine<R: CanonicalRecord>(
    tables: impl IntoIterator<Item = CanonicalTable<R>>,
) -> CanonicalTable<R> {
    CanonicalTable::from_rows(tables.into_iter().flat_map(CanonicalTable::into_rows))
}

fn json_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Empty,
        Value::Bool(b) => Cell::Bool(*b),
        Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
        Value::String(s) => Cell::text(s),
        other => Cell::text(&other.to_string()),
    }
}

/// First field of `row` whose (case-insensitive) name is one of `synonyms`.
fn field(row: &Value, synonyms: &[&str]) -> Cell {
    row.as_object()
        .and_then(|obj| {
            obj.iter()
                .find(|(name, _)| synonyms.contains(&name.trim().to_lowercase().as_str()))
                .map(|(_, v)| json_cell(v))
        })
        .unwrap_or(Cell::Empty)
}

/// Coerces backend rows into inflation records. Column names are matched by
/// synonym; region spellings go through the alias table.
pub fn inflation_from_json(rows: &[Value]) -> CanonicalTable<InflationRecord> {
    let records = rows.iter().filter_map(|row| {
        let region = canonical_region(&field(row, REGION_HEADERS).to_string())?;
        Some(InflationRecord {
            region: region.to_string(),
            year: parse_year(&field(row, YEAR_HEADERS))?,
            month: parse_month(&field(row, MONTH_HEADERS))?,
            rate: parse_rate(&field(row, INFLATION_HEADERS))?,
        })
    });
    CanonicalTable::from_rows(records)
}

pub fn daily_from_json<R: DailyRecord>(rows: &[Value], value_synonyms: &[&str]) -> CanonicalTable<R> {
    let records = rows.iter().filter_map(|row| {
        let date = parse_local_date(&field(row, DATE_HEADERS))?;
        let rate = parse_rate(&field(row, value_synonyms))?;
        Some(R::new(date, rate))
    });
    CanonicalTable::from_rows(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::records::ReferenceRateRecord;
    use crate::ingest::locate::REFERENCE_RATE_HEADERS;
    use serde_json::json;

    fn inflation(region: &str, year: i32, month: u32, rate: f64) -> InflationRecord {
        InflationRecord {
            region: region.to_string(),
            year,
            month,
            rate,
        }
    }

    #[test]
    fn later_tables_win_on_shared_keys() {
        let first = CanonicalTable::from_rows(vec![inflation("Aceh", 2025, 1, 3.0)]);
        let second = CanonicalTable::from_rows(vec![inflation("Aceh", 2025, 1, 3.5)]);
        let combined = combine(vec![first, second]);
        assert_eq!(combined.rows(), &[inflation("Aceh", 2025, 1, 3.5)]);
    }

    #[test]
    fn combining_a_table_with_itself_is_a_no_op() {
        let table = CanonicalTable::from_rows(vec![
            inflation("Bali", 2024, 5, 2.0),
            inflation("Aceh", 2024, 5, 1.0),
        ]);
        let combined = combine(vec![table.clone(), table.clone()]);
        assert_eq!(combined, table);
    }

    #[test]
    fn backend_rows_map_through_synonyms_and_aliases() {
        let rows = vec![
            json!({"id": 1, "provinsi": "KEP. RIAU", "tahun": 2024, "bulan": 3, "inflasi": 1.2}),
            json!({"Province": "Dki Jakarta", "Year": "2024", "Month": "Maret", "inflation_percent": "2,5"}),
            json!({"provinsi": "Atlantis", "tahun": 2024, "bulan": 3, "inflasi": 1.0}),
            json!({"provinsi": "Bali", "tahun": 2024, "bulan": null, "inflasi": 1.0}),
        ];
        let table = inflation_from_json(&rows);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0], inflation("DKI Jakarta", 2024, 3, 2.5));
        assert_eq!(table.rows()[1].region, "Kepulauan Riau");
    }

    #[test]
    fn backend_daily_rows_accept_iso_dates() {
        let rows = vec![
            json!({"tanggal": "2025-12-17", "bi_7day_rr": 4.75}),
            json!({"date": "2025-11-19T00:00:00+00:00", "rate": "4.75"}),
            json!({"tanggal": "bad", "bi_7day_rr": 4.75}),
        ];
        let table: CanonicalTable<ReferenceRateRecord> =
            daily_from_json(&rows, REFERENCE_RATE_HEADERS);
        assert_eq!(table.len(), 2);
    }
}
