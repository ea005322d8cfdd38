//! Statement emission: a self-contained SQL seed file with schema DDL and
//! chunked `insert ... on conflict do update` statements.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::config::TableNames;
use crate::data::records::{
    CanonicalRecord, CanonicalTable, ExchangeRateRecord, FieldValue, InflationRecord,
    ReferenceRateRecord,
};
use crate::error::SinkError;
use crate::ingest::sources::Dataset;
use crate::sink::TableSpec;

pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// SQL literal for one value: `null`, bare numbers, quoted dates and text
/// with embedded quotes doubled.
pub fn sql_literal(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => "null".to_string(),
        FieldValue::Int(i) => i.to_string(),
        FieldValue::Float(f) if f.is_finite() => format!("{f:?}"),
        FieldValue::Float(_) => "null".to_string(),
        FieldValue::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
        FieldValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
    }
}

fn label(spec: &TableSpec) -> String {
    spec.name.to_uppercase().replace('_', "-")
}

/// Appends the insert statements for one table, `chunk_size` rows each.
/// An empty table gets a comment instead.
pub fn emit_inserts<R: CanonicalRecord>(
    out: &mut String,
    spec: &TableSpec,
    table: &CanonicalTable<R>,
    chunk_size: usize,
) {
    let chunk_size = chunk_size.max(1);
    let _ = writeln!(out, "-- =========================");
    let _ = writeln!(out, "-- SEED DATA: {}", label(spec));
    let _ = writeln!(out, "-- =========================\n");

    if table.is_empty() {
        let _ = writeln!(out, "-- (no {} rows were read from the sources)\n", spec.name);
        return;
    }

    let columns = spec.columns.join(", ");
    let updates: Vec<String> = spec
        .value_columns()
        .map(|c| format!("{c} = excluded.{c}"))
        .collect();

    for chunk in table.rows().chunks(chunk_size) {
        let values: Vec<String> = chunk
            .iter()
            .map(|record| {
                let literals: Vec<String> = record.fields().iter().map(sql_literal).collect();
                format!("({})", literals.join(", "))
            })
            .collect();
        let _ = writeln!(out, "insert into public.{} ({columns}) values", spec.name);
        let _ = writeln!(out, "{}", values.join(",\n"));
        let _ = writeln!(
            out,
            "on conflict ({}) do update set {};\n",
            spec.conflict.join(", "),
            updates.join(", ")
        );
    }
}

/// Idempotent DDL for one table: table, unique natural key, indexes,
/// row-level security and a public read policy.
pub fn emit_schema(out: &mut String, spec: &TableSpec) {
    let t = &spec.name;
    let _ = writeln!(out, "-- =========================");
    let _ = writeln!(out, "-- TABLE {}", label(spec));
    let _ = writeln!(out, "-- =========================");
    let _ = writeln!(out, "create table if not exists public.{t} (");
    let _ = writeln!(out, "    id bigserial primary key,");
    for (col, ty) in spec.columns.iter().zip(spec.column_types) {
        let _ = writeln!(out, "    {col} {ty},");
    }
    let _ = writeln!(out, "    created_at timestamptz not null default now(),");
    let _ = writeln!(
        out,
        "    constraint {t}_unique unique ({})",
        spec.conflict.join(", ")
    );
    let _ = writeln!(out, ");\n");

    for cols in spec.indexes {
        let _ = writeln!(
            out,
            "create index if not exists {t}_{}_idx on public.{t} ({});",
            cols.join("_"),
            cols.join(", ")
        );
    }
    let _ = writeln!(out, "\nalter table public.{t} enable row level security;\n");

    let policy = format!("Public read {t}");
    let _ = writeln!(out, "do $$");
    let _ = writeln!(out, "begin");
    let _ = writeln!(out, "    if not exists (");
    let _ = writeln!(out, "        select 1 from pg_policies");
    let _ = writeln!(out, "        where schemaname = 'public'");
    let _ = writeln!(out, "            and tablename  = '{t}'");
    let _ = writeln!(out, "            and policyname = '{policy}'");
    let _ = writeln!(out, "    ) then");
    let _ = writeln!(out, "        create policy \"{policy}\"");
    let _ = writeln!(out, "            on public.{t}");
    let _ = writeln!(out, "            for select");
    let _ = writeln!(out, "            to anon, authenticated");
    let _ = writeln!(out, "            using (true);");
    let _ = writeln!(out, "    end if;");
    let _ = writeln!(out, "end $$;\n");
}

fn header(out: &mut String, specs: &[TableSpec]) {
    let _ = writeln!(out, "-- Seed for the macro indicator tables.");
    let _ = writeln!(out, "-- Generated by `makro seed` from the configured source spreadsheets.");
    let _ = writeln!(out, "--");
    let _ = writeln!(out, "-- Usage: paste into the backend SQL editor and run.");
    let _ = writeln!(out, "--");
    let _ = writeln!(out, "-- Tables:");
    for spec in specs {
        let _ = writeln!(out, "--   - public.{} ({})", spec.name, spec.columns.join(", "));
    }
    let _ = writeln!(out, "--");
    let _ = writeln!(
        out,
        "-- RLS is enabled with a public SELECT policy for anon/authenticated reads."
    );
    let _ = writeln!(out);
}

/// Full seed script, wrapped in one transaction. `schema_only` skips data.
pub fn render_seed(
    dataset: &Dataset,
    names: &TableNames,
    chunk_size: usize,
    schema_only: bool,
) -> String {
    let specs = [
        TableSpec::of::<InflationRecord>(names),
        TableSpec::of::<ReferenceRateRecord>(names),
        TableSpec::of::<ExchangeRateRecord>(names),
    ];

    let mut out = String::new();
    header(&mut out, &specs);
    out.push_str("begin;\n\n");
    for spec in &specs {
        emit_schema(&mut out, spec);
    }
    if !schema_only {
        emit_inserts(&mut out, &specs[0], &dataset.inflation, chunk_size);
        emit_inserts(&mut out, &specs[1], &dataset.reference_rate, chunk_size);
        emit_inserts(&mut out, &specs[2], &dataset.exchange_rate, chunk_size);
    }
    out.push_str("commit;\n");
    out
}

pub fn write_seed(path: &Path, script: &str) -> Result<(), SinkError> {
    let io_error = |source: std::io::Error| SinkError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    fs::write(path, script).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::sources::DataOrigin;
    use chrono::NaiveDate;

    #[test]
    fn literals_escape_and_format() {
        assert_eq!(sql_literal(&FieldValue::Null), "null");
        assert_eq!(sql_literal(&FieldValue::Int(2025)), "2025");
        assert_eq!(sql_literal(&FieldValue::Float(3.0)), "3.0");
        assert_eq!(sql_literal(&FieldValue::Float(4.75)), "4.75");
        assert_eq!(sql_literal(&FieldValue::Float(f64::NAN)), "null");
        assert_eq!(
            sql_literal(&FieldValue::Date(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap())),
            "'2025-01-02'"
        );
        assert_eq!(
            sql_literal(&FieldValue::Text("Jum'at".to_string())),
            "'Jum''at'"
        );
    }

    #[test]
    fn inserts_are_chunked_with_conflict_clause() {
        let rows: Vec<ReferenceRateRecord> = (0..1201)
            .map(|i| ReferenceRateRecord {
                date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Duration::days(i),
                rate: 4.0,
            })
            .collect();
        let table = CanonicalTable::from_rows(rows);
        let spec = TableSpec::of::<ReferenceRateRecord>(&TableNames::default());

        let mut out = String::new();
        emit_inserts(&mut out, &spec, &table, DEFAULT_CHUNK_SIZE);
        assert_eq!(out.matches("insert into public.bi_7day_rr").count(), 3);
        assert_eq!(
            out.matches("on conflict (tanggal) do update set bi_7day_rr = excluded.bi_7day_rr;")
                .count(),
            3
        );
        assert!(out.contains("('2020-01-01', 4.0)"));
    }

    #[test]
    fn empty_table_emits_comment_only() {
        let spec = TableSpec::of::<InflationRecord>(&TableNames::default());
        let mut out = String::new();
        emit_inserts(&mut out, &spec, &CanonicalTable::<InflationRecord>::empty(), 500);
        assert!(!out.contains("insert into"));
        assert!(out.contains("-- (no inflasi rows"));
    }

    #[test]
    fn seed_is_one_transaction_and_schema_only_skips_data() {
        let mut dataset = Dataset::empty(DataOrigin::Local);
        dataset.inflation = CanonicalTable::from_rows(vec![InflationRecord {
            region: "DKI Jakarta".to_string(),
            year: 2025,
            month: 1,
            rate: 1.5,
        }]);
        let names = TableNames::default();

        let full = render_seed(&dataset, &names, 500, false);
        assert!(full.contains("begin;\n"));
        assert!(full.trim_end().ends_with("commit;"));
        assert!(full.contains("check (bulan between 1 and 12)"));
        assert!(full.contains("constraint inflasi_unique unique (provinsi, tahun, bulan)"));
        assert!(full.contains("('DKI Jakarta', 2025, 1, 1.5)"));
        assert!(full.contains(
            "on conflict (provinsi, tahun, bulan) do update set inflasi = excluded.inflasi;"
        ));

        let schema = render_seed(&dataset, &names, 500, true);
        assert!(schema.contains("create table if not exists public.kurs_jisdor"));
        assert!(!schema.contains("insert into"));
    }
}
