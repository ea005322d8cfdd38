use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use makro::config::{SourceConfig, TableNames};
use makro::data::records::{CanonicalRecord, CanonicalTable, InflationRecord, ReferenceRateRecord};
use makro::ingest::combine::combine;
use makro::ingest::grid::Grid;
use makro::ingest::normalize::{normalize_inflation, InflationShape};
use makro::ingest::sources::{
    load_exchange_rate, load_inflation, load_reference_rate, read_reference_rate_file, Dataset,
};
use makro::sink::sql::render_seed;

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("fixture should be writable");
    path
}

const BI_CSV: &str = "BI-7Day-RR,,,\n,,,\n,,,\nNO,Tanggal,BI-7Day-RR,\n\
1,17 Desember 2025,\"4,75 %\",\n\
NO,Tanggal,BI-7Day-RR,\n\
2,19 November 2025,\"4,75 %\",\n\
3,22 Oktober 2025,\"4,75 %\",\n";

const JISDOR_CSV: &str = "Informasi Kurs Jisdor,,,\n,,,\n,,,\n,,,\nNO,Tanggal,Kurs,\n\
1,1/13/2026 12:00:00 AM,16750,\n\
2,1/12/2026 12:00:00 AM,16745,\n";

const INFLATION_CSV: &str = "Provinsi,Tahun,Bulan,Inflasi (%)\n\
ACEH,2025,1,3.0\n\
Aceh,2025,1,3.5\n\
Bali,2025,Februari,\"2,1\"\n";

#[test]
fn combining_a_table_with_itself_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "BI-7Day-RR.csv", BI_CSV);
    let table = read_reference_rate_file(&path).expect("fixture should parse");
    assert_eq!(table.len(), 3);

    let doubled = combine([table.clone(), table.clone()]);
    assert_eq!(doubled, table);
}

#[test]
fn no_invalid_record_survives_normalization() {
    let grid = Grid::from_text_rows(&[
        &["Provinsi", "Tahun", "Bulan", "Inflasi"],
        &["Aceh", "2025", "13", "1.0"],
        &["Aceh", "2025", "0", "1.0"],
        &["Aceh", "2025", "5", "NaN"],
        &["Aceh", "2025", "6", "inf"],
        &["Aceh", "2025", "7", "1.25"],
        &["Atlantis", "2025", "7", "1.25"],
    ]);
    let table = normalize_inflation(&grid, InflationShape::StandardHeader { file_year: None });
    assert_eq!(table.len(), 1);
    for record in table.rows() {
        assert!((1..=12).contains(&record.month));
        assert!(record.rate.is_finite());
        assert!(record.is_valid());
    }
}

#[test]
fn later_row_wins_on_duplicate_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "inflasi_2025.csv", INFLATION_CSV);
    let table = load_inflation(&[path]);

    let aceh: Vec<&InflationRecord> = table
        .rows()
        .iter()
        .filter(|r| r.region == "Aceh" && r.year == 2025 && r.month == 1)
        .collect();
    assert_eq!(aceh.len(), 1);
    assert_eq!(aceh[0].rate, 3.5);
    assert_eq!(table.len(), 2);
}

#[test]
fn later_file_wins_across_sources() {
    let dir = tempfile::tempdir().unwrap();
    let first = write(dir.path(), "a_2025.csv", "Provinsi,Bulan,Inflasi\nAceh,1,3.0\n");
    let second = write(dir.path(), "b_2025.csv", "Provinsi,Bulan,Inflasi\nAceh,1,3.5\n");

    let table = load_inflation(&[first.clone(), second.clone()]);
    assert_eq!(table.rows()[0].rate, 3.5);
    let reversed = load_inflation(&[second, first]);
    assert_eq!(reversed.rows()[0].rate, 3.0);
}

#[test]
fn repeated_header_rows_are_not_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "BI-7Day-RR.csv", BI_CSV);
    let table = load_reference_rate(&[path]);

    let dates: Vec<NaiveDate> = table.rows().iter().map(|r| r.date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2025, 10, 22).unwrap(),
            NaiveDate::from_ymd_opt(2025, 11, 19).unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 17).unwrap(),
        ]
    );
    assert!(table.rows().iter().all(|r| r.rate == 4.75));
}

#[test]
fn missing_file_contributes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let present = write(dir.path(), "BI-7Day-RR.csv", BI_CSV);
    let absent = dir.path().join("BI-7Day-RR-2024.xlsx");

    let alone = load_reference_rate(&[present.clone()]);
    let with_missing = load_reference_rate(&[present, absent]);
    assert_eq!(with_missing, alone);
}

#[test]
fn exchange_rate_uses_month_first_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "jisdor.csv", JISDOR_CSV);
    let table = load_exchange_rate(&[path]);
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows()[1].date, NaiveDate::from_ymd_opt(2026, 1, 13).unwrap());
    assert_eq!(table.rows()[1].rate, 16750.0);
}

#[test]
fn exchange_rate_reads_bare_slash_dates_month_first() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "jisdor.csv",
        "NO,Tanggal,Kurs\n1,1/12/2026,16745\n2,1/13/2026,16750\n",
    );
    let table = load_exchange_rate(&[path]);
    let dates: Vec<NaiveDate> = table.rows().iter().map(|r| r.date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 13).unwrap(),
        ]
    );
}

#[test]
fn local_dataset_renders_a_complete_seed() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "inflasi_2025.csv", INFLATION_CSV);
    write(dir.path(), "BI-7Day-RR.csv", BI_CSV);
    write(dir.path(), "jisdor.csv", JISDOR_CSV);

    let sources = SourceConfig {
        data_dir: dir.path().to_path_buf(),
        inflation: vec!["inflasi_2025.csv".to_string()],
        reference_rate: vec!["BI-7Day-RR.csv".to_string()],
        exchange_rate: vec!["jisdor.csv".to_string()],
    };
    let dataset = Dataset::load_local(&sources);
    assert_eq!(
        (dataset.inflation.len(), dataset.reference_rate.len(), dataset.exchange_rate.len()),
        (2, 3, 2)
    );

    let script = render_seed(&dataset, &TableNames::default(), 500, false);
    assert!(script.contains("('Aceh', 2025, 1, 3.5)"));
    assert!(script.contains("('2025-12-17', 4.75)"));
    assert!(script.contains("('2026-01-13', 16750.0)"));
    assert_eq!(script.matches("insert into public.").count(), 3);
}

#[test]
fn empty_table_keeps_its_shape() {
    let table: CanonicalTable<ReferenceRateRecord> = load_reference_rate(&[]);
    assert!(table.is_empty());
    assert_eq!(table.columns(), &["date", "rate"]);
}
