use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_makro")
}

const CONFIG_YAML: &str = "data_dir: data\n\
inflation:\n  - inflasi_2025.csv\n\
reference_rate:\n  - BI-7Day-RR.csv\n\
exchange_rate:\n  - jisdor.csv\n";

/// A working directory with a config file and CSV sources.
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let data = dir.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(dir.path().join("makro.yaml"), CONFIG_YAML).unwrap();
    fs::write(
        data.join("inflasi_2025.csv"),
        "Provinsi,Bulan,Inflasi\nAceh,1,3.0\nAceh,1,3.5\nBali,2,2.1\n",
    )
    .unwrap();
    fs::write(
        data.join("BI-7Day-RR.csv"),
        "NO,Tanggal,BI-7Day-RR\n1,17 Desember 2025,\"4,75 %\"\n",
    )
    .unwrap();
    fs::write(
        data.join("jisdor.csv"),
        "NO,Tanggal,Kurs\n1,1/13/2026 12:00:00 AM,16750\n",
    )
    .unwrap();
    dir
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(bin())
        .args(args)
        .current_dir(dir)
        .env_remove("MAKRO_CONFIG")
        .env_remove("MAKRO_DATA_DIR")
        .env_remove("SUPABASE_URL")
        .env_remove("SUPABASE_SERVICE_ROLE_KEY")
        .env_remove("SUPABASE_ANON_KEY")
        .output()
        .expect("makro should run")
}

#[test]
fn missing_or_unknown_command_is_a_usage_error() {
    let dir = workspace();
    assert_eq!(run(dir.path(), &[]).status.code(), Some(2));
    assert_eq!(run(dir.path(), &["frobnicate"]).status.code(), Some(2));
}

#[test]
fn seed_writes_schema_and_inserts() {
    let dir = workspace();
    let output = run(dir.path(), &["seed", "--output", "out/seed.sql"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Wrote: out/seed.sql"));

    let script = fs::read_to_string(dir.path().join("out/seed.sql")).unwrap();
    assert!(script.starts_with("-- Seed"));
    assert!(script.contains("create table if not exists public.inflasi"));
    assert!(script.contains("('Aceh', 2025, 1, 3.5)"));
    assert!(!script.contains("('Aceh', 2025, 1, 3.0)"));
}

#[test]
fn seed_schema_only_skips_inserts() {
    let dir = workspace();
    let output = run(dir.path(), &["seed", "--output", "schema.sql", "--schema-only"]);
    assert_eq!(output.status.code(), Some(0));
    let script = fs::read_to_string(dir.path().join("schema.sql")).unwrap();
    assert!(script.contains("enable row level security"));
    assert!(!script.contains("insert into"));
}

#[test]
fn upload_dry_run_needs_no_credentials() {
    let dir = workspace();
    let output = run(dir.path(), &["upload", "--dry-run"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("inflation rows (after normalize/dedupe): 2"));
    assert!(stdout.contains("Dry run"));
}

#[test]
fn upload_without_credentials_fails_before_any_request() {
    let dir = workspace();
    let output = run(dir.path(), &["upload"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SUPABASE_URL"));
}

#[test]
fn export_writes_csv_and_registry() {
    let dir = workspace();
    let output = run(dir.path(), &["export", "--out", "exports"]);
    assert_eq!(output.status.code(), Some(0));
    let exports = dir.path().join("exports");
    assert!(exports.join("inflation.csv").is_file());
    assert!(exports.join("exchange_rate.csv").is_file());

    let registry: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(exports.join("registry.json")).unwrap()).unwrap();
    assert_eq!(registry["reference_rate"]["rows"], 1);
}

#[test]
fn check_passes_with_data_and_fails_without() {
    let dir = workspace();
    let output = run(dir.path(), &["check"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("check: 0 error(s)"));

    let empty = tempfile::tempdir().unwrap();
    let output = run(empty.path(), &["check"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn inspect_reports_layouts() {
    let dir = workspace();
    let output = run(dir.path(), &["inspect", "data/BI-7Day-RR.csv", "--rows", "1"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Layout: tabular"));
    assert!(stdout.contains("First 1 rows:"));

    let missing = run(dir.path(), &["inspect", "data/nope.xlsx"]);
    assert_eq!(missing.status.code(), Some(1));
}
