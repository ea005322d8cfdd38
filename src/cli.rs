use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::config::Config;
use crate::data::validate::{audit_dataset, ValidationSeverity};
use crate::ingest::inspect::{inspect_path, DEFAULT_PREVIEW_ROWS};
use crate::ingest::sources::{unhandled_workbooks, DataOrigin, Dataset};
use crate::server;
use crate::sink::export::{export_dataset, DEFAULT_EXPORT_DIR};
use crate::sink::remote::{upload_dataset, PostgrestClient};
use crate::sink::sql::{render_seed, write_seed};

#[derive(Debug, Parser)]
#[command(name = "makro", version, about = "Macro indicator ingestion and data API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Write a SQL seed file (schema plus upserts) from the local sources
    Seed {
        /// Output path (defaults to supabase/seed_actual.sql)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Write only the table definitions
        #[arg(long)]
        schema_only: bool,
        /// Rows per insert statement
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Upsert the local sources into the remote backend
    Upload {
        /// Load and count rows without contacting the backend
        #[arg(long)]
        dry_run: bool,
        /// Rows per request
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Write each canonical table as CSV and update registry.json
    Export {
        #[arg(long, default_value = DEFAULT_EXPORT_DIR)]
        out: PathBuf,
    },
    /// Audit the local sources; exits 1 when errors are found
    Check,
    /// Print sheets, first rows and detected layouts of a spreadsheet
    Inspect {
        path: PathBuf,
        #[arg(long, default_value_t = DEFAULT_PREVIEW_ROWS)]
        rows: usize,
    },
    /// Serve the data API
    Serve,
}

pub fn parse_command(args: &[String]) -> Result<Command, clap::Error> {
    Cli::try_parse_from(args).map(|cli| cli.command)
}

pub fn run_with_args(args: &[String]) -> i32 {
    let command = match parse_command(args) {
        Ok(command) => command,
        Err(err) => {
            let _ = err.print();
            // --help and --version land here too.
            return if err.use_stderr() { 2 } else { 0 };
        }
    };

    if let Command::Inspect { path, rows } = &command {
        return handle_inspect(path, *rows);
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return 1;
        }
    };
    run(command, &config)
}

pub fn run(command: Command, config: &Config) -> i32 {
    match command {
        Command::Seed {
            output,
            schema_only,
            batch_size,
        } => handle_seed(config, output, schema_only, batch_size),
        Command::Upload {
            dry_run,
            batch_size,
        } => handle_upload(config, dry_run, batch_size),
        Command::Export { out } => handle_export(config, &out),
        Command::Check => handle_check(config),
        Command::Inspect { path, rows } => handle_inspect(&path, rows),
        Command::Serve => handle_serve(config),
    }
}

fn load_local(config: &Config) -> Dataset {
    for name in unhandled_workbooks(&config.sources) {
        warn!(file = %name, "spreadsheet in the data directory is not handled by any source");
    }
    let dataset = Dataset::load_local(&config.sources);
    println!("inflation rows (after normalize/dedupe): {}", dataset.inflation.len());
    println!("reference_rate rows (after normalize/dedupe): {}", dataset.reference_rate.len());
    println!("exchange_rate rows (after normalize/dedupe): {}", dataset.exchange_rate.len());
    dataset
}

fn handle_seed(
    config: &Config,
    output: Option<PathBuf>,
    schema_only: bool,
    batch_size: Option<usize>,
) -> i32 {
    let output = output.unwrap_or_else(|| config.seed_output.clone());
    let chunk_size = batch_size.unwrap_or(config.batch_size).max(1);
    let dataset = if schema_only {
        Dataset::empty(DataOrigin::Local)
    } else {
        load_local(config)
    };

    let script = render_seed(&dataset, &config.tables, chunk_size, schema_only);
    match write_seed(&output, &script) {
        Ok(()) => {
            println!("Wrote: {}", output.display());
            0
        }
        Err(err) => {
            eprintln!("seed failed: {err}");
            1
        }
    }
}

fn handle_upload(config: &Config, dry_run: bool, batch_size: Option<usize>) -> i32 {
    let batch_size = batch_size.unwrap_or(config.batch_size).max(1);
    let dataset = load_local(config);
    if dry_run {
        println!("Dry run: nothing was sent.");
        return 0;
    }

    let credentials = match config.remote.write_credentials() {
        Ok(credentials) => credentials,
        Err(err) => {
            eprintln!("upload failed: {err}");
            return 1;
        }
    };
    info!(
        url = %credentials.url,
        privileged = credentials.privileged,
        batch_size,
        "uploading"
    );

    let mut client = PostgrestClient::new(&credentials);
    match upload_dataset(&mut client, &config.tables, &dataset, batch_size) {
        Ok(summary) => {
            println!(
                "Upserted: {}={}, {}={}, {}={}",
                config.tables.inflation,
                summary.inflation,
                config.tables.reference_rate,
                summary.reference_rate,
                config.tables.exchange_rate,
                summary.exchange_rate
            );
            0
        }
        Err(err) => {
            eprintln!("upload failed: {err}");
            1
        }
    }
}

fn handle_export(config: &Config, out: &Path) -> i32 {
    let dataset = load_local(config);
    match export_dataset(out, &dataset) {
        Ok(exported) => {
            for table in exported {
                println!("Wrote: {} ({} rows)", table.path.display(), table.rows);
            }
            0
        }
        Err(err) => {
            eprintln!("export failed: {err}");
            1
        }
    }
}

fn handle_check(config: &Config) -> i32 {
    let unhandled = unhandled_workbooks(&config.sources);
    let dataset = Dataset::load_local(&config.sources);
    let report = audit_dataset(&dataset, &unhandled);

    for diagnostic in report.sorted() {
        println!("{diagnostic}");
    }
    println!(
        "check: {} error(s), {} warning(s)",
        report.count(ValidationSeverity::Error),
        report.count(ValidationSeverity::Warning)
    );
    if report.has_errors() {
        1
    } else {
        0
    }
}

fn handle_inspect(path: &Path, rows: usize) -> i32 {
    match inspect_path(path, rows) {
        Ok(report) => {
            print!("{report}");
            0
        }
        Err(err) => {
            eprintln!("inspect failed: {err}");
            1
        }
    }
}

fn handle_serve(config: &Config) -> i32 {
    match server::run_server(config) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_seed_flags() {
        let command = parse_command(&args(&[
            "makro",
            "seed",
            "--output",
            "out.sql",
            "--schema-only",
            "--batch-size",
            "100",
        ]))
        .unwrap();
        assert_eq!(
            command,
            Command::Seed {
                output: Some(PathBuf::from("out.sql")),
                schema_only: true,
                batch_size: Some(100),
            }
        );
    }

    #[test]
    fn inspect_defaults_preview_rows() {
        let command = parse_command(&args(&["makro", "inspect", "a.xlsx"])).unwrap();
        assert_eq!(
            command,
            Command::Inspect {
                path: PathBuf::from("a.xlsx"),
                rows: DEFAULT_PREVIEW_ROWS,
            }
        );
    }

    #[test]
    fn unknown_command_is_a_usage_error() {
        assert_eq!(run_with_args(&args(&["makro", "frobnicate"])), 2);
        assert_eq!(run_with_args(&args(&["makro"])), 2);
    }
}
