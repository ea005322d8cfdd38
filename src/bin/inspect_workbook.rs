//! Inspect a source spreadsheet: sheet names, sizes, first rows and the layouts
//! the locators recognize on each sheet.
//! Usage: cargo run --bin inspect_workbook -- "data/BI-7Day-RR.xlsx" [rows]

use std::path::Path;

use makro::ingest::inspect::{inspect_path, DEFAULT_PREVIEW_ROWS};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    makro::logging::init();
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .ok_or("Usage: inspect_workbook <path-to.xlsx|.csv> [rows]")?;
    let rows = match args.next() {
        Some(raw) => raw.parse::<usize>()?,
        None => DEFAULT_PREVIEW_ROWS,
    };

    let report = inspect_path(Path::new(&path), rows)?;
    print!("{report}");
    Ok(())
}
