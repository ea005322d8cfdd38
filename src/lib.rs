//! Ingestion pipeline for Indonesian macro indicators: monthly inflation by
//! region, the BI-7Day-RR policy rate and the JISDOR exchange rate.
//!
//! Heterogeneous spreadsheets are read into raw grids, located, normalized
//! into canonical tables, deduplicated on their natural keys and persisted as
//! a SQL seed file, a remote upsert or CSV exports.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod server;
pub mod sink;
