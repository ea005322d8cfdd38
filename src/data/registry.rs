//! Data registry: source and freshness of each exported table.
//! Written by `makro export` next to the CSV files.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSetEntry {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    pub path: String,
    #[serde(default)]
    pub rows: usize,
}

/// Keyed by table kind (`inflation`, `reference_rate`, `exchange_rate`).
pub type Registry = BTreeMap<String, DataSetEntry>;

pub const DEFAULT_REGISTRY_FILE: &str = "registry.json";

/// Missing or unparsable registries read as empty.
pub fn load_registry(path: &Path) -> Registry {
    fs::read_to_string(path)
        .ok()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

pub fn save_registry(path: &Path, registry: &Registry) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(registry)?;
    fs::write(path, body + "\n")
}
