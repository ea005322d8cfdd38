//! Runtime configuration.
//!
//! Resolution order, later wins: built-in defaults, then an optional YAML file
//! (`makro.yaml` or `$MAKRO_CONFIG`), then environment variables. A `.env`
//! file in the working directory is loaded into the environment first.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::error::{ConfigError, SinkError};

pub const DEFAULT_CONFIG_FILE: &str = "makro.yaml";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_SEED_OUTPUT: &str = "supabase/seed_actual.sql";
pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_FETCH_LIMIT: usize = 5000;

pub const DEFAULT_INFLATION_FILES: &[&str] = &[
    "Data Inflasi.xlsx",
    "Inflasi Tahunan (Y-on-Y) 38 Provinsi (2022=100), 2024.xlsx",
    "Inflasi Tahunan (Y-on-Y) 38 Provinsi (2022=100), 2025.xlsx",
];
pub const DEFAULT_REFERENCE_RATE_FILES: &[&str] = &["BI-7Day-RR.xlsx"];
pub const DEFAULT_EXCHANGE_RATE_FILES: &[&str] = &["Informasi Kurs Jisdor.xlsx"];

/// Shape of `makro.yaml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub inflation: Option<Vec<String>>,
    pub reference_rate: Option<Vec<String>>,
    pub exchange_rate: Option<Vec<String>>,
    pub batch_size: Option<usize>,
    pub fetch_limit: Option<usize>,
    pub bind: Option<String>,
    pub seed_output: Option<PathBuf>,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Source file names per indicator, relative to `data_dir`. Order matters:
/// later files win on shared keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub data_dir: PathBuf,
    pub inflation: Vec<String>,
    pub reference_rate: Vec<String>,
    pub exchange_rate: Vec<String>,
}

impl SourceConfig {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let owned = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            data_dir: data_dir.into(),
            inflation: owned(DEFAULT_INFLATION_FILES),
            reference_rate: owned(DEFAULT_REFERENCE_RATE_FILES),
            exchange_rate: owned(DEFAULT_EXCHANGE_RATE_FILES),
        }
    }

    fn resolve(&self, names: &[String]) -> Vec<PathBuf> {
        names.iter().map(|n| self.data_dir.join(n)).collect()
    }

    pub fn inflation_paths(&self) -> Vec<PathBuf> {
        self.resolve(&self.inflation)
    }

    pub fn reference_rate_paths(&self) -> Vec<PathBuf> {
        self.resolve(&self.reference_rate)
    }

    pub fn exchange_rate_paths(&self) -> Vec<PathBuf> {
        self.resolve(&self.exchange_rate)
    }

    /// Every configured file name, across all indicators.
    pub fn handled_names(&self) -> impl Iterator<Item = &str> {
        self.inflation
            .iter()
            .chain(&self.reference_rate)
            .chain(&self.exchange_rate)
            .map(String::as_str)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::with_data_dir(DEFAULT_DATA_DIR)
    }
}

/// Backend table names. Column names are fixed by the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub inflation: String,
    pub reference_rate: String,
    pub exchange_rate: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            inflation: "inflasi".to_string(),
            reference_rate: "bi_7day_rr".to_string(),
            exchange_rate: "kurs_jisdor".to_string(),
        }
    }
}

#[derive(Clone, Default)]
pub struct RemoteSettings {
    pub url: Option<String>,
    pub service_role_key: Option<String>,
    pub anon_key: Option<String>,
}

// Keys never appear in debug output, only whether they are set.
impl fmt::Debug for RemoteSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSettings")
            .field("url", &self.url)
            .field("service_role_key", &self.service_role_key.is_some())
            .field("anon_key", &self.anon_key.is_some())
            .finish()
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub url: String,
    pub key: String,
    /// True when the key bypasses row-level security.
    pub privileged: bool,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("privileged", &self.privileged)
            .finish_non_exhaustive()
    }
}

impl RemoteSettings {
    pub fn is_configured(&self) -> bool {
        self.url.is_some() && (self.service_role_key.is_some() || self.anon_key.is_some())
    }

    /// Credential for writes. The service role key is preferred; the public
    /// key is accepted with a warning because RLS will usually reject writes.
    pub fn write_credentials(&self) -> Result<Credentials, SinkError> {
        let url = self.url.clone().ok_or_else(|| {
            SinkError::NotConfigured("SUPABASE_URL is not set".to_string())
        })?;
        if let Some(key) = &self.service_role_key {
            return Ok(Credentials {
                url,
                key: key.clone(),
                privileged: true,
            });
        }
        match &self.anon_key {
            Some(key) => {
                warn!(
                    "SUPABASE_SERVICE_ROLE_KEY is not set; using SUPABASE_ANON_KEY. \
                     Writes will likely be rejected by row-level security."
                );
                Ok(Credentials {
                    url,
                    key: key.clone(),
                    privileged: false,
                })
            }
            None => Err(SinkError::NotConfigured(
                "set SUPABASE_SERVICE_ROLE_KEY (recommended) or SUPABASE_ANON_KEY".to_string(),
            )),
        }
    }

    /// Credential for reads: the public key first, then the service role key.
    pub fn read_credentials(&self) -> Option<Credentials> {
        let url = self.url.clone()?;
        let (key, privileged) = match (&self.anon_key, &self.service_role_key) {
            (Some(anon), _) => (anon.clone(), false),
            (None, Some(service)) => (service.clone(), true),
            (None, None) => return None,
        };
        Some(Credentials {
            url,
            key,
            privileged,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub sources: SourceConfig,
    pub batch_size: usize,
    pub fetch_limit: usize,
    pub bind: String,
    pub seed_output: PathBuf,
    pub tables: TableNames,
    pub remote: RemoteSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(FileConfig::default(), |_| None)
    }
}

/// Environment lookup where empty or whitespace-only values count as unset.
pub fn env_value(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_count(raw: Option<String>, key: &str) -> Option<usize> {
    let raw = raw?;
    match raw.parse::<usize>() {
        Ok(n) => Some(n.max(1)),
        Err(_) => {
            warn!(key, value = %raw, "ignoring non-numeric setting");
            None
        }
    }
}

impl Config {
    /// Loads `.env`, the YAML file if any, and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let file = match env_value("MAKRO_CONFIG") {
            Some(path) => FileConfig::from_path(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                FileConfig::from_path(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => FileConfig::default(),
        };
        Ok(Self::resolve(file, env_value))
    }

    /// Layers a parsed file and an environment lookup over the defaults.
    pub fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = env("MAKRO_DATA_DIR")
            .map(PathBuf::from)
            .or(file.data_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let mut sources = SourceConfig::with_data_dir(data_dir);
        if let Some(names) = file.inflation {
            sources.inflation = names;
        }
        if let Some(names) = file.reference_rate {
            sources.reference_rate = names;
        }
        if let Some(names) = file.exchange_rate {
            sources.exchange_rate = names;
        }

        let batch_size = parse_count(env("MAKRO_BATCH_SIZE"), "MAKRO_BATCH_SIZE")
            .or(file.batch_size.map(|n| n.max(1)))
            .unwrap_or(DEFAULT_BATCH_SIZE);
        let fetch_limit = parse_count(env("SUPABASE_FETCH_LIMIT"), "SUPABASE_FETCH_LIMIT")
            .or(file.fetch_limit.map(|n| n.max(1)))
            .unwrap_or(DEFAULT_FETCH_LIMIT);

        let defaults = TableNames::default();
        let tables = TableNames {
            inflation: env("SUPABASE_INFLASI_TABLE").unwrap_or(defaults.inflation),
            reference_rate: env("SUPABASE_BI_TABLE").unwrap_or(defaults.reference_rate),
            exchange_rate: env("SUPABASE_JISDOR_TABLE").unwrap_or(defaults.exchange_rate),
        };

        Self {
            sources,
            batch_size,
            fetch_limit,
            bind: env("MAKRO_BIND")
                .or(file.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            seed_output: file
                .seed_output
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SEED_OUTPUT)),
            tables,
            remote: RemoteSettings {
                url: env("SUPABASE_URL"),
                service_role_key: env("SUPABASE_SERVICE_ROLE_KEY"),
                anon_key: env("SUPABASE_ANON_KEY"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_file_or_env() {
        let config = Config::default();
        assert_eq!(config.sources.data_dir, PathBuf::from("data"));
        assert_eq!(config.sources.inflation.len(), 3);
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.fetch_limit, 5000);
        assert_eq!(config.bind, "127.0.0.1:3000");
        assert_eq!(config.tables.reference_rate, "bi_7day_rr");
        assert!(!config.remote.is_configured());
    }

    #[test]
    fn env_overrides_file_and_clamps_counts() {
        let file: FileConfig = serde_yaml::from_str(
            "data_dir: fixtures\nbatch_size: 100\nreference_rate: [\"bi.csv\"]\n",
        )
        .unwrap();
        let config = Config::resolve(
            file,
            env_from(&[("MAKRO_BATCH_SIZE", "0"), ("SUPABASE_BI_TABLE", "rates")]),
        );
        assert_eq!(config.sources.data_dir, PathBuf::from("fixtures"));
        assert_eq!(config.sources.reference_rate, vec!["bi.csv".to_string()]);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.tables.reference_rate, "rates");
        assert_eq!(
            config.sources.reference_rate_paths(),
            vec![PathBuf::from("fixtures").join("bi.csv")]
        );
    }

    #[test]
    fn write_credentials_prefer_service_role() {
        let remote = RemoteSettings {
            url: Some("https://example.supabase.co".to_string()),
            service_role_key: Some("service".to_string()),
            anon_key: Some("anon".to_string()),
        };
        let creds = remote.write_credentials().unwrap();
        assert!(creds.privileged);
        assert_eq!(creds.key, "service");
        assert_eq!(remote.read_credentials().unwrap().key, "anon");
    }

    #[test]
    fn missing_url_or_keys_is_not_configured() {
        let no_url = RemoteSettings {
            anon_key: Some("anon".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            no_url.write_credentials(),
            Err(SinkError::NotConfigured(_))
        ));

        let no_keys = RemoteSettings {
            url: Some("https://example.supabase.co".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            no_keys.write_credentials(),
            Err(SinkError::NotConfigured(_))
        ));
        assert!(no_keys.read_credentials().is_none());
    }

    #[test]
    fn debug_output_hides_keys() {
        let remote = RemoteSettings {
            url: Some("https://example.supabase.co".to_string()),
            service_role_key: Some("super-secret".to_string()),
            anon_key: None,
        };
        let shown = format!("{remote:?}");
        assert!(!shown.contains("super-secret"));
        assert!(shown.contains("service_role_key: true"));
    }
}
