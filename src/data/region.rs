//! Fixed enumeration of Indonesian administrative regions and alias resolution.
//!
//! Source spreadsheets spell the same province many ways ("PROV ACEH",
//! "KEP. RIAU", "Daerah Istimewa Yogyakarta", ...). Every spelling is reduced
//! to a lookup key and mapped onto exactly one canonical name.

use std::collections::HashMap;
use std::sync::LazyLock;

/// The national aggregate row.
pub const NATIONAL: &str = "Nasional";

/// Canonical name followed by known aliases (already in lookup-key form).
const REGIONS: &[(&str, &[&str])] = &[
    ("Aceh", &["NANGGROE ACEH DARUSSALAM", "NAD"]),
    ("Sumatera Utara", &["SUMATRA UTARA", "SUMUT"]),
    ("Sumatera Barat", &["SUMATRA BARAT", "SUMBAR"]),
    ("Riau", &[]),
    ("Jambi", &[]),
    ("Sumatera Selatan", &["SUMATRA SELATAN", "SUMSEL"]),
    ("Bengkulu", &[]),
    ("Lampung", &[]),
    ("Bangka Belitung", &["KEPULAUAN BANGKA BELITUNG", "BABEL"]),
    ("Kepulauan Riau", &["KEPRI"]),
    (
        "DKI Jakarta",
        &["JAKARTA", "DAERAH KHUSUS IBUKOTA JAKARTA", "DAERAH KHUSUS JAKARTA"],
    ),
    ("Jawa Barat", &["JABAR"]),
    ("Jawa Tengah", &["JATENG"]),
    (
        "DI Yogyakarta",
        &["DAERAH ISTIMEWA YOGYAKARTA", "D I YOGYAKARTA", "YOGYAKARTA", "DIY"],
    ),
    ("Jawa Timur", &["JATIM"]),
    ("Banten", &[]),
    ("Bali", &[]),
    ("Nusa Tenggara Barat", &["NTB"]),
    ("Nusa Tenggara Timur", &["NTT"]),
    ("Kalimantan Barat", &["KALBAR"]),
    ("Kalimantan Tengah", &["KALTENG"]),
    ("Kalimantan Selatan", &["KALSEL"]),
    ("Kalimantan Timur", &["KALTIM"]),
    ("Kalimantan Utara", &["KALTARA"]),
    ("Sulawesi Utara", &["SULUT"]),
    ("Sulawesi Tengah", &["SULTENG"]),
    ("Sulawesi Selatan", &["SULSEL"]),
    ("Sulawesi Tenggara", &["SULTRA"]),
    ("Gorontalo", &[]),
    ("Sulawesi Barat", &["SULBAR"]),
    ("Maluku", &[]),
    ("Maluku Utara", &["MALUT"]),
    ("Papua Barat", &[]),
    ("Papua Barat Daya", &[]),
    ("Papua", &[]),
    ("Papua Selatan", &[]),
    ("Papua Tengah", &[]),
    ("Papua Pegunungan", &[]),
    (NATIONAL, &["INDONESIA", "NATIONAL"]),
];

static LOOKUP: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for (canonical, aliases) in REGIONS {
        map.insert(lookup_key(canonical), *canonical);
        for alias in *aliases {
            map.insert(lookup_key(alias), *canonical);
        }
    }
    map
});

/// Uppercase, punctuation-free, single-spaced; administrative prefixes removed
/// and the "Kep." abbreviation expanded.
fn lookup_key(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c == '.' || c == '-' || c == '_' { ' ' } else { c })
        .collect::<String>()
        .to_uppercase();
    let mut words: Vec<&str> = cleaned.split_whitespace().collect();

    if matches!(words.first(), Some(&"PROV") | Some(&"PROVINSI")) {
        words.remove(0);
    }

    let mut key = words.join(" ");
    if let Some(rest) = key.strip_prefix("KEP ") {
        key = format!("KEPULAUAN {rest}");
    }
    key
}

/// Map any known spelling onto its canonical region name.
pub fn canonical_region(raw: &str) -> Option<&'static str> {
    let key = lookup_key(raw);
    if key.is_empty() {
        return None;
    }
    LOOKUP.get(&key).copied()
}

/// True when `name` is exactly one of the canonical spellings.
pub fn is_canonical(name: &str) -> bool {
    REGIONS.iter().any(|(canonical, _)| *canonical == name)
}

/// The 38 provinces, national aggregate excluded.
pub fn provinces() -> impl Iterator<Item = &'static str> {
    REGIONS
        .iter()
        .map(|(canonical, _)| *canonical)
        .filter(|name| *name != NATIONAL)
}
