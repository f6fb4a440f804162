//! Static currency reference data.
//!
//! Currencies created by the reassigner are seeded from this table. A copy is
//! embedded in the binary; a project may ship its own
//! `config/currencies.json` which then replaces it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Embedded reference table.
const EMBEDDED_CURRENCIES: &str = include_str!("../data/currencies.json");

/// Project-relative location of an overriding reference table.
pub const PROJECT_CURRENCY_FILE: &str = "config/currencies.json";

/// One entry of the reference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyInfo {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub symbol_native: Option<String>,
    pub decimal_digits: u8,
    #[serde(default)]
    pub rounding: f64,
    /// Short code stored as the translation's short name.
    pub code: String,
    #[serde(default)]
    pub name_plural: Option<String>,
}

/// Reference data keyed by uppercase ISO code.
#[derive(Debug, Clone, Default)]
pub struct CurrencyReference {
    entries: BTreeMap<String, CurrencyInfo>,
}

impl CurrencyReference {
    /// The table compiled into the binary.
    pub fn embedded() -> Result<Self, CoreError> {
        Self::from_json(EMBEDDED_CURRENCIES)
    }

    /// Parse a JSON object of `ISO -> entry`. Keys are uppercased.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let raw: BTreeMap<String, CurrencyInfo> = serde_json::from_str(json)
            .map_err(|e| CoreError::Configuration(format!("invalid currency data: {e}")))?;

        let entries = raw
            .into_iter()
            .map(|(iso, info)| (iso.to_uppercase(), info))
            .collect();

        Ok(Self { entries })
    }

    /// Load from a file on disk.
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Resolve the table for a project.
    ///
    /// An explicit file wins, then `<project>/config/currencies.json`, then
    /// the embedded table.
    pub fn for_project(project_dir: &Path, explicit: Option<&Path>) -> Result<Self, CoreError> {
        if let Some(path) = explicit {
            tracing::debug!(path = %path.display(), "Loading currency data file");
            return Self::from_file(path);
        }

        let project_file = project_dir.join(PROJECT_CURRENCY_FILE);
        if project_file.is_file() {
            tracing::debug!(path = %project_file.display(), "Loading project currency data");
            return Self::from_file(&project_file);
        }

        Self::embedded()
    }

    /// Look up an entry by ISO code (any case).
    pub fn get(&self, iso: &str) -> Option<&CurrencyInfo> {
        self.entries.get(&iso.to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ISO order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CurrencyInfo)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn embedded_table_parses() {
        let reference = CurrencyReference::embedded().unwrap();
        assert!(reference.len() > 10);

        let eur = reference.get("EUR").unwrap();
        assert_eq!(eur.symbol, "€");
        assert_eq!(eur.decimal_digits, 2);
        assert_eq!(eur.code, "EUR");
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let reference = CurrencyReference::embedded().unwrap();
        assert_eq!(reference.get("usd"), reference.get("USD"));
        assert!(reference.get("usd").is_some());
    }

    #[test]
    fn keys_are_uppercased_on_load() {
        let reference = CurrencyReference::from_json(
            r#"{"xts": {"symbol": "T", "name": "Test", "decimal_digits": 3, "code": "XTS"}}"#,
        )
        .unwrap();
        assert_eq!(reference.iter().next().unwrap().0, "XTS");
        assert_eq!(reference.get("XTS").unwrap().decimal_digits, 3);
    }

    #[test]
    fn invalid_json_is_a_configuration_error() {
        assert_matches!(
            CurrencyReference::from_json("[1, 2]"),
            Err(CoreError::Configuration(_))
        );
    }

    #[test]
    fn project_file_overrides_embedded_table() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("config")).unwrap();
        std::fs::write(
            dir.path().join(PROJECT_CURRENCY_FILE),
            r#"{"XTS": {"symbol": "T", "name": "Test", "decimal_digits": 0, "code": "XTS"}}"#,
        )
        .unwrap();

        let reference = CurrencyReference::for_project(dir.path(), None).unwrap();
        assert_eq!(reference.len(), 1);
        assert!(reference.get("EUR").is_none());
    }

    #[test]
    fn missing_project_file_falls_back_to_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let reference = CurrencyReference::for_project(dir.path(), None).unwrap();
        assert!(reference.get("EUR").is_some());
    }
}
