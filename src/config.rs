//! Optional TOML configuration
//!
//! Looked up at `--config`, then `$RENTBOOK_CONFIG`, then
//! `~/.rentbook/config.toml`. A missing default file means defaults; a
//! missing explicit file is an error.
//!
//! ```toml
//! database = "/srv/books/rentals.db"
//! currency_symbol = "€"
//!
//! [[tax_brackets]]
//! lower = "0"
//! upper = "10000"
//! rate = "0.10"
//!
//! [[tax_brackets]]
//! lower = "10000"
//! rate = "0.20"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::tax::{validate_brackets, TaxBracket};
use crate::utils::DEFAULT_CURRENCY_SYMBOL;

pub const CONFIG_ENV_VAR: &str = "RENTBOOK_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Ledger location; defaults to ~/.rentbook/data.db
    pub database: Option<PathBuf>,
    pub currency_symbol: Option<String>,
    /// Brackets used by tax commands when none are given explicitly
    pub tax_brackets: Vec<TaxBracket>,
}

/// File holding only a bracket table (`tax report --brackets`)
#[derive(Debug, Deserialize)]
struct BracketsFile {
    tax_brackets: Vec<TaxBracket>,
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Invalid configuration")?;
        validate_brackets(&config.tax_brackets).context("Invalid tax_brackets in configuration")?;
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        std::env::var_os("HOME").map(|home| {
            PathBuf::from(home)
                .join(".rentbook")
                .join("config.toml")
        })
    }

    /// Load from `explicit` (must exist) or the default location (optional)
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (path, required) = match explicit {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, std::env::var_os(CONFIG_ENV_VAR).is_some()),
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            if required {
                anyhow::bail!("Configuration file not found: {:?}", path);
            }
            debug!("No configuration at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        debug!("Loading configuration from {:?}", path);
        let content = std::fs::read_to_string(&path)
            .context(format!("Failed to read configuration {:?}", path))?;
        Self::from_toml_str(&content).context(format!("Failed to load {:?}", path))
    }

    pub fn currency_symbol(&self) -> &str {
        self.currency_symbol
            .as_deref()
            .unwrap_or(DEFAULT_CURRENCY_SYMBOL)
    }
}

/// Read a bracket table from a TOML file with `[[tax_brackets]]` entries
pub fn load_brackets_file(path: &Path) -> Result<Vec<TaxBracket>> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read brackets file {:?}", path))?;
    let file: BracketsFile =
        toml::from_str(&content).context(format!("Invalid brackets file {:?}", path))?;
    validate_brackets(&file.tax_brackets).context(format!("Invalid brackets in {:?}", path))?;
    Ok(file.tax_brackets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
currency_symbol = "€"

[[tax_brackets]]
lower = "0"
upper = "10000"
rate = "0.10"

[[tax_brackets]]
lower = "10000"
rate = "0.20"
"#;

    #[test]
    fn test_parse_config() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.currency_symbol(), "€");
        assert_eq!(config.database, None);
        assert_eq!(
            config.tax_brackets,
            vec![
                TaxBracket::new(dec!(0), Some(dec!(10000)), dec!(0.10)),
                TaxBracket::new(dec!(10000), None, dec!(0.20)),
            ]
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.currency_symbol(), "$");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(Config::from_toml_str("unknown_key = 1").is_err());

        let overlapping = r#"
[[tax_brackets]]
lower = "0"
upper = "100"
rate = "0.1"

[[tax_brackets]]
lower = "50"
rate = "0.2"
"#;
        assert!(Config::from_toml_str(overlapping).is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_brackets_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("brackets.toml");
        std::fs::write(&path, SAMPLE).unwrap_or_else(|e| panic!("write failed: {}", e));

        // currency_symbol is ignored in a brackets-only file
        let brackets = load_brackets_file(&path).unwrap();
        assert_eq!(brackets.len(), 2);
        assert_eq!(brackets[1].rate, dec!(0.20));
    }
}
