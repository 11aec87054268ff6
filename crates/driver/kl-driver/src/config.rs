//! Lowering configuration files

use anyhow::{Context as _, Result};
use kl_lower::{DEFAULT_SEPARATOR, NameMangler};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File name looked up by [`LowerConfig::find_in_dir`]
pub const CONFIG_FILE_NAME: &str = "kiln.toml";

/// Options for one lowering run; every field is optional in the file
///
/// The lowered module is always verified, so there is no switch for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LowerConfig {
    /// Identifier of the produced module
    pub module_name: String,

    /// Separator placed between namespace names in linkage names
    pub mangle_separator: String,
}

impl Default for LowerConfig {
    fn default() -> Self {
        Self {
            module_name: "main".to_string(),
            mangle_separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl LowerConfig {
    /// Parses configuration from TOML text
    ///
    /// # Errors
    /// Fails on malformed TOML, wrong value types or unknown keys.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse lowering configuration")
    }

    /// Loads configuration from a TOML file
    ///
    /// # Errors
    /// Fails when the file cannot be read or parsed; the message names the
    /// path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Loads `kiln.toml` from `dir`, falling back to defaults when it is absent
    ///
    /// # Errors
    /// Fails when the file exists but cannot be read or parsed.
    pub fn find_in_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            log::debug!("no {CONFIG_FILE_NAME} in {}, using defaults", dir.display());
            Ok(Self::default())
        }
    }

    /// Mangler using the configured separator
    pub fn mangler(&self) -> NameMangler {
        NameMangler::new(self.mangle_separator.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = LowerConfig::from_toml_str("").unwrap();
        assert_eq!(config, LowerConfig::default());
        assert_eq!(config.module_name, "main");
        assert_eq!(config.mangle_separator, "__");
    }

    #[test]
    fn test_partial_file() {
        let config = LowerConfig::from_toml_str("module_name = \"app\"\n").unwrap();
        assert_eq!(config.module_name, "app");
        assert_eq!(config.mangle_separator, DEFAULT_SEPARATOR);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(LowerConfig::from_toml_str("optimize = true").is_err());
        assert!(LowerConfig::from_toml_str("verify_module = false").is_err());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            LowerConfig::find_in_dir(dir.path()).unwrap(),
            LowerConfig::default()
        );

        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "mangle_separator = \"$\"\n",
        )
        .unwrap();
        let config = LowerConfig::find_in_dir(dir.path()).unwrap();
        assert_eq!(config.mangle_separator, "$");
    }

    #[test]
    fn test_load_reports_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = LowerConfig::load(&missing).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }
}
