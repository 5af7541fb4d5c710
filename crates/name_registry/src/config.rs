//! Deployment constants for the registry
//!
//! Loaded once at startup from an optional TOML file and `NAME_REGISTRY_*`
//! environment overrides. The engine keeps its own copy and never mutates it.

use crate::errors::{RegistryError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix for overrides (`NAME_REGISTRY_REGISTRATION_FEE=...`)
pub const ENV_PREFIX: &str = "NAME_REGISTRY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Ticks a registration or renewal adds to the expiry
    pub registration_period: u64,
    /// Amount debited per registration and per renewal
    pub registration_fee: u64,
    pub min_name_len: usize,
    pub max_name_len: usize,
    pub max_record_key_len: usize,
    pub max_record_value_len: usize,
    /// Ticks after which an unrevealed preorder goes stale (0 = never)
    pub preorder_ttl: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            registration_period: 52_560, // ~1 year of 10 minute blocks
            registration_fee: 100_000,
            min_name_len: 3,
            max_name_len: 63,
            max_record_key_len: 64,
            max_record_value_len: 256,
            preorder_ttl: 4_320, // ~30 days
        }
    }
}

impl RegistryConfig {
    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: RegistryConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document; missing keys fall back to the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RegistryConfig = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.registration_period == 0 {
            return Err(RegistryError::InvalidConfig(
                "registration_period must be greater than zero".into(),
            ));
        }
        if self.min_name_len == 0 {
            return Err(RegistryError::InvalidConfig(
                "min_name_len must be at least 1".into(),
            ));
        }
        if self.min_name_len > self.max_name_len {
            return Err(RegistryError::InvalidConfig(format!(
                "min_name_len {} exceeds max_name_len {}",
                self.min_name_len, self.max_name_len
            )));
        }
        if self.max_name_len > u16::MAX as usize {
            return Err(RegistryError::InvalidConfig(format!(
                "max_name_len {} exceeds {}",
                self.max_name_len,
                u16::MAX
            )));
        }
        if self.max_record_key_len == 0 {
            return Err(RegistryError::InvalidConfig(
                "max_record_key_len must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Tick at which a preorder committed at `committed_at` goes stale.
    pub fn preorder_deadline(&self, committed_at: u64) -> Option<u64> {
        (self.preorder_ttl > 0).then(|| committed_at.saturating_add(self.preorder_ttl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = RegistryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.registration_period, 52_560);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = RegistryConfig::from_toml_str(
            r#"
            registration_fee = 250
            max_name_len = 32
            "#,
        )
        .unwrap();
        assert_eq!(config.registration_fee, 250);
        assert_eq!(config.max_name_len, 32);
        assert_eq!(config.min_name_len, 3);
    }

    #[test]
    fn inverted_name_bounds_are_rejected() {
        let err = RegistryConfig::from_toml_str("min_name_len = 10\nmax_name_len = 4").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn zero_period_is_rejected() {
        let config = RegistryConfig {
            registration_period: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "registration_period = 1000").unwrap();
        let config = RegistryConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.registration_period, 1000);
    }

    #[test]
    fn zero_ttl_disables_preorder_deadline() {
        let config = RegistryConfig {
            preorder_ttl: 0,
            ..Default::default()
        };
        assert_eq!(config.preorder_deadline(10), None);
        assert_eq!(RegistryConfig::default().preorder_deadline(10), Some(4_330));
    }
}
