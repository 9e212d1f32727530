use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use iddict_sqlite::{CollectionNames, SqliteConfig};

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "iddict.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub database: SqliteConfig,
    pub collections: CollectionNames,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
        }
    }
}

impl CliConfig {
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            anyhow::bail!("database.url must not be empty");
        }
        self.collections
            .validate()
            .context("invalid collection name")?;
        Ok(())
    }
}

/// Loads the configuration file (if any) and applies `IDDICT__...` overrides,
/// e.g. `IDDICT__DATABASE__URL=sqlite://other.db`.
///
/// An explicitly given path must exist; the default file is optional.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    use config::{Config, Environment, File};

    let mut builder = Config::builder();
    match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("configuration file {} does not exist", path.display());
            }
            builder = builder.add_source(File::from(path.to_path_buf()));
        }
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                builder = builder.add_source(File::from(default_path));
            }
        }
    }
    builder = builder.add_source(
        Environment::with_prefix("IDDICT")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let merged: CliConfig = builder
        .build()
        .context("failed to read configuration")?
        .try_deserialize()
        .context("failed to parse configuration")?;
    merged.validate()?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = CliConfig::default();
        assert_eq!(config.database.url, "sqlite://iddict.db");
        assert_eq!(config.collections.tokens, "openiddict_tokens");
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("iddict.toml");
        fs::write(
            &path,
            r#"
[database]
url = "sqlite://auth.db"
pool_size = 8

[collections]
tokens = "tenant_tokens"

[logging]
level = "debug"
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.database.url, "sqlite://auth.db");
        assert_eq!(config.database.pool_size, 8);
        assert_eq!(config.database.busy_timeout_ms, 5000);
        assert_eq!(config.collections.tokens, "tenant_tokens");
        assert_eq!(config.collections.scopes, "openiddict_scopes");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_collection_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("iddict.toml");
        fs::write(&path, "[collections]\nscopes = \"scopes; drop\"\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("invalid collection name"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
