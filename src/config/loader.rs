// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::backends::local::LocalProcessFactory;
use crate::config::consts::{
    DEFAULT_CHUNK_SIZE, DEFAULT_DATABASE_PATH, DEFAULT_LOG_LEVEL, DEFAULT_MANAGED_DIR,
    DEFAULT_MAX_CONNECTIONS, MAX_CHUNK_SIZE,
};
use crate::errors::ConfigError;

/// Application configuration.
///
/// Every section is optional; an empty file yields the defaults.
///
/// # Example
/// ```yaml
/// database:
///   path: data/database.sqlite3
/// storage:
///   managed_dir: data/client_files
///   chunk_size: 65536
/// logging:
///   level: debug
///   json: false
/// processes:
///   enabled: [file_system_integration, extract_file_metadata]
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub processes: ProcessSelection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE_PATH),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

/// Managed file storage used by the ingestion process.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub managed_dir: PathBuf,
    /// Bytes read per chunk while hashing
    pub chunk_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            managed_dir: PathBuf::from(DEFAULT_MANAGED_DIR),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive; `RUST_LOG` overrides it
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json: false,
        }
    }
}

/// Which built-in processes to register. Empty means all of them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProcessSelection {
    pub enabled: Vec<String>,
}

impl ProcessSelection {
    pub fn includes(&self, uid: &str) -> bool {
        self.enabled.is_empty() || self.enabled.iter().any(|e| e == uid)
    }
}

impl Config {
    /// Range checks plus a lookup of every enabled process in the catalog.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.max_connections",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.storage.chunk_size == 0 || self.storage.chunk_size > MAX_CHUNK_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "storage.chunk_size",
                reason: format!("must be between 1 and {}", MAX_CHUNK_SIZE),
            });
        }
        if let Some(unknown) = self
            .processes
            .enabled
            .iter()
            .find(|uid| !LocalProcessFactory::is_implementation_available(uid))
        {
            return Err(ConfigError::UnknownProcess {
                uid: unknown.clone(),
            });
        }
        Ok(())
    }
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    // serde_yaml rejects an empty document for a struct
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = serde_yaml::from_str(&content)?;
    Ok(cfg)
}

/// Load a config from a YAML file and check its values.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
database:
  path: /var/lib/tagsense/db.sqlite3
  max_connections: 2
storage:
  managed_dir: /var/lib/tagsense/files
  chunk_size: 4096
logging:
  level: debug
  json: true
processes:
  enabled: [file_system_integration]
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.database.path, PathBuf::from("/var/lib/tagsense/db.sqlite3"));
        assert_eq!(cfg.database.max_connections, 2);
        assert_eq!(cfg.storage.chunk_size, 4096);
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.logging.json);
        assert!(cfg.processes.includes("file_system_integration"));
        assert!(!cfg.processes.includes("extract_file_metadata"));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let cfg: Config = serde_yaml::from_str("logging:\n  level: warn\n").unwrap();
        assert_eq!(cfg.database.path, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(cfg.database.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(cfg.storage.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(cfg.logging.level, "warn");
        assert!(cfg.processes.includes("anything"));
    }

    #[test]
    fn test_load_empty_file_gives_defaults() {
        let file = write_config("");
        let cfg = load_and_validate_config(file.path()).unwrap();
        assert_eq!(cfg.storage.managed_dir, PathBuf::from(DEFAULT_MANAGED_DIR));
    }

    #[test]
    fn test_load_and_validate_rejects_bad_values() {
        let cases = vec![
            "database:\n  max_connections: 0\n",
            "storage:\n  chunk_size: 0\n",
            "storage:\n  chunk_size: 999999999\n",
        ];

        for yaml in cases {
            let file = write_config(yaml);
            let result = load_and_validate_config(file.path());
            assert!(
                matches!(result, Err(ConfigError::InvalidValue { .. })),
                "expected InvalidValue for {yaml:?}"
            );
        }
    }

    #[test]
    fn test_load_and_validate_rejects_unknown_process() {
        let file = write_config("processes:\n  enabled: [file_system_integration, summon_llm]\n");
        let result = load_and_validate_config(file.path());
        assert!(matches!(result, Err(ConfigError::UnknownProcess { uid }) if uid == "summon_llm"));
    }

    #[test]
    fn test_malformed_yaml_is_a_parse_error() {
        let file = write_config("database: [unclosed\n");
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_config("/definitely/not/here.yaml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
