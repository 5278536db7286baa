//! Configuration schema for pkgstore
//!
//! Configuration is stored at `~/.config/pkgstore/config.toml`

use crate::archive::validate_relative_path;
use crate::package::TargetId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Directory under the cache root holding scratch clones
pub const CLONES_DIR: &str = "git-clones";
/// Directory under the cache root holding archives being built
pub const ARCHIVES_TEMP_DIR: &str = "archives-temp";
/// Directory under the cache root holding published archives
pub const ARCHIVES_DIR: &str = "archives";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Source repository mirror settings
    pub repository: RepositoryConfig,

    /// Archive cache settings
    pub cache: CacheConfig,

    /// Declared packages and their locations
    pub packages: Vec<PackageConfig>,
}

impl Config {
    /// Check invariants serde cannot express.
    ///
    /// Returns a human-readable reason on failure; callers attach the file path.
    pub fn validate(&self) -> Result<(), String> {
        let mut ids = HashSet::new();
        for package in &self.packages {
            TargetId::parse(&package.id).map_err(|e| e.to_string())?;
            if !ids.insert(package.id.as_str()) {
                return Err(format!("duplicate package id '{}'", package.id));
            }

            let mut names = HashSet::new();
            for location in &package.locations {
                if location.name.is_empty() || location.name.contains('/') {
                    return Err(format!(
                        "package '{}': invalid location name '{}'",
                        package.id, location.name
                    ));
                }
                if !names.insert(location.name.as_str()) {
                    return Err(format!(
                        "package '{}': duplicate location '{}'",
                        package.id, location.name
                    ));
                }
                validate_relative_path(&location.path).map_err(|e| {
                    format!("package '{}', location '{}': {}", package.id, location.name, e)
                })?;
            }
        }
        Ok(())
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Bare mirror of the source repository
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Path of the bare git mirror
    pub mirror_path: PathBuf,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            mirror_path: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("pkgstore")
                .join("mirror.git"),
        }
    }
}

/// Archive cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Parent of the `git-clones/`, `archives-temp/` and `archives/` trees
    pub root: PathBuf,
}

impl CacheConfig {
    /// Scratch clones of the mirror
    pub fn clones_dir(&self) -> PathBuf {
        self.root.join(CLONES_DIR)
    }

    /// Archives under construction
    pub fn archives_temp_dir(&self) -> PathBuf {
        self.root.join(ARCHIVES_TEMP_DIR)
    }

    /// Published, content-addressed archives
    pub fn archives_dir(&self) -> PathBuf {
        self.root.join(ARCHIVES_DIR)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("pkgstore"),
        }
    }
}

/// A declared package target
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageConfig {
    /// Slash-separated package id, e.g. `problems/sum`
    pub id: String,

    /// Declared locations, in search order
    #[serde(default)]
    pub locations: Vec<LocationConfig>,
}

/// A declared package location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocationConfig {
    /// Location name; `default` is the main one
    pub name: String,

    /// Subdirectory of the repository holding this location's content
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[repository]"));
        assert!(toml.contains("[cache]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.general.log_format, "text");
        assert!(config.packages.is_empty());
    }

    #[test]
    fn config_deserializes_packages() {
        let toml = r#"
            [cache]
            root = "/tmp/pkgstore"

            [[packages]]
            id = "problems/sum"

            [[packages.locations]]
            name = "statement"
            path = "problems/sum/statement"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cache.archives_dir(), PathBuf::from("/tmp/pkgstore/archives"));
        let package = &config.packages[0];
        assert_eq!(package.id, "problems/sum");
        assert_eq!(package.locations.len(), 1);
        assert_eq!(package.locations[0].path, "problems/sum/statement");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_locations() {
        let mut config = Config::default();
        config.packages.push(PackageConfig {
            id: "a".to_string(),
            locations: vec![
                LocationConfig {
                    name: "x".to_string(),
                    path: "a/x".to_string(),
                },
                LocationConfig {
                    name: "x".to_string(),
                    path: "a/y".to_string(),
                },
            ],
        });
        let reason = config.validate().unwrap_err();
        assert!(reason.contains("duplicate location"));
    }

    #[test]
    fn validate_rejects_escaping_paths() {
        let mut config = Config::default();
        config.packages.push(PackageConfig {
            id: "a".to_string(),
            locations: vec![LocationConfig {
                name: "x".to_string(),
                path: "../outside".to_string(),
            }],
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_packages() {
        let mut config = Config::default();
        for _ in 0..2 {
            config.packages.push(PackageConfig {
                id: "a".to_string(),
                locations: vec![],
            });
        }
        assert!(config.validate().unwrap_err().contains("duplicate package"));
    }
}
