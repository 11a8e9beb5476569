use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::registry::{SchemaCategory, default_version};
use crate::version::AsdfVersion;

/// Name of the config file looked up in the data directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CompatConfig {
    /// Standard version assumed when a document or command does not name one
    pub default_standard_version: AsdfVersion,
    pub categories: CategoriesConfig,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            default_standard_version: default_version(),
            categories: CategoriesConfig::default(),
        }
    }
}

/// Per-category support requirements
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CategoriesConfig {
    pub core: CategoryConfig,
    pub standard: CategoryConfig,
}

impl Default for CategoriesConfig {
    fn default() -> Self {
        Self {
            core: CategoryConfig {
                support: SupportLevel::Required,
            },
            standard: CategoryConfig {
                support: SupportLevel::BestEffort,
            },
        }
    }
}

impl CategoriesConfig {
    pub fn support(&self, category: SchemaCategory) -> SupportLevel {
        match category {
            SchemaCategory::Core => self.core.support,
            SchemaCategory::Standard => self.standard.support,
        }
    }
}

/// Individual category configuration
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct CategoryConfig {
    pub support: SupportLevel,
}

/// Whether integrity faults in a category fail validation
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SupportLevel {
    /// Every tag must have a loadable schema and an exact handler
    Required,
    /// Faults are reported but tolerated
    BestEffort,
}

impl SupportLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportLevel::Required => "required",
            SupportLevel::BestEffort => "best-effort",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CompatConfig {
    /// Read a JSON config file; missing fields take their defaults
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read `path` if given, else the config in the data directory if it
    /// exists, else the defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_path(path),
            None => {
                let path = config_path();
                if path.is_file() {
                    Self::from_path(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Returns the path to the data directory for asdf-compat.
/// Uses $XDG_DATA_HOME/asdf-compat if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/asdf-compat,
/// or ./asdf-compat if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the default config file.
pub fn config_path() -> PathBuf {
    data_dir().join(CONFIG_FILE_NAME)
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("asdf-compat.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("asdf-compat")
}
