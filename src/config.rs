use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CuratorConfig {
    /// Free-form label for the loaded profile.
    pub profile_name: String,
    pub dataset: DatasetRules,
    pub filter: FilterRules,
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self {
            profile_name: "base".to_string(),
            dataset: DatasetRules::default(),
            filter: FilterRules::default(),
        }
    }
}

/// How the dataset directory is laid out on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetRules {
    /// Separator between tags inside the caption file.
    pub tag_separator: String,
    /// Extension of the sidecar caption file, without the dot.
    pub caption_extension: String,
    /// Extension of the optional sidecar metadata file (stars, markings).
    pub metadata_extension: String,
    /// File extensions treated as images, lowercase, without the dot.
    pub image_extensions: Vec<String>,
    /// Whether to descend into subdirectories.
    pub recursive: bool,
}

impl Default for DatasetRules {
    fn default() -> Self {
        Self {
            tag_separator: ",".to_string(),
            caption_extension: "txt".to_string(),
            metadata_extension: "json".to_string(),
            image_extensions: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
                "bmp".to_string(),
            ],
            recursive: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FilterRules {
    /// Whether `tag:` tests distinguish case.
    pub case_sensitive_tags: bool,
}

pub fn load_config(path: Option<&Path>) -> Result<CuratorConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<CuratorConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    toml::from_str::<CuratorConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })
}

pub fn default_config() -> &'static CuratorConfig {
    static DEFAULT_CONFIG: LazyLock<CuratorConfig> = LazyLock::new(CuratorConfig::default);
    &DEFAULT_CONFIG
}
