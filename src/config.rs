use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("project-index")
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ApiConfig {
    /// Static key attached to write-style calls (`apikey` header).
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_recent_display_count")]
    pub recent_display_count: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            recent_display_count: default_recent_display_count(),
        }
    }
}

fn default_recent_display_count() -> usize {
    5
}

impl Config {
    /// Path of the key-value store file (preference + recency list).
    pub fn store_path(&self) -> PathBuf {
        self.storage.data_dir.join("store.json")
    }

    /// Path of the well-known endpoint artifact.
    pub fn endpoint_path(&self) -> PathBuf {
        self.storage.data_dir.join(crate::endpoint::ENDPOINT_FILE)
    }
}

/// Default per-user config file location.
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

/// Load configuration.
///
/// An explicitly given path must exist and parse. Without one, the default
/// per-user file is used when present and built-in defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (default_config_path(), false),
    };

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) if !required => return Ok(Config::default()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("Failed to read config file: {}", path.display()))
        }
    };

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.search.recent_display_count == 0 {
        anyhow::bail!("search.recent_display_count must be >= 1");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_default_config_yields_defaults() {
        let config = Config::default();
        assert_eq!(config.search.recent_display_count, 5);
        assert!(config.api.key.is_none());
    }

    #[test]
    fn explicit_config_parses_sections() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[storage]
data_dir = "/tmp/pix-test"

[api]
key = "service-key"

[search]
recent_display_count = 3
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/pix-test"));
        assert_eq!(config.api.key.as_deref(), Some("service-key"));
        assert_eq!(config.search.recent_display_count, 3);
        assert_eq!(config.store_path(), PathBuf::from("/tmp/pix-test/store.json"));
    }

    #[test]
    fn zero_display_count_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[search]\nrecent_display_count = 0\n").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn explicit_missing_path_errors() {
        assert!(load_config(Some(Path::new("/nonexistent/pix.toml"))).is_err());
    }
}
