#![forbid(unsafe_code)]

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("adv-browse")
}

fn default_user_id() -> String {
    "local".to_string()
}

fn default_pages() -> u64 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `advisors.db`.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Owner of favorite lists and reports.
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Pages fetched by `browse` when `--pages` is not given.
    #[serde(default = "default_pages")]
    pub pages: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            user_id: default_user_id(),
            pages: default_pages(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.storage_dir.join("config.toml")
    }
}
