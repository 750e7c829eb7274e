use crate::constants::{CONFIG_DIR, CONFIG_FILE};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// the one active model configuration; saving replaces it wholesale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ModelConfig {
    /// openai-compatible endpoint with a static api token
    Token {
        model_name: String,
        endpoint: String,
        token: String,
    },
    /// databricks serving endpoint, authenticated through the browser login cache
    #[serde(alias = "databricks")]
    BrowserAccount { model_name: String, account: String },
}

impl ModelConfig {
    pub fn model_name(&self) -> &str {
        match self {
            Self::Token { model_name, .. } | Self::BrowserAccount { model_name, .. } => model_name,
        }
    }
}

/// `~/.config/diffweave/config.yaml`
pub fn default_path() -> anyhow::Result<PathBuf> {
    use anyhow::Context;
    let home = dirs::home_dir().context("failed to determine home directory")?;
    Ok(home.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// read the active configuration; a missing or empty file means not configured
pub fn load(path: &Path) -> Result<ModelConfig> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(Error::NotConfigured),
        Err(e) => return Err(e.into()),
    };

    if content.trim().is_empty() {
        return Err(Error::NotConfigured);
    }

    serde_yaml::from_str(&content).map_err(|source| Error::Config {
        path: path.to_path_buf(),
        source,
    })
}

/// overwrite the configuration file with `config`
pub fn save(path: &Path, config: &ModelConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(config).map_err(|source| Error::Config {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, yaml)?;
    Ok(())
}
