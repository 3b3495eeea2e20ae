// Runtime settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::constants::{
    APP_DIR, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_HTTP_ADDR, DEFAULT_REQUEST_TIMEOUT_SECS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory whose `.penwright/` holds the store and logs
    pub workspace: PathBuf,

    pub server: ServerConfig,

    pub http: HttpConfig,

    /// Append every agent call to `.penwright/logs/prompts.jsonl`
    pub prompt_log: bool,
}

/// HTTP surface configuration for `penwright serve`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3000")
    pub bind_address: String,
}

/// Outbound HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from("."),
            server: ServerConfig::default(),
            http: HttpConfig::default(),
            prompt_log: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_HTTP_ADDR.to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    pub fn app_dir(&self) -> PathBuf {
        self.workspace.join(APP_DIR)
    }

    pub fn store_dir(&self) -> PathBuf {
        self.app_dir().join("store")
    }

    pub fn prompt_log_path(&self) -> PathBuf {
        self.app_dir().join("logs").join("prompts.jsonl")
    }

    /// Write these settings as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let toml_string = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!("Settings saved to {:?}", path);
        Ok(())
    }
}
