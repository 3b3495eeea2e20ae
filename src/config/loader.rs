// Settings loader
//
// Looks for config.toml in, by precedence: an explicit --config path, the
// workspace's .penwright/ directory, then ~/.penwright/. Environment
// variables override individual fields afterwards.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::constants::APP_DIR;
use super::settings::Settings;

pub const WORKSPACE_ENV: &str = "PENWRIGHT_WORKSPACE";
pub const BIND_ENV: &str = "PENWRIGHT_BIND";

const CONFIG_FILE: &str = "config.toml";

/// Everything the loader reads from the outside world.
#[derive(Debug, Clone, Default)]
pub struct SettingsSources {
    pub explicit: Option<PathBuf>,
    pub current_dir: Option<PathBuf>,
    pub home_dir: Option<PathBuf>,
    pub workspace_env: Option<String>,
    pub bind_env: Option<String>,
}

impl SettingsSources {
    pub fn from_env(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            current_dir: std::env::current_dir().ok(),
            home_dir: dirs::home_dir(),
            workspace_env: std::env::var(WORKSPACE_ENV).ok().filter(|v| !v.is_empty()),
            bind_env: std::env::var(BIND_ENV).ok().filter(|v| !v.is_empty()),
        }
    }
}

/// Load settings for this process.
pub fn load_settings(explicit: Option<PathBuf>) -> Result<Settings> {
    load_settings_from(&SettingsSources::from_env(explicit))
}

pub fn load_settings_from(sources: &SettingsSources) -> Result<Settings> {
    let workspace = sources
        .workspace_env
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| sources.current_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut settings = if let Some(path) = &sources.explicit {
        if !path.exists() {
            bail!("Config file not found: {}", path.display());
        }
        read_settings(path)?
    } else if let Some(settings) = try_read(&workspace.join(APP_DIR).join(CONFIG_FILE))? {
        // A workspace config always refers to its own workspace
        Settings {
            workspace: workspace.clone(),
            ..settings
        }
    } else if let Some(settings) = sources
        .home_dir
        .as_ref()
        .map(|home| home.join(APP_DIR).join(CONFIG_FILE))
        .map(|path| try_read(&path))
        .transpose()?
        .flatten()
    {
        settings
    } else {
        tracing::debug!("No config file found, using defaults");
        Settings {
            workspace: workspace.clone(),
            ..Settings::default()
        }
    };

    if let Some(ws) = &sources.workspace_env {
        settings.workspace = PathBuf::from(ws);
    }
    if let Some(bind) = &sources.bind_env {
        settings.server.bind_address = bind.clone();
    }
    Ok(settings)
}

fn try_read(path: &Path) -> Result<Option<Settings>> {
    if !path.exists() {
        return Ok(None);
    }
    read_settings(path).map(Some)
}

fn read_settings(path: &Path) -> Result<Settings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let settings = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config TOML at {}", path.display()))?;
    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}
