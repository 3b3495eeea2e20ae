// Configuration module
// Public interface for settings loading

pub mod constants;
mod loader;
mod settings;

pub use loader::{load_settings, load_settings_from, SettingsSources, BIND_ENV, WORKSPACE_ENV};
pub use settings::{HttpConfig, ServerConfig, Settings};
