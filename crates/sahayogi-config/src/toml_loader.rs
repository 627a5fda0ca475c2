//! TOML config file loading and creation.

use std::path::{Path, PathBuf};

use sahayogi_common::ConfigError;
use tracing::info;

use crate::schema::SahayogiConfig;

/// Load config from a specific TOML file path.
///
/// Missing fields fall back to serde defaults, so a partial config
/// is enough to get started.
pub fn load_from_path(path: &Path) -> Result<SahayogiConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let config: SahayogiConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform-specific default path.
///
/// On macOS: `~/Library/Application Support/sahayogi/config.toml`
/// On Linux: `~/.config/sahayogi/config.toml`
///
/// If the file does not exist, creates a default config file and returns defaults.
pub fn load_default() -> Result<SahayogiConfig, ConfigError> {
    let path = default_config_path()?;

    if !path.exists() {
        info!("no config found at {}, creating default", path.display());
        create_default_config(&path)?;
        return Ok(SahayogiConfig::default());
    }

    load_from_path(&path)
}

/// Get the platform-specific default config file path.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?;
    Ok(config_dir.join("sahayogi").join("config.toml"))
}

/// Create a default TOML config file with documentation comments.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::ParseError(format!(
                "failed to create config directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    std::fs::write(path, default_config_toml()).map_err(|e| {
        ConfigError::ParseError(format!(
            "failed to write default config to {}: {e}",
            path.display()
        ))
    })?;

    info!("created default config at {}", path.display());
    Ok(())
}

/// Generate the default TOML config content with comments.
fn default_config_toml() -> String {
    r##"# Sahayogi client configuration

[backend]
# Origin of the Sahayogi API (no trailing slash).
base_url = "http://localhost:8000"
# Per-request timeout for tutor and assist calls, in seconds.
request_timeout_secs = 30

[auth]
# Supabase project URL, e.g. "https://abcdefgh.supabase.co".
project_url = ""
# Publishable anon key for the project.
anon_key = ""
# Refresh the access token automatically before it expires.
auto_refresh = true
# How long before expiry the refresh fires, in seconds.
refresh_margin_secs = 60

[logging]
# Tracing filter directive, e.g. "info" or "sahayogi_tutor=debug".
filter = "info"
"##
    .to_string()
}
