//! Configuration schema types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level Sahayogi client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SahayogiConfig {
    pub backend: BackendConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Tutoring backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Origin of the Sahayogi API (no trailing slash).
    pub base_url: String,
    /// Per-request timeout for tutor and assist calls.
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            request_timeout_secs: 30,
        }
    }
}

/// Identity provider (Supabase Auth) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Supabase project URL, e.g. `https://abcdefgh.supabase.co`.
    pub project_url: String,
    /// Publishable anon key sent as the `apikey` header.
    pub anon_key: String,
    /// Refresh the access token automatically before it expires.
    pub auto_refresh: bool,
    /// How long before expiry the refresh fires.
    pub refresh_margin_secs: u64,
    /// Where the recovered session is persisted between runs.
    /// Defaults to `session.json` next to the config file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_file: Option<PathBuf>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            project_url: String::new(),
            anon_key: String::new(),
            auto_refresh: true,
            refresh_margin_secs: 60,
            session_file: None,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Tracing env-filter directive, e.g. `info` or `sahayogi_tutor=debug`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
        }
    }
}
