//! Config validation.

use sahayogi_common::ConfigError;

use crate::schema::SahayogiConfig;

/// Validate a loaded config.
///
/// Checks the handful of values that would otherwise fail deep inside a
/// request: URL shape, timeout, and refresh margin. An unconfigured auth
/// section is allowed (the login gate reports it at sign-in time).
pub fn validate(config: &SahayogiConfig) -> Result<(), ConfigError> {
    if config.backend.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "backend.base_url is empty".into(),
        ));
    }
    if !is_http_url(&config.backend.base_url) {
        return Err(ConfigError::ValidationError(format!(
            "backend.base_url must start with http:// or https://: {}",
            config.backend.base_url
        )));
    }
    if config.backend.base_url.ends_with('/') {
        return Err(ConfigError::ValidationError(
            "backend.base_url must not end with a slash".into(),
        ));
    }
    if config.backend.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "backend.request_timeout_secs must be greater than zero".into(),
        ));
    }

    if !config.auth.project_url.is_empty() && !is_http_url(&config.auth.project_url) {
        return Err(ConfigError::ValidationError(format!(
            "auth.project_url must start with http:// or https://: {}",
            config.auth.project_url
        )));
    }
    if config.auth.auto_refresh && config.auth.refresh_margin_secs == 0 {
        return Err(ConfigError::ValidationError(
            "auth.refresh_margin_secs must be greater than zero when auto_refresh is on".into(),
        ));
    }

    Ok(())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes() {
        assert!(validate(&SahayogiConfig::default()).is_ok());
    }

    #[test]
    fn empty_base_url_fails() {
        let mut config = SahayogiConfig::default();
        config.backend.base_url = "  ".into();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn non_http_base_url_fails() {
        let mut config = SahayogiConfig::default();
        config.backend.base_url = "ftp://example.com".into();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn trailing_slash_fails() {
        let mut config = SahayogiConfig::default();
        config.backend.base_url = "http://localhost:8000/".into();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn zero_timeout_fails() {
        let mut config = SahayogiConfig::default();
        config.backend.request_timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn zero_refresh_margin_fails_only_with_auto_refresh() {
        let mut config = SahayogiConfig::default();
        config.auth.refresh_margin_secs = 0;
        assert!(validate(&config).is_err());

        config.auth.auto_refresh = false;
        assert!(validate(&config).is_ok());
    }
}
