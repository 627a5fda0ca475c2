//! Sahayogi client configuration.
//!
//! TOML-based configuration for the backend origin, identity provider
//! project settings, and logging. All sections use sensible defaults so
//! partial configs work out of the box.

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{AuthConfig, BackendConfig, LoggingConfig, SahayogiConfig};
pub use toml_loader::{default_config_path, load_from_path};

use sahayogi_common::ConfigError;

/// Convenience function to load config from the platform default path.
///
/// Loads `config.toml` from the OS config directory, creates a default
/// if none exists, and validates the result.
pub fn load_config() -> Result<SahayogiConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SahayogiConfig::default();
        assert!(validation::validate(&config).is_ok());
    }
}
