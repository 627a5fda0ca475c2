use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("auth request failed: HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    #[error("auth network error: {0}")]
    Network(String),

    #[error("auth response parse error: {0}")]
    Parse(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("session expired")]
    SessionExpired,

    #[error("session storage error: {0}")]
    Storage(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    #[error("tutor network error: {0}")]
    Network(String),

    #[error("tutor request failed: HTTP {status}")]
    Api { status: u16 },

    #[error("tutor request unauthorized")]
    Unauthorized,

    #[error("tutor response parse error: {0}")]
    Parse(String),

    #[error("tutor request timed out")]
    Timeout,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SahayogiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Tutor(#[from] TutorError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_display() {
        let err = AuthError::Http {
            status: 400,
            detail: "invalid grant".into(),
        };
        assert_eq!(err.to_string(), "auth request failed: HTTP 400: invalid grant");

        let err = AuthError::InvalidCredentials;
        assert_eq!(err.to_string(), "invalid email or password");

        let err = AuthError::Storage("permission denied".into());
        assert_eq!(err.to_string(), "session storage error: permission denied");
    }

    #[test]
    fn tutor_error_display() {
        let err = TutorError::Api { status: 503 };
        assert_eq!(err.to_string(), "tutor request failed: HTTP 503");

        let err = TutorError::Timeout;
        assert_eq!(err.to_string(), "tutor request timed out");

        let err = TutorError::Parse("missing field `response`".into());
        assert_eq!(
            err.to_string(),
            "tutor response parse error: missing field `response`"
        );
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ValidationError("backend.base_url is empty".into());
        assert_eq!(
            err.to_string(),
            "config validation error: backend.base_url is empty"
        );
    }

    #[test]
    fn sahayogi_error_from_auth() {
        let auth_err = AuthError::SessionExpired;
        let err: SahayogiError = auth_err.into();
        assert!(matches!(err, SahayogiError::Auth(_)));
        assert_eq!(err.to_string(), "session expired");
    }

    #[test]
    fn sahayogi_error_from_tutor() {
        let tutor_err = TutorError::Unauthorized;
        let err: SahayogiError = tutor_err.into();
        assert!(matches!(err, SahayogiError::Tutor(_)));
        assert!(err.to_string().contains("unauthorized"));
    }

    #[test]
    fn sahayogi_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let err: SahayogiError = config_err.into();
        assert!(matches!(err, SahayogiError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }
}
