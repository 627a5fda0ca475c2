//! Supabase Auth (GoTrue) HTTP client.
//!
//! Implements `IdentityProvider` against a Supabase project's auth
//! endpoints. Sessions are persisted to a JSON file between runs so
//! `current_session` can recover a login without prompting again.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use sahayogi_common::AuthError;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::provider::IdentityProvider;
use crate::session::{unix_now, Session};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// GoTrue client configuration.
#[derive(Clone)]
pub struct GotrueConfig {
    /// Supabase project URL, e.g. `https://abcdefgh.supabase.co`.
    pub project_url: String,
    /// Publishable anon key, sent as the `apikey` header.
    pub anon_key: String,
    /// Where to persist the session between runs. `None` disables
    /// persistence (and `current_session` always resolves to nothing).
    pub session_file: Option<PathBuf>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for GotrueConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GotrueConfig")
            .field("project_url", &self.project_url)
            .field("anon_key", &"[REDACTED]")
            .field("session_file", &self.session_file)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GotrueConfig {
    pub fn new(project_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            project_url: project_url.into(),
            anon_key: anon_key.into(),
            session_file: None,
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_session_file(mut self, path: PathBuf) -> Self {
        self.session_file = Some(path);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    expires_at: Option<u64>,
    user: UserPayload,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| unix_now() + secs))
            .unwrap_or(0);
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user_id: self.user.id,
            email: self.user.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// GoTrue HTTP client.
pub struct GotrueClient {
    config: GotrueConfig,
    http: reqwest::Client,
}

impl GotrueClient {
    pub fn new(config: GotrueConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.config.project_url)
    }

    async fn token_request(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<Session, AuthError> {
        let url = format!("{}?grant_type={grant_type}", self.auth_url("token"));

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .timeout(self.config.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_error_status(
                status.as_u16(),
                response.text().await.unwrap_or_default(),
            ));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Parse(e.to_string()))?;

        let session = token.into_session();
        self.persist_session(&session);
        Ok(session)
    }

    /// Check whether an access token is still accepted by the provider.
    async fn validate_token(&self, access_token: &str) -> Result<bool, AuthError> {
        let response = self
            .http
            .get(self.auth_url("user"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Ok(false);
        }
        Err(map_error_status(
            status.as_u16(),
            response.text().await.unwrap_or_default(),
        ))
    }

    // -- session file ------------------------------------------------------

    /// Read the persisted session, if any. A corrupt or missing file is
    /// "no session", not an error.
    fn load_stored_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(path) = &self.config.session_file else {
            return Ok(None);
        };
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AuthError::Storage(e.to_string())),
        };
        match serde_json::from_str(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!("discarding unreadable session file {}: {e}", path.display());
                Ok(None)
            }
        }
    }

    /// Best-effort persistence; a write failure only costs the next
    /// restart a login prompt.
    fn persist_session(&self, session: &Session) {
        let Some(path) = &self.config.session_file else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("failed to create session dir {}: {e}", parent.display());
                return;
            }
        }
        match serde_json::to_string_pretty(session) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    warn!("failed to persist session to {}: {e}", path.display());
                }
            }
            Err(e) => warn!("failed to serialize session: {e}"),
        }
    }

    fn clear_stored_session(&self) {
        if let Some(path) = &self.config.session_file {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("failed to remove session file {}: {e}", path.display());
                }
            }
        }
    }

    /// Refresh a stored session; anything but a network failure clears
    /// the file and resolves to "no session".
    async fn refresh_or_discard(&self, stored: Session) -> Result<Option<Session>, AuthError> {
        match self.refresh(&stored.refresh_token).await {
            Ok(session) => Ok(Some(session)),
            Err(AuthError::Network(e)) => Err(AuthError::Network(e)),
            Err(e) => {
                debug!("stored session could not be refreshed: {e}");
                self.clear_stored_session();
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for GotrueClient {
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(stored) = self.load_stored_session()? else {
            return Ok(None);
        };

        if stored.secs_until_expiry() == 0 {
            return self.refresh_or_discard(stored).await;
        }

        if self.validate_token(&stored.access_token).await? {
            Ok(Some(stored))
        } else {
            self.refresh_or_discard(stored).await
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        debug!(%email, "signing in");
        self.token_request(
            "password",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        debug!("refreshing access token");
        self.token_request(
            "refresh_token",
            serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        self.clear_stored_session();

        let status = response.status();
        // 401 on logout means the token was already dead; that's fine.
        if !status.is_success() && status.as_u16() != 401 {
            return Err(map_error_status(
                status.as_u16(),
                response.text().await.unwrap_or_default(),
            ));
        }
        Ok(())
    }
}

/// Map a non-success auth response to an `AuthError`.
fn map_error_status(status: u16, body: String) -> AuthError {
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|e| e.error_description.or(e.msg).or(e.error))
        .unwrap_or_else(|| body.chars().take(200).collect());

    if status == 400 && detail.to_lowercase().contains("invalid login credentials") {
        return AuthError::InvalidCredentials;
    }
    AuthError::Http { status, detail }
}
