//! Session and auth event types.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// An authenticated session with the identity provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer credential presented to the backend.
    pub access_token: String,
    /// Token used to obtain a fresh access token.
    pub refresh_token: String,
    /// Unix timestamp (seconds) at which the access token expires.
    /// Zero means the provider reported no expiry.
    pub expires_at: u64,
    pub user_id: String,
    pub email: Option<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish()
    }
}

impl Session {
    /// Seconds until the access token expires, zero if already expired
    /// or no expiry is known.
    pub fn secs_until_expiry(&self) -> u64 {
        if self.expires_at == 0 {
            return 0;
        }
        self.expires_at.saturating_sub(unix_now())
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// What the session manager currently knows about authentication.
///
/// `Unknown` is the pre-`initialize` state and must not be treated as
/// signed out: the route gate waits on it instead of redirecting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Unknown,
    SignedOut,
    SignedIn(Session),
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionState::SignedIn(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::SignedIn(session) => Some(session),
            _ => None,
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session().map(|s| s.access_token.as_str())
    }
}

/// A provider-level auth transition, published to subscribers exactly
/// once each, in the order it occurred.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}
