//! Identity provider seam.

use async_trait::async_trait;
use sahayogi_common::AuthError;

use crate::session::Session;

/// The identity provider the session manager drives.
///
/// `GotrueClient` is the production implementation; tests substitute
/// in-memory fakes.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// One-shot recovery of a previously established session.
    ///
    /// `Ok(None)` means "no session" (including invalid or expired stored
    /// credentials); `Err` is reserved for failures the caller may want to
    /// log, and is still treated as "no session" by the manager.
    async fn current_session(&self) -> Result<Option<Session>, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}
