//! Session manager: the single source of truth for auth state.
//!
//! State lives in a `watch` channel so the gate can observe the
//! `Unknown -> SignedIn/SignedOut` resolution; auth transitions fan out
//! to subscribers over a `broadcast` channel, one event per underlying
//! provider transition, in order, with no replay on subscribe.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use sahayogi_common::AuthError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::provider::IdentityProvider;
use crate::session::{AuthEvent, Session, SessionState};

/// Session manager tuning.
#[derive(Debug, Clone)]
pub struct SessionManagerConfig {
    /// Refresh the access token automatically before it expires.
    pub auto_refresh: bool,
    /// How long before expiry the refresh fires.
    pub refresh_margin: Duration,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            refresh_margin: Duration::from_secs(60),
        }
    }
}

/// Single source of truth for authentication state.
///
/// Cheap to clone; all clones share the same state and subscriber set.
/// Consumers read the credential through [`SessionManager::access_token`]
/// at the moment they need it rather than caching it.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    provider: Arc<dyn IdentityProvider>,
    state_tx: watch::Sender<SessionState>,
    events: broadcast::Sender<AuthEvent>,
    config: SessionManagerConfig,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    /// Replace the state snapshot and, when a provider transition
    /// actually occurred, publish it.
    fn store(&self, state: SessionState, event: Option<AuthEvent>) {
        self.state_tx.send_replace(state);
        if let Some(event) = event {
            let _ = self.events.send(event);
        }
    }

    fn cancel_refresh(&self) {
        if let Some(task) = self.refresh_task.lock().unwrap_or_else(|e| e.into_inner()).take() {
            task.abort();
        }
    }
}

impl SessionManager {
    pub fn new(provider: Arc<dyn IdentityProvider>, config: SessionManagerConfig) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Unknown);
        let (events, _) = broadcast::channel(32);
        Self {
            inner: Arc::new(Inner {
                provider,
                state_tx,
                events,
                config,
                refresh_task: Mutex::new(None),
            }),
        }
    }

    /// Query the provider once for an existing session.
    ///
    /// Until this resolves, [`SessionManager::current`] reports
    /// `SessionState::Unknown`. A provider failure here is absorbed:
    /// the user lands on the login gate instead of an error screen.
    pub async fn initialize(&self) {
        let state = match self.inner.provider.current_session().await {
            Ok(Some(session)) => {
                info!(user_id = %session.user_id, "recovered existing session");
                SessionState::SignedIn(session)
            }
            Ok(None) => SessionState::SignedOut,
            Err(e) => {
                warn!("initial session query failed, treating as signed out: {e}");
                SessionState::SignedOut
            }
        };

        if let SessionState::SignedIn(session) = &state {
            self.spawn_refresh(session.clone());
        }
        self.inner.store(state, None);
    }

    /// Latest known state, synchronously (no I/O).
    pub fn current(&self) -> SessionState {
        self.inner.state_tx.borrow().clone()
    }

    /// The bearer credential, if signed in. Read this at send time.
    pub fn access_token(&self) -> Option<String> {
        let state = self.current();
        state.access_token().map(str::to_owned)
    }

    /// Subscribe to auth transitions. The returned handle yields each
    /// event exactly once, in order, starting from events published
    /// after this call.
    pub fn subscribe(&self) -> AuthEvents {
        AuthEvents {
            rx: Some(self.inner.events.subscribe()),
        }
    }

    /// Watch the state snapshot itself, including the initial
    /// `Unknown -> ...` resolution. Used by the route gate.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    /// Sign in with email and password.
    ///
    /// This is the one place auth errors surface to the caller: the
    /// login prompt needs them.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.inner.provider.sign_in(email, password).await?;
        self.spawn_refresh(session.clone());
        self.inner.store(
            SessionState::SignedIn(session.clone()),
            Some(AuthEvent::SignedIn(session.clone())),
        );
        Ok(session)
    }

    /// Sign out. Provider failures are logged, never propagated; local
    /// state always ends up `SignedOut`.
    pub async fn sign_out(&self) {
        let state = self.current();
        self.inner.cancel_refresh();

        let was_signed_in = if let SessionState::SignedIn(session) = &state {
            if let Err(e) = self.inner.provider.sign_out(&session.access_token).await {
                warn!("provider sign-out failed: {e}");
            }
            true
        } else {
            false
        };

        self.inner.store(
            SessionState::SignedOut,
            was_signed_in.then_some(AuthEvent::SignedOut),
        );
    }

    /// Abort the background refresh task. Call on shutdown.
    pub fn shutdown(&self) {
        self.inner.cancel_refresh();
    }

    fn spawn_refresh(&self, session: Session) {
        if !self.inner.config.auto_refresh {
            return;
        }
        self.inner.cancel_refresh();
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(refresh_loop(inner, session));
        *self
            .inner
            .refresh_task
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }
}

/// Background task that keeps the access token fresh.
///
/// Updates state directly (without respawning itself) on success; a
/// failed refresh signs the user out.
async fn refresh_loop(inner: Arc<Inner>, mut session: Session) {
    loop {
        if session.expires_at == 0 {
            debug!("session reports no expiry, skipping auto-refresh");
            return;
        }
        let margin = inner.config.refresh_margin.as_secs();
        let wait = session.secs_until_expiry().saturating_sub(margin).max(1);
        tokio::time::sleep(Duration::from_secs(wait)).await;

        match inner.provider.refresh(&session.refresh_token).await {
            Ok(next) => {
                debug!(user_id = %next.user_id, "access token refreshed");
                inner.store(
                    SessionState::SignedIn(next.clone()),
                    Some(AuthEvent::TokenRefreshed(next.clone())),
                );
                session = next;
            }
            Err(e) => {
                warn!("token refresh failed, signing out: {e}");
                inner.store(SessionState::SignedOut, Some(AuthEvent::SignedOut));
                return;
            }
        }
    }
}

/// Handle to a stream of auth events.
///
/// `close` is the disposer: after it returns, `next` never yields
/// another event. Closing twice is a no-op, and dropping the handle
/// releases the subscription as well.
pub struct AuthEvents {
    rx: Option<broadcast::Receiver<AuthEvent>>,
}

impl AuthEvents {
    /// Next auth event, or `None` once closed (either side).
    pub async fn next(&mut self) -> Option<AuthEvent> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("auth event subscriber lagged by {n} events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Release the subscription. Idempotent.
    pub fn close(&mut self) {
        self.rx.take();
    }

    pub fn is_closed(&self) -> bool {
        self.rx.is_none()
    }
}
