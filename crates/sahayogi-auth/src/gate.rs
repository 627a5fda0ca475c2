//! Route gate for the authenticated workspace.
//!
//! Turns the session manager's state into a rendering decision. The one
//! invariant that matters: while the initial session check is still in
//! flight (`SessionState::Unknown`), the gate waits. Redirecting before
//! that check resolves would bounce users with a valid stored session
//! back to the login screen.

use tokio::sync::watch;

use crate::session::SessionState;

/// Gate view of the auth lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Loading,
    Authenticated,
    Unauthenticated,
}

impl From<&SessionState> for GateState {
    fn from(state: &SessionState) -> Self {
        match state {
            SessionState::Unknown => GateState::Loading,
            SessionState::SignedIn(_) => GateState::Authenticated,
            SessionState::SignedOut => GateState::Unauthenticated,
        }
    }
}

/// What the caller should do with the protected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    /// Show a neutral placeholder; the session check has not resolved.
    Wait,
    /// Render the workspace.
    Render,
    /// Send the user to the login entry point.
    RedirectToLogin,
}

/// Decide what to do for a given session state.
pub fn evaluate(state: &SessionState) -> GateAction {
    match GateState::from(state) {
        GateState::Loading => GateAction::Wait,
        GateState::Authenticated => GateAction::Render,
        GateState::Unauthenticated => GateAction::RedirectToLogin,
    }
}

/// Wait until the session state has resolved, then return the first
/// non-`Wait` action.
///
/// If the session manager goes away while we wait, the caller is sent
/// to login.
pub async fn resolve(state_rx: &mut watch::Receiver<SessionState>) -> GateAction {
    loop {
        let action = evaluate(&state_rx.borrow());
        if action != GateAction::Wait {
            return action;
        }
        if state_rx.changed().await.is_err() {
            return GateAction::RedirectToLogin;
        }
    }
}
