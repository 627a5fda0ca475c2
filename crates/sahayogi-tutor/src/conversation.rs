//! Conversation controller.
//!
//! Owns the chat transcript and executes the request/response protocol
//! against the tutoring endpoint. The transcript is append-only: a
//! user turn lands before its network request is issued, and the paired
//! reply (or the fixed fallback) lands once that request resolves.
//! `send` takes `&mut self`, so sends are serialized and replies always
//! arrive in send order.

use std::sync::Arc;

use sahayogi_auth::SessionManager;
use sahayogi_common::{Message, TutorError};
use tracing::{debug, warn};

use crate::TutorApi;

/// Synthetic greeting seeded at the start of every conversation.
pub const GREETING: &str =
    "Hi! I'm Sahayogi. I'm here to help you solve this sandbox. What's your first question?";

/// Shown in place of a reply when the tutor request fails, whatever the
/// cause. The tagged error goes to the log, not the user.
pub const FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble connecting to my brain. Please try again.";

/// What a `send` call did. Failures are absorbed into the transcript;
/// this is diagnostic, not an error channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Precondition failed (empty prompt or no credential); nothing
    /// was appended and no request was issued.
    Rejected,
    /// The tutor replied; transcript grew by a user and an ai turn.
    Answered,
    /// The request failed; transcript grew by a user turn and the
    /// fallback reply.
    Failed,
}

/// Controller for one tutoring conversation.
pub struct Conversation {
    transcript: Vec<Message>,
    api: Arc<dyn TutorApi>,
    auth: SessionManager,
}

impl Conversation {
    pub fn new(api: Arc<dyn TutorApi>, auth: SessionManager) -> Self {
        Self {
            transcript: vec![Message::ai(GREETING)],
            api,
            auth,
        }
    }

    /// Relay one prompt to the tutor.
    ///
    /// The credential is read from the session manager here, at send
    /// time; a reply that comes back after the user signed out is
    /// discarded and counted as a failure.
    pub async fn send(&mut self, prompt: &str) -> SendOutcome {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return SendOutcome::Rejected;
        }
        let Some(token) = self.auth.access_token() else {
            debug!("send rejected: no credential");
            return SendOutcome::Rejected;
        };

        // The user's turn is visible before any network I/O; the
        // outbound history is everything that preceded it.
        let history = self.transcript.clone();
        self.transcript.push(Message::user(prompt));

        let reply = match self.api.ask(prompt, &history, &token).await {
            Ok(reply) if self.auth.current().is_signed_in() => Ok(reply),
            Ok(_) => Err(TutorError::Unauthorized),
            Err(e) => Err(e),
        };

        match reply {
            Ok(text) => {
                self.transcript.push(Message::ai(text));
                SendOutcome::Answered
            }
            Err(e) => {
                warn!("tutor request absorbed as fallback: {e}");
                self.transcript.push(Message::ai(FALLBACK_REPLY));
                SendOutcome::Failed
            }
        }
    }

    /// The full transcript, oldest first.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// The most recent turn.
    pub fn last(&self) -> Option<&Message> {
        self.transcript.last()
    }

    /// Reset to the seeded greeting.
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.transcript.push(Message::ai(GREETING));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sahayogi_auth::{IdentityProvider, Session, SessionManagerConfig};
    use sahayogi_common::{AuthError, Role};
    use std::sync::Mutex;

    /// Provider that accepts any password and mints a token from the
    /// email, so tests can tell sessions apart.
    struct TestProvider;

    #[async_trait]
    impl IdentityProvider for TestProvider {
        async fn current_session(&self) -> Result<Option<Session>, AuthError> {
            Ok(None)
        }

        async fn sign_in(&self, email: &str, _password: &str) -> Result<Session, AuthError> {
            Ok(Session {
                access_token: format!("token-{email}"),
                refresh_token: "refresh".into(),
                expires_at: 0,
                user_id: email.into(),
                email: Some(email.into()),
            })
        }

        async fn refresh(&self, _refresh_token: &str) -> Result<Session, AuthError> {
            Err(AuthError::SessionExpired)
        }

        async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
            Ok(())
        }
    }

    #[derive(Clone)]
    enum FakeMode {
        Reply(String),
        Fail,
        /// Sign the user out while the request is "in flight", then
        /// reply anyway.
        SignOutThenReply(SessionManager, String),
    }

    struct FakeTutor {
        mode: Mutex<FakeMode>,
        seen_history: Mutex<Vec<Vec<Message>>>,
        seen_tokens: Mutex<Vec<String>>,
    }

    impl FakeTutor {
        fn new(mode: FakeMode) -> Arc<Self> {
            Arc::new(Self {
                mode: Mutex::new(mode),
                seen_history: Mutex::new(Vec::new()),
                seen_tokens: Mutex::new(Vec::new()),
            })
        }

        fn set_mode(&self, mode: FakeMode) {
            *self.mode.lock().unwrap() = mode;
        }
    }

    #[async_trait]
    impl TutorApi for FakeTutor {
        async fn ask(
            &self,
            _prompt: &str,
            history: &[Message],
            access_token: &str,
        ) -> Result<String, TutorError> {
            self.seen_history.lock().unwrap().push(history.to_vec());
            self.seen_tokens
                .lock()
                .unwrap()
                .push(access_token.to_string());

            let mode = self.mode.lock().unwrap().clone();
            match mode {
                FakeMode::Reply(text) => Ok(text),
                FakeMode::Fail => Err(TutorError::Network("connection reset".into())),
                FakeMode::SignOutThenReply(auth, text) => {
                    auth.sign_out().await;
                    Ok(text)
                }
            }
        }
    }

    async fn signed_in_manager() -> SessionManager {
        let mgr = SessionManager::new(Arc::new(TestProvider), SessionManagerConfig::default());
        mgr.initialize().await;
        mgr.sign_in("test@test.com", "pw").await.unwrap();
        mgr
    }

    #[tokio::test]
    async fn starts_with_the_greeting() {
        let auth = signed_in_manager().await;
        let convo = Conversation::new(FakeTutor::new(FakeMode::Fail), auth);
        assert_eq!(convo.transcript().len(), 1);
        assert_eq!(convo.transcript()[0].role, Role::Ai);
        assert_eq!(convo.transcript()[0].content, GREETING);
    }

    #[tokio::test]
    async fn rejects_blank_prompt() {
        let auth = signed_in_manager().await;
        let api = FakeTutor::new(FakeMode::Reply("unused".into()));
        let mut convo = Conversation::new(api.clone(), auth);

        assert_eq!(convo.send("   ").await, SendOutcome::Rejected);

        assert_eq!(convo.transcript().len(), 1);
        assert!(api.seen_history.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_without_credential() {
        let mgr = SessionManager::new(Arc::new(TestProvider), SessionManagerConfig::default());
        mgr.initialize().await; // resolves SignedOut
        let api = FakeTutor::new(FakeMode::Reply("unused".into()));
        let mut convo = Conversation::new(api.clone(), mgr);

        assert_eq!(convo.send("hello").await, SendOutcome::Rejected);

        assert_eq!(convo.transcript().len(), 1);
        assert!(api.seen_history.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn success_appends_user_then_reply() {
        let auth = signed_in_manager().await;
        let api = FakeTutor::new(FakeMode::Reply("A packet is...".into()));
        let mut convo = Conversation::new(api, auth);

        assert_eq!(convo.send("What is a packet?").await, SendOutcome::Answered);

        let transcript = convo.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1], Message::user("What is a packet?"));
        assert_eq!(transcript[2], Message::ai("A packet is..."));
    }

    #[tokio::test]
    async fn failure_appends_the_fallback() {
        let auth = signed_in_manager().await;
        let mut convo = Conversation::new(FakeTutor::new(FakeMode::Fail), auth);

        assert_eq!(convo.send("hello").await, SendOutcome::Failed);

        let transcript = convo.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1], Message::user("hello"));
        assert_eq!(transcript[2], Message::ai(FALLBACK_REPLY));
    }

    #[tokio::test]
    async fn history_excludes_the_current_prompt() {
        let auth = signed_in_manager().await;
        let api = FakeTutor::new(FakeMode::Reply("first answer".into()));
        let mut convo = Conversation::new(api.clone(), auth);

        convo.send("first question").await;
        api.set_mode(FakeMode::Reply("second answer".into()));
        convo.send("second question").await;

        let seen = api.seen_history.lock().unwrap();
        // First request: just the greeting.
        assert_eq!(seen[0].len(), 1);
        // Second request: greeting + first exchange, not the new prompt.
        assert_eq!(seen[1].len(), 3);
        assert!(seen[1].iter().all(|m| m.content != "second question"));
    }

    #[tokio::test]
    async fn sequential_sends_stay_in_order() {
        let auth = signed_in_manager().await;
        let api = FakeTutor::new(FakeMode::Reply("answer one".into()));
        let mut convo = Conversation::new(api.clone(), auth);

        convo.send("question one").await;
        api.set_mode(FakeMode::Fail);
        convo.send("question two").await;

        let contents: Vec<&str> = convo
            .transcript()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            contents,
            vec![
                GREETING,
                "question one",
                "answer one",
                "question two",
                FALLBACK_REPLY,
            ]
        );
    }

    #[tokio::test]
    async fn credential_is_read_at_send_time() {
        let auth = signed_in_manager().await;
        let api = FakeTutor::new(FakeMode::Reply("ok".into()));
        let mut convo = Conversation::new(api.clone(), auth.clone());

        convo.send("one").await;
        auth.sign_in("other@test.com", "pw").await.unwrap();
        convo.send("two").await;

        let tokens = api.seen_tokens.lock().unwrap();
        assert_eq!(tokens[0], "token-test@test.com");
        assert_eq!(tokens[1], "token-other@test.com");
    }

    #[tokio::test]
    async fn reply_after_sign_out_is_discarded() {
        let auth = signed_in_manager().await;
        let api = FakeTutor::new(FakeMode::SignOutThenReply(
            auth.clone(),
            "too late".into(),
        ));
        let mut convo = Conversation::new(api, auth);

        assert_eq!(convo.send("hello").await, SendOutcome::Failed);

        let transcript = convo.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[2], Message::ai(FALLBACK_REPLY));
    }

    #[tokio::test]
    async fn clear_reseeds_the_greeting() {
        let auth = signed_in_manager().await;
        let api = FakeTutor::new(FakeMode::Reply("answer".into()));
        let mut convo = Conversation::new(api, auth);

        convo.send("question").await;
        convo.clear();

        assert_eq!(convo.transcript().len(), 1);
        assert_eq!(convo.last().unwrap().content, GREETING);
    }
}
