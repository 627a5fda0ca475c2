//! Socratic tutor relay for Sahayogi.
//!
//! Provides the conversation controller that owns the chat transcript,
//! the HTTP client for the tutoring endpoint, and the peer-assist
//! client. The controller reads the bearer credential from
//! `sahayogi_auth::SessionManager` at send time, never at construction.

pub mod assist;
pub mod client;
pub mod conversation;

use async_trait::async_trait;

pub use assist::{AssistClient, AssistQueue, AssistTicket};
pub use client::HttpTutorClient;
pub use conversation::{Conversation, SendOutcome, FALLBACK_REPLY, GREETING};

use sahayogi_common::{Message, TutorError};

/// Transport seam between the conversation controller and the tutoring
/// endpoint. `HttpTutorClient` is the production implementation; tests
/// substitute in-memory fakes.
#[async_trait]
pub trait TutorApi: Send + Sync {
    /// Ask the tutor one question. `history` is every transcript entry
    /// that precedes the prompt; the prompt itself travels separately.
    async fn ask(
        &self,
        prompt: &str,
        history: &[Message],
        access_token: &str,
    ) -> Result<String, TutorError>;
}
