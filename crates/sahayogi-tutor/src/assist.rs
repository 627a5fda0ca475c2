//! Peer-assist client.
//!
//! Relays the peer-mentoring endpoints: a stuck learner files a help
//! request, mentors read the open queue and claim entries. Unlike the
//! conversation path, failures here are ordinary `Result`s; there is no
//! transcript to absorb them into.

use std::time::Duration;

use sahayogi_common::TutorError;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct AssistRequestBody<'a> {
    challenge_id: &'a str,
}

/// Outcome of filing or claiming a help request.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistTicket {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub assist_id: Option<String>,
}

/// Open help requests, as the backend reports them.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistQueue {
    pub success: bool,
    #[serde(default)]
    pub queue: Vec<serde_json::Value>,
}

/// Peer-assist endpoint client.
pub struct AssistClient {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl AssistClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// File a help request for a challenge.
    pub async fn request_assist(
        &self,
        challenge_id: &str,
        access_token: &str,
    ) -> Result<AssistTicket, TutorError> {
        debug!(%challenge_id, "requesting peer assist");
        let response = self
            .http
            .post(format!("{}/api/v1/assist/request", self.base_url))
            .bearer_auth(access_token)
            .timeout(self.timeout)
            .json(&AssistRequestBody { challenge_id })
            .send()
            .await
            .map_err(map_transport_error)?;

        parse_response(response).await
    }

    /// Read the open help-request queue.
    pub async fn queue(&self, access_token: &str) -> Result<AssistQueue, TutorError> {
        let response = self
            .http
            .get(format!("{}/api/v1/assist/queue", self.base_url))
            .bearer_auth(access_token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_transport_error)?;

        parse_response(response).await
    }

    /// Claim an open help request. An already-taken request comes back
    /// as `TutorError::Api { status: 404 }`.
    pub async fn claim(
        &self,
        assist_id: &str,
        access_token: &str,
    ) -> Result<AssistTicket, TutorError> {
        debug!(%assist_id, "claiming peer assist request");
        let response = self
            .http
            .post(format!("{}/api/v1/assist/claim/{assist_id}", self.base_url))
            .bearer_auth(access_token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_transport_error)?;

        parse_response(response).await
    }
}

fn map_transport_error(e: reqwest::Error) -> TutorError {
    if e.is_timeout() {
        TutorError::Timeout
    } else {
        TutorError::Network(e.to_string())
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, TutorError> {
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(TutorError::Unauthorized);
    }
    if !status.is_success() {
        return Err(TutorError::Api {
            status: status.as_u16(),
        });
    }
    response
        .json()
        .await
        .map_err(|e| TutorError::Parse(e.to_string()))
}
