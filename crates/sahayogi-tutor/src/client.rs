//! Tutoring endpoint HTTP client.
//!
//! Implements the `TutorApi` trait against
//! `POST {base_url}/api/v1/tutor/ask`.

use std::time::Duration;

use async_trait::async_trait;
use sahayogi_common::{Message, TutorError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::TutorApi;

#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    prompt: &'a str,
    chat_history: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct AskResponse {
    response: String,
}

/// Tutoring endpoint client.
pub struct HttpTutorClient {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl HttpTutorClient {
    /// `base_url` is the backend origin with no trailing slash.
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
}

#[async_trait]
impl TutorApi for HttpTutorClient {
    async fn ask(
        &self,
        prompt: &str,
        history: &[Message],
        access_token: &str,
    ) -> Result<String, TutorError> {
        let request_id = uuid::Uuid::new_v4();
        debug!(%request_id, history_len = history.len(), "tutor ask request");

        let response = self
            .http
            .post(format!("{}/api/v1/tutor/ask", self.base_url))
            .bearer_auth(access_token)
            .timeout(self.timeout)
            .json(&AskRequest {
                prompt,
                chat_history: history,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TutorError::Timeout
                } else {
                    TutorError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            warn!(%request_id, "tutor request rejected: credential not accepted");
            return Err(TutorError::Unauthorized);
        }
        if !status.is_success() {
            warn!(%request_id, status = status.as_u16(), "tutor request failed");
            return Err(TutorError::Api {
                status: status.as_u16(),
            });
        }

        let body: AskResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                TutorError::Timeout
            } else {
                TutorError::Parse(e.to_string())
            }
        })?;

        debug!(%request_id, reply_len = body.response.len(), "tutor reply received");
        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sahayogi_common::Role;

    #[test]
    fn ask_request_wire_shape() {
        let history = vec![Message::ai("greeting"), Message::user("first question")];
        let request = AskRequest {
            prompt: "second question",
            chat_history: &history,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["prompt"], "second question");
        let sent = json["chat_history"].as_array().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0]["role"], "ai");
        assert_eq!(sent[1]["role"], "user");
        // The current prompt never rides along in the history.
        assert!(sent.iter().all(|m| m["content"] != "second question"));
    }

    #[test]
    fn ask_response_parses() {
        let body: AskResponse =
            serde_json::from_str(r#"{"response": "A packet is..."}"#).unwrap();
        assert_eq!(body.response, "A packet is...");
    }

    #[test]
    fn ask_response_rejects_missing_field() {
        let result = serde_json::from_str::<AskResponse>(r#"{"reply": "nope"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn history_round_trips_roles() {
        let history = vec![Message::user("q"), Message::ai("a")];
        let json = serde_json::to_string(&history).unwrap();
        let parsed: Vec<Message> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0].role, Role::User);
        assert_eq!(parsed[1].role, Role::Ai);
    }
}
