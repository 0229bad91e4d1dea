//! HTTP client for the chat backend.
//!
//! One JSON endpoint: POST `{query, user_id, timestamp}`, answer `{response}`.
//! Failures are returned to the caller as [`ChatError`] and never retried.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};

use crate::errors::ChatError;
use crate::models::{ChatReply, ChatRequest, Envelope, ErrorBody};

/// Default timeout for chat requests. Answers can take a while to generate.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// User id sent when none is configured.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Anything that can answer a chat query.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, query: &str, user_id: &str) -> Result<ChatReply, ChatError>;
}

/// Chat backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ChatClient {
    /// Create a client for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Config`] if the endpoint is blank or the HTTP
    /// client cannot be initialized.
    pub fn new(endpoint: &str) -> Result<Self, ChatError> {
        Self::with_timeout(endpoint, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, ChatError> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(ChatError::Config("chat endpoint is empty".to_string()));
        }
        reqwest::Url::parse(endpoint)
            .map_err(|e| ChatError::Config(format!("invalid chat endpoint: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Config(format!("Failed to initialize HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Turn a status and body into a reply or an error.
    ///
    /// Also accepts replies wrapped as `{"statusCode": .., "body": "<json>"}`,
    /// which is what the backend function returns when invoked without a
    /// gateway in front of it.
    pub fn interpret(status: u16, body: &str) -> Result<ChatReply, ChatError> {
        match Self::interpret_direct(status, body) {
            Err(ChatError::MalformedResponse(reason)) => {
                match serde_json::from_str::<Envelope>(body) {
                    Ok(envelope) => Self::interpret_direct(envelope.status_code, &envelope.body),
                    Err(_) => Err(ChatError::MalformedResponse(reason)),
                }
            }
            other => other,
        }
    }

    fn interpret_direct(status: u16, body: &str) -> Result<ChatReply, ChatError> {
        if !(200..300).contains(&status) {
            let parsed = serde_json::from_str::<ErrorBody>(body).unwrap_or_default();
            let message = parsed
                .message
                .or(parsed.error)
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(ChatError::Backend { status, message });
        }

        serde_json::from_str::<ChatReply>(body).map_err(|e| {
            ChatError::MalformedResponse(format!(
                "{} - {}",
                e,
                body.chars().take(200).collect::<String>()
            ))
        })
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn send(&self, query: &str, user_id: &str) -> Result<ChatReply, ChatError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ChatError::EmptyQuery);
        }
        let user_id = match user_id.trim() {
            "" => ANONYMOUS_USER,
            id => id,
        };

        let request = ChatRequest::new(query, user_id, Utc::now());
        debug!("[Chat] POST {} ({} chars)", self.endpoint, query.len());

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        let result = Self::interpret(status, &body);
        if let Err(ref e) = result {
            warn!("[Chat] request failed: {}", e);
        }
        result
    }
}
