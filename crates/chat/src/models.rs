//! Wire types for the chat backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request body sent to the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    pub user_id: String,
    /// RFC 3339
    pub timestamp: String,
}

impl ChatRequest {
    pub fn new(query: impl Into<String>, user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            query: query.into(),
            user_id: user_id.into(),
            timestamp: now.to_rfc3339(),
        }
    }
}

/// Successful reply. The backend may echo the timestamp and user id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Error body: `{"error": "...", "message": "..."}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A function-style envelope: `{"statusCode": 200, "body": "<json string>"}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Envelope {
    pub status_code: u16,
    pub body: String,
}
