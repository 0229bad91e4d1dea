//! Error types for the chat client.

use thiserror::Error;

/// Errors returned by [`crate::ChatBackend::send`].
#[derive(Error, Debug)]
pub enum ChatError {
    /// The query was blank, so nothing was sent.
    #[error("Query is empty")]
    EmptyQuery,

    /// The backend answered with a non-success status.
    #[error("Chat backend returned {status}: {message}")]
    Backend {
        /// HTTP status code
        status: u16,
        /// Message from the error body, or the status text
        message: String,
    },

    /// The backend answered 2xx but the body was not a chat reply.
    #[error("Malformed chat response: {0}")]
    MalformedResponse(String),

    /// The request never got an HTTP answer.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The client could not be built (bad endpoint URL).
    #[error("Invalid chat configuration: {0}")]
    Config(String),
}

impl ChatError {
    /// Text suitable for showing in the chat widget.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::EmptyQuery => "Please enter a question.".to_string(),
            ChatError::Backend { status, .. } if *status >= 500 => {
                "The assistant is unavailable right now. Please try again later.".to_string()
            }
            ChatError::Backend { message, .. } => format!("The assistant could not answer: {}", message),
            ChatError::MalformedResponse(_) => {
                "The assistant sent a response that could not be read.".to_string()
            }
            ChatError::Network(_) => {
                "Could not reach the assistant. Check your connection and try again.".to_string()
            }
            ChatError::Config(_) => "The assistant is not configured.".to_string(),
        }
    }
}
