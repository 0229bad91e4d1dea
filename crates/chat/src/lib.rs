//! Livetrader Chat
//!
//! Client for the market Q&A assistant. The dashboard forwards the user's
//! question to the backend and shows either the answer or a readable error.
//!
//! ```text
//! dashboard --send(query, user_id)--> ChatClient --POST JSON--> backend
//!                                         |
//!                      ChatReply <--------+--------> ChatError
//! ```

pub mod client;
pub mod errors;
pub mod models;

pub use client::{ChatBackend, ChatClient, ANONYMOUS_USER};
pub use errors::ChatError;
pub use models::{ChatReply, ChatRequest};
