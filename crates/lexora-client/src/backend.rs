//! The conversational backend seam.

use async_trait::async_trait;
use lexora_core::{ConversationKind, Message, SessionId};

use crate::error::Result;
use crate::types::ConversationResponse;

/// Trait for talking to the conversational services.
///
/// This trait abstracts the HTTP client, allowing controllers to be driven
/// by in-memory implementations in tests.
#[async_trait]
pub trait ConversationBackend: Send + Sync {
    /// Start a new conversation and return its session token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    async fn create_session(&self, kind: ConversationKind) -> Result<SessionId>;

    /// Submit messages for a session and return the backend's reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    async fn send_message(
        &self,
        kind: ConversationKind,
        messages: &[Message],
        session_id: &SessionId,
    ) -> Result<ConversationResponse>;

    /// Fetch the stored history of a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    async fn get_history(
        &self,
        kind: ConversationKind,
        session_id: &SessionId,
    ) -> Result<Vec<Message>>;

    /// Clear the stored history of a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    async fn clear_history(&self, kind: ConversationKind, session_id: &SessionId) -> Result<()>;
}
