//! In-memory backend for controller tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use lexora_client::{ClientError, ConversationBackend, ConversationResponse, Result};
use lexora_core::{ConversationKind, Message, SessionId};
use parking_lot::Mutex;

/// A backend that replays scripted responses and records what it was sent.
#[derive(Default)]
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<ConversationResponse>>>,
    sent: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn push_reply(&self, response: ConversationResponse) {
        self.responses.lock().push_back(Ok(response));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: ClientError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Every batch of messages submitted so far.
    pub fn sent(&self) -> Vec<Vec<Message>> {
        self.sent.lock().clone()
    }

    /// Contents of the last submitted message.
    pub fn last_sent(&self) -> Option<String> {
        self.sent
            .lock()
            .last()
            .and_then(|batch| batch.last())
            .map(|m| m.content.clone())
    }
}

#[async_trait]
impl ConversationBackend for ScriptedBackend {
    async fn create_session(&self, _kind: ConversationKind) -> Result<SessionId> {
        Ok(SessionId::new("scripted-session").unwrap())
    }

    async fn send_message(
        &self,
        _kind: ConversationKind,
        messages: &[Message],
        _session_id: &SessionId,
    ) -> Result<ConversationResponse> {
        self.sent.lock().push(messages.to_vec());
        self.responses.lock().pop_front().unwrap_or_else(|| {
            Err(ClientError::Api {
                status: 500,
                message: "no scripted response".to_string(),
            })
        })
    }

    async fn get_history(
        &self,
        _kind: ConversationKind,
        _session_id: &SessionId,
    ) -> Result<Vec<Message>> {
        Ok(Vec::new())
    }

    async fn clear_history(&self, _kind: ConversationKind, _session_id: &SessionId) -> Result<()> {
        Ok(())
    }
}

/// Session id used across controller tests.
pub fn session() -> SessionId {
    SessionId::new("s-1").unwrap()
}

/// A plain assistant reply.
pub fn reply(content: &str) -> ConversationResponse {
    ConversationResponse::reply(session(), vec![Message::assistant(content)])
}
