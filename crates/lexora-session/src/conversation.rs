//! The linear request/response loop shared by both controllers.

use lexora_client::{ClientError, ConversationBackend, ConversationResponse};
use lexora_core::{ConversationKind, Message, SessionId};

/// Assistant message appended when a turn fails.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Observable state of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnState {
    /// Ready to accept input.
    Idle,
    /// A request is outstanding; new input is ignored.
    AwaitingResponse,
    /// The backend paused the turn and is waiting for a decision.
    AwaitingInterruptResolution,
}

/// A turn that has been accepted and must be sent to the backend.
///
/// The messages have already been appended to the issuing controller's
/// history. Pass the backend's result back to that controller's
/// `finish_turn`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
    /// Service the turn belongs to.
    pub kind: ConversationKind,
    /// Session the turn belongs to.
    pub session_id: SessionId,
    /// Messages to submit. Only the new user message.
    pub messages: Vec<Message>,
}

impl TurnRequest {
    /// Send the turn to a backend.
    ///
    /// # Errors
    ///
    /// Returns whatever the backend returns; nothing is retried.
    pub async fn dispatch<B>(&self, backend: &B) -> Result<ConversationResponse, ClientError>
    where
        B: ConversationBackend + ?Sized,
    {
        backend
            .send_message(self.kind, &self.messages, &self.session_id)
            .await
    }
}

/// Append-only history with a single in-flight guard.
#[derive(Debug, Clone)]
pub(crate) struct Conversation {
    kind: ConversationKind,
    session_id: SessionId,
    messages: Vec<Message>,
    in_flight: bool,
}

impl Conversation {
    pub(crate) fn new(kind: ConversationKind, session_id: SessionId) -> Self {
        Self::resume(kind, session_id, Vec::new())
    }

    pub(crate) fn resume(kind: ConversationKind, session_id: SessionId, history: Vec<Message>) -> Self {
        Self {
            kind,
            session_id,
            messages: history,
            in_flight: false,
        }
    }

    /// Accept user input, or return `None` if it is blank or a turn is
    /// already outstanding. Accepted input is appended immediately.
    pub(crate) fn begin(&mut self, content: &str) -> Option<TurnRequest> {
        if content.trim().is_empty() {
            return None;
        }
        if self.in_flight {
            tracing::debug!(session_id = %self.session_id, "Ignoring input while awaiting response");
            return None;
        }

        let message = Message::user(content);
        self.in_flight = true;
        self.messages.push(message.clone());

        Some(TurnRequest {
            kind: self.kind,
            session_id: self.session_id.clone(),
            messages: vec![message],
        })
    }

    /// Record the outcome of the outstanding turn.
    ///
    /// Returns `false` if no turn was outstanding, in which case nothing
    /// changes.
    pub(crate) fn finish(&mut self, outcome: Result<Vec<Message>, ClientError>) -> bool {
        if !self.in_flight {
            tracing::warn!(session_id = %self.session_id, "Dropping result for a turn that is not outstanding");
            return false;
        }
        self.in_flight = false;

        match outcome {
            Ok(replies) => self.messages.extend(replies),
            Err(err) => {
                tracing::error!(
                    kind = ?self.kind,
                    session_id = %self.session_id,
                    error = %err,
                    "Turn failed"
                );
                self.messages.push(Message::assistant(FALLBACK_REPLY));
            }
        }
        true
    }

    pub(crate) fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub(crate) fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub(crate) fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}
