//! Question and answer controller.

use lexora_client::{ClientError, ConversationBackend, ConversationResponse};
use lexora_core::{ConversationKind, Message, SessionId};

use crate::conversation::{Conversation, TurnRequest, TurnState};

/// Drives a chat conversation.
///
/// Chat never pauses: any interrupt fields in a reply are ignored.
#[derive(Debug, Clone)]
pub struct ChatController {
    conversation: Conversation,
}

impl ChatController {
    /// Start with an empty history.
    #[must_use]
    pub fn new(session_id: SessionId) -> Self {
        Self {
            conversation: Conversation::new(ConversationKind::Chat, session_id),
        }
    }

    /// Continue a session from its stored history.
    #[must_use]
    pub fn resume(session_id: SessionId, history: Vec<Message>) -> Self {
        Self {
            conversation: Conversation::resume(ConversationKind::Chat, session_id, history),
        }
    }

    /// Accept user input and return the request to dispatch.
    ///
    /// Returns `None`, leaving state untouched, when the input is blank or
    /// a request is already outstanding.
    pub fn begin_turn(&mut self, input: &str) -> Option<TurnRequest> {
        self.conversation.begin(input)
    }

    /// Record the outcome of the outstanding request.
    ///
    /// On success the assistant replies are appended in order. On failure
    /// one fallback reply is appended. Returns `false` if nothing was
    /// outstanding.
    pub fn finish_turn(&mut self, result: Result<ConversationResponse, ClientError>) -> bool {
        let outcome = result.map(|response| response.into_parts().0);
        self.conversation.finish(outcome)
    }

    /// Run a whole turn against `backend`. Returns whether the input was
    /// accepted.
    pub async fn send<B>(&mut self, backend: &B, input: &str) -> bool
    where
        B: ConversationBackend + ?Sized,
    {
        let Some(request) = self.begin_turn(input) else {
            return false;
        };
        let result = request.dispatch(backend).await;
        self.finish_turn(result);
        true
    }

    /// History, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> TurnState {
        if self.conversation.is_in_flight() {
            TurnState::AwaitingResponse
        } else {
            TurnState::Idle
        }
    }

    /// Whether a request is outstanding.
    #[must_use]
    pub fn is_awaiting_response(&self) -> bool {
        self.conversation.is_in_flight()
    }

    /// Session this controller talks to.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        self.conversation.session_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::FALLBACK_REPLY;
    use crate::testing::{reply, session, ScriptedBackend};
    use lexora_core::{InterruptData, InterruptKind};

    #[tokio::test]
    async fn reply_follows_question() {
        let backend = ScriptedBackend::new();
        backend.push_reply(reply("Article 150 applies."));

        let mut chat = ChatController::new(session());
        assert!(chat.send(&backend, "Which article?").await);

        assert_eq!(
            chat.messages(),
            [
                Message::user("Which article?"),
                Message::assistant("Article 150 applies."),
            ]
        );
        assert_eq!(chat.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn only_new_message_is_submitted() {
        let backend = ScriptedBackend::new();
        backend.push_reply(reply("one"));
        backend.push_reply(reply("two"));

        let mut chat = ChatController::new(session());
        chat.send(&backend, "first").await;
        chat.send(&backend, "second").await;

        assert_eq!(
            backend.sent(),
            [vec![Message::user("first")], vec![Message::user("second")]]
        );
        assert_eq!(chat.messages().len(), 4);
    }

    #[tokio::test]
    async fn server_error_appends_one_fallback() {
        let backend = ScriptedBackend::new();
        backend.push_error(ClientError::Api {
            status: 500,
            message: "Internal Server Error".to_string(),
        });

        let mut chat = ChatController::new(session());
        chat.send(&backend, "hello").await;

        assert_eq!(
            chat.messages(),
            [Message::user("hello"), Message::assistant(FALLBACK_REPLY)]
        );
        assert!(!chat.is_awaiting_response());
    }

    #[tokio::test]
    async fn multiple_replies_keep_order_and_drop_echoes() {
        let backend = ScriptedBackend::new();
        backend.push_reply(ConversationResponse::reply(
            session(),
            vec![
                Message::user("echo"),
                Message::assistant("a"),
                Message::assistant("b"),
            ],
        ));

        let mut chat = ChatController::new(session());
        chat.send(&backend, "q").await;

        let contents: Vec<&str> = chat.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["q", "a", "b"]);
    }

    #[tokio::test]
    async fn interrupt_fields_are_ignored() {
        let backend = ScriptedBackend::new();
        backend.push_reply(reply("done").with_interrupt(
            InterruptKind::SourceApproval,
            InterruptData::default(),
            "i-1",
        ));

        let mut chat = ChatController::new(session());
        chat.send(&backend, "q").await;
        assert_eq!(chat.state(), TurnState::Idle);
    }

    #[test]
    fn input_while_awaiting_is_ignored() {
        let mut chat = ChatController::new(session());
        assert!(chat.begin_turn("first").is_some());
        assert_eq!(chat.state(), TurnState::AwaitingResponse);

        assert!(chat.begin_turn("second").is_none());
        assert_eq!(chat.messages(), [Message::user("first")]);
    }

    #[test]
    fn blank_input_sends_nothing() {
        let mut chat = ChatController::new(session());
        assert!(chat.begin_turn("").is_none());
        assert!(chat.begin_turn(" \t").is_none());
        assert!(chat.messages().is_empty());
    }

    #[test]
    fn resumed_history_is_kept() {
        let chat = ChatController::resume(
            session(),
            vec![Message::user("old"), Message::assistant("answer")],
        );
        assert_eq!(chat.messages().len(), 2);
        assert_eq!(chat.session_id(), &session());
    }
}
