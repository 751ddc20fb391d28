//! Wire types for the backend REST API.
//!
//! These types mirror the JSON bodies of the consultation and research
//! services. Both services share one response shape; the interrupt fields
//! are only ever populated by research.

use lexora_core::{Interrupt, InterruptData, InterruptKind, Message, SessionId};
use serde::{Deserialize, Serialize};

// =============================================================================
// Requests
// =============================================================================

/// Body of a send-message request.
#[derive(Debug, Serialize)]
pub(crate) struct SendMessageRequest<'a> {
    pub messages: &'a [Message],
    pub session_id: &'a SessionId,
}

// =============================================================================
// Responses
// =============================================================================

/// Response for creating a session.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CreateSessionResponse {
    pub session_id: SessionId,
}

/// Response for fetching a session's history.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Response for sending a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationResponse {
    /// New messages produced by the turn.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Session the turn belongs to.
    pub session_id: SessionId,
    /// Set when the backend paused the turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupt_type: Option<InterruptKind>,
    /// Payload describing the pause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupt_data: Option<InterruptData>,
    /// Backend tracking token for the pause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupt_id: Option<String>,
}

impl ConversationResponse {
    /// A plain reply with no interrupt.
    #[must_use]
    pub fn reply(session_id: SessionId, messages: Vec<Message>) -> Self {
        Self {
            messages,
            session_id,
            interrupt_type: None,
            interrupt_data: None,
            interrupt_id: None,
        }
    }

    /// Attach an interrupt to the reply.
    #[must_use]
    pub fn with_interrupt(
        mut self,
        kind: InterruptKind,
        data: InterruptData,
        id: impl Into<String>,
    ) -> Self {
        self.interrupt_type = Some(kind);
        self.interrupt_data = Some(data);
        self.interrupt_id = Some(id.into());
        self
    }

    /// Split into the assistant messages and the interrupt, if any.
    ///
    /// Messages with any other role are dropped.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Message>, Option<Interrupt>) {
        let interrupt =
            Interrupt::from_parts(self.interrupt_type, self.interrupt_data, self.interrupt_id);
        let messages = self
            .messages
            .into_iter()
            .filter(Message::is_assistant)
            .collect();
        (messages, interrupt)
    }
}

/// Response from a service health check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthResponse {
    /// Reported status, `healthy` when up.
    pub status: String,
    /// Service name, e.g. `consultation` or `research`.
    #[serde(default)]
    pub service: Option<String>,
}

impl HealthResponse {
    /// Whether the service reported itself healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

// =============================================================================
// Error Response
// =============================================================================

/// Error body returned by the backend (`{"detail": ...}`).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub detail: serde_json::Value,
}

impl ApiErrorResponse {
    /// Flatten the detail into a single message.
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(detail) => detail.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexora_core::Role;

    #[test]
    fn chat_response_has_no_interrupt() {
        let response: ConversationResponse = serde_json::from_value(serde_json::json!({
            "messages": [{ "role": "assistant", "content": "Answer" }],
            "session_id": "s1"
        }))
        .unwrap();

        let (messages, interrupt) = response.into_parts();
        assert_eq!(messages, [Message::assistant("Answer")]);
        assert!(interrupt.is_none());
    }

    #[test]
    fn into_parts_keeps_only_assistant_messages() {
        let response = ConversationResponse::reply(
            SessionId::new("s1").unwrap(),
            vec![
                Message::user("echoed question"),
                Message::assistant("first"),
                Message {
                    role: Role::System,
                    content: "hidden".to_string(),
                },
                Message::assistant("second"),
            ],
        );

        let (messages, _) = response.into_parts();
        assert_eq!(messages, [Message::assistant("first"), Message::assistant("second")]);
    }

    #[test]
    fn interrupt_needs_type_and_data() {
        let response: ConversationResponse = serde_json::from_value(serde_json::json!({
            "messages": [],
            "session_id": "s1",
            "interrupt_type": "source_approval",
            "interrupt_id": "int-1"
        }))
        .unwrap();
        assert!(response.into_parts().1.is_none());
    }

    #[test]
    fn error_detail_message() {
        let err: ApiErrorResponse =
            serde_json::from_str(r#"{"detail":"Error processing research chat"}"#).unwrap();
        assert_eq!(err.message(), "Error processing research chat");

        let err: ApiErrorResponse =
            serde_json::from_str(r#"{"detail":[{"loc":["body"],"msg":"field required"}]}"#)
                .unwrap();
        assert!(err.message().contains("field required"));
    }
}
