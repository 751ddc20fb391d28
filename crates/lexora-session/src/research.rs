//! Research controller with interrupt handling.
//!
//! A research turn may end in a pause. The backend then expects the next
//! user message to answer it; for source approval the answer is produced
//! by a [`SourceApproval`] prompt. Any accepted send clears the pause.

use lexora_client::{ClientError, ConversationBackend, ConversationResponse};
use lexora_core::{ConversationKind, Interrupt, InterruptKind, Message, SessionId};

use crate::approval::{ApprovalDecision, RecoveryAction, SourceApproval};
use crate::conversation::{Conversation, TurnRequest, TurnState};

#[derive(Debug, Clone)]
struct PendingInterrupt {
    interrupt: Interrupt,
    approval: Option<SourceApproval>,
}

impl PendingInterrupt {
    fn new(interrupt: Interrupt) -> Self {
        let approval = (interrupt.kind == InterruptKind::SourceApproval)
            .then(|| SourceApproval::from_data(&interrupt.data));
        Self {
            interrupt,
            approval,
        }
    }
}

/// Drives a research conversation.
#[derive(Debug, Clone)]
pub struct ResearchController {
    conversation: Conversation,
    pending: Option<PendingInterrupt>,
}

impl ResearchController {
    /// Start with an empty history and no pending interrupt.
    #[must_use]
    pub fn new(session_id: SessionId) -> Self {
        Self::resume(session_id, Vec::new())
    }

    /// Continue a session from its stored history.
    ///
    /// History does not carry interrupts, so none is pending afterwards.
    #[must_use]
    pub fn resume(session_id: SessionId, history: Vec<Message>) -> Self {
        Self {
            conversation: Conversation::resume(ConversationKind::Research, session_id, history),
            pending: None,
        }
    }

    /// Accept user input and return the request to dispatch.
    ///
    /// Accepted input clears any pending interrupt. Rejected input (blank,
    /// or while awaiting a response) changes nothing.
    pub fn begin_turn(&mut self, input: &str) -> Option<TurnRequest> {
        let request = self.conversation.begin(input)?;
        if let Some(pending) = self.pending.take() {
            tracing::debug!(
                session_id = %self.conversation.session_id(),
                interrupt_id = %pending.interrupt.id,
                "Clearing interrupt"
            );
        }
        Some(request)
    }

    /// Record the outcome of the outstanding request.
    ///
    /// Assistant replies are appended in order and a complete interrupt in
    /// the reply becomes pending. On failure one fallback reply is appended
    /// and nothing is pending. Returns `false` if nothing was outstanding.
    pub fn finish_turn(&mut self, result: Result<ConversationResponse, ClientError>) -> bool {
        let (outcome, interrupt) = match result {
            Ok(response) => {
                let (messages, interrupt) = response.into_parts();
                (Ok(messages), interrupt)
            }
            Err(err) => (Err(err), None),
        };

        if !self.conversation.finish(outcome) {
            return false;
        }

        if let Some(interrupt) = interrupt {
            tracing::info!(
                session_id = %self.conversation.session_id(),
                interrupt_id = %interrupt.id,
                kind = ?interrupt.kind,
                sources = interrupt.data.sources.len(),
                "Research paused"
            );
            self.pending = Some(PendingInterrupt::new(interrupt));
        }
        true
    }

    /// Answer the pending source approval.
    ///
    /// Returns `None` if no source approval is pending or a request is
    /// outstanding.
    pub fn resolve(&mut self, decision: &ApprovalDecision) -> Option<TurnRequest> {
        self.approval()?;
        self.begin_turn(&decision.encode())
    }

    /// Submit the current selection of the pending prompt.
    pub fn submit_approval(&mut self) -> Option<TurnRequest> {
        let decision = self.approval()?.submit();
        self.resolve(&decision)
    }

    /// Reject every offered source. Does nothing when the prompt only
    /// offers recovery actions.
    pub fn skip_sources(&mut self) -> Option<TurnRequest> {
        let decision = self.approval()?.skip_all()?;
        self.resolve(&decision)
    }

    /// Pick a no-relevant-sources recovery action.
    pub fn recover(&mut self, action: RecoveryAction) -> Option<TurnRequest> {
        let decision = self.approval()?.recover(action);
        self.resolve(&decision)
    }

    /// Run a whole turn against `backend`. Returns whether the input was
    /// accepted.
    pub async fn send<B>(&mut self, backend: &B, input: &str) -> bool
    where
        B: ConversationBackend + ?Sized,
    {
        let request = self.begin_turn(input);
        self.complete(backend, request).await
    }

    /// Resolve the pending source approval and run the turn.
    pub async fn resolve_with<B>(&mut self, backend: &B, decision: &ApprovalDecision) -> bool
    where
        B: ConversationBackend + ?Sized,
    {
        let request = self.resolve(decision);
        self.complete(backend, request).await
    }

    async fn complete<B>(&mut self, backend: &B, request: Option<TurnRequest>) -> bool
    where
        B: ConversationBackend + ?Sized,
    {
        let Some(request) = request else {
            return false;
        };
        let result = request.dispatch(backend).await;
        self.finish_turn(result);
        true
    }

    /// The pending interrupt, if any.
    #[must_use]
    pub fn interrupt(&self) -> Option<&Interrupt> {
        self.pending.as_ref().map(|p| &p.interrupt)
    }

    /// Selection state for a pending source approval.
    #[must_use]
    pub fn approval(&self) -> Option<&SourceApproval> {
        self.pending.as_ref()?.approval.as_ref()
    }

    /// Mutable selection state for a pending source approval.
    pub fn approval_mut(&mut self) -> Option<&mut SourceApproval> {
        self.pending.as_mut()?.approval.as_mut()
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
        } else if self.pending.is_some() {
            TurnState::AwaitingInterruptResolution
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
