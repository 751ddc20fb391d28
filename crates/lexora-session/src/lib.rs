//! Conversation controllers.
//!
//! A controller owns one conversation: its session token, its append-only
//! message history, and a single in-flight guard. Two flavours exist:
//!
//! - [`ChatController`]: a plain question and answer loop
//! - [`ResearchController`]: the same loop plus at most one pending
//!   [`Interrupt`](lexora_core::Interrupt), resolved through a
//!   [`SourceApproval`] prompt
//!
//! Sending is split in two halves so a host event loop can keep running
//! while a request is outstanding:
//!
//! ```text
//!   begin_turn(input) ──▶ TurnRequest ──▶ backend ──▶ finish_turn(result)
//!        │                                                  │
//!        └── Idle ──▶ AwaitingResponse ──▶ Idle | AwaitingInterruptResolution
//! ```
//!
//! The `send` helpers run both halves back to back for callers that can
//! simply await.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod approval;
pub mod chat;
pub mod conversation;
pub mod research;

#[cfg(test)]
mod testing;

pub use approval::{ApprovalDecision, RecoveryAction, SourceApproval};
pub use chat::ChatController;
pub use conversation::{TurnRequest, TurnState, FALLBACK_REPLY};
pub use research::ResearchController;
