//! Core types for the Lexora legal assistant client.
//!
//! This crate provides the data model shared by every other Lexora crate:
//!
//! - **Identifiers**: the opaque [`SessionId`] handed out by the backend
//! - **Messages**: [`Role`] and [`Message`], the unit of conversation history
//! - **Interrupts**: [`Interrupt`] and its payload, used when the research
//!   backend pauses a turn to ask the user something
//!
//! # Example
//!
//! ```
//! use lexora_core::{ConversationKind, Message, SessionId};
//!
//! let session = SessionId::new("3f2b9c4e-session").unwrap();
//! let question = Message::user("What is the statute of limitations for contracts?");
//!
//! assert_eq!(ConversationKind::Research.path(), "research/chat");
//! assert_eq!(session.as_str(), "3f2b9c4e-session");
//! assert!(question.is_user());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod interrupt;
pub mod message;

pub use error::{IdError, Result};
pub use ids::{ConversationKind, SessionId};
pub use interrupt::{
    ArtifactSummary, Interrupt, InterruptData, InterruptKind, RelevanceLabel, Source,
};
pub use message::{Message, Role};
