//! Identifier types for Lexora conversations.
//!
//! Session IDs are minted by the backend. The client never inspects them,
//! it only echoes them back on every request for the same conversation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IdError;

/// An opaque session token issued by the backend.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Wrap a backend-issued session token.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Empty`] if the token is empty or only whitespace.
    pub fn new(token: impl Into<String>) -> Result<Self, IdError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(token))
    }

    /// Return the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SessionId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SessionId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Which backend service a conversation talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    /// Question and answer consultation.
    Chat,
    /// Source-backed research with human-in-the-loop interrupts.
    Research,
}

impl ConversationKind {
    /// Path of the conversation endpoint, relative to the API base.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Chat => "qna/chat",
            Self::Research => "research/chat",
        }
    }

    /// Path prefix of the owning service, relative to the API base.
    #[must_use]
    pub const fn service_path(self) -> &'static str {
        match self {
            Self::Chat => "qna",
            Self::Research => "research",
        }
    }

    /// Human-readable display string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "Chat",
            Self::Research => "Research",
        }
    }

    /// The other kind.
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Chat => Self::Research,
            Self::Research => Self::Chat,
        }
    }
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_rejects_blank() {
        assert_eq!(SessionId::new(""), Err(IdError::Empty));
        assert_eq!(SessionId::new("   "), Err(IdError::Empty));
    }

    #[test]
    fn session_id_is_opaque() {
        let id: SessionId = "not-a-uuid/at all".parse().unwrap();
        assert_eq!(id.to_string(), "not-a-uuid/at all");
    }

    #[test]
    fn session_id_serde() {
        let id: SessionId = serde_json::from_str("\"abc-123\"").unwrap();
        assert_eq!(id.as_str(), "abc-123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc-123\"");
        assert!(serde_json::from_str::<SessionId>("\"\"").is_err());
    }

    #[test]
    fn kind_paths() {
        assert_eq!(ConversationKind::Chat.path(), "qna/chat");
        assert_eq!(ConversationKind::Research.path(), "research/chat");
        assert_eq!(ConversationKind::Chat.service_path(), "qna");
        assert_eq!(ConversationKind::Chat.toggle(), ConversationKind::Research);
    }
}
