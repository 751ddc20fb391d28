//! Per-message render dispatch.

use lexora_core::Message;

use crate::artifact::{contains_artifact_markup, parse_artifacts, Artifact};
use crate::links::{parse_links, Segment};

/// How a message body should be presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedMessage<'a> {
    /// Show the text as-is.
    Plain(&'a str),
    /// Assistant text split into literal runs and links.
    Linked(Vec<Segment<'a>>),
    /// Assistant text carrying document blocks.
    Artifacts {
        /// Surrounding text with the blocks removed, trimmed. May be empty.
        preamble: String,
        /// Extracted blocks in document order.
        artifacts: Vec<Artifact>,
    },
}

/// Pick the presentation for one message.
///
/// Assistant messages with artifact blocks go through the artifact parser,
/// falling back to raw text if the markup does not parse. Other assistant
/// messages go through the link splitter. Everything else is plain.
#[must_use]
pub fn render_message(message: &Message) -> RenderedMessage<'_> {
    if !message.is_assistant() {
        return RenderedMessage::Plain(&message.content);
    }

    if contains_artifact_markup(&message.content) {
        let parsed = parse_artifacts(&message.content);
        if parsed.is_empty() {
            return RenderedMessage::Plain(&message.content);
        }
        return RenderedMessage::Artifacts {
            preamble: parsed.residual.trim().to_string(),
            artifacts: parsed.artifacts,
        };
    }

    RenderedMessage::Linked(parse_links(&message.content))
}
