//! Text transforms for assistant messages.
//!
//! Assistant replies are free-form text that may carry two kinds of inline
//! structure:
//!
//! - `<artifact ...>...</artifact>` blocks holding generated documents,
//!   extracted by [`parse_artifacts`]
//! - markdown-style `[label](https://...)` links, split out by [`parse_links`]
//!
//! [`render_message`] decides which of the two applies to a message. All
//! functions here are pure; nothing is cached between calls.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod artifact;
pub mod links;
pub mod message;

pub use artifact::{contains_artifact_markup, parse_artifacts, Artifact, ArtifactStage, ParsedArtifacts};
pub use links::{parse_links, Segment};
pub use message::{render_message, RenderedMessage};
