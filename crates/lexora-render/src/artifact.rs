//! Artifact block extraction.
//!
//! The research backend embeds generated documents in its replies as
//! pseudo-XML blocks:
//!
//! ```text
//! <artifact command="create" artifact_id="a1" title="Lease analysis" type="legal_analysis" stage="draft">
//! ...document body...
//! </artifact>
//! ```
//!
//! The scanner is shallow. An opening tag needs at least one
//! attribute character after `<artifact` and whitespace. A block runs to the
//! *nearest* closing tag, so nested blocks are not supported: the outer block
//! ends at the inner block's close tag. Anything that does not fit this
//! shape stays in the text untouched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const OPEN_TAG: &str = "<artifact";
const CLOSE_TAG: &str = "</artifact>";

/// Bodies longer than this are shown collapsed by default.
pub const COLLAPSE_THRESHOLD: usize = 200;

/// A document block extracted from an assistant message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// What the backend did with the artifact. Defaults to `create`.
    pub command: String,
    /// Identifier, unique within one parse pass.
    pub artifact_id: String,
    /// Document title.
    pub title: Option<String>,
    /// Document type, e.g. `legal_analysis`.
    pub artifact_type: Option<String>,
    /// Drafting stage, e.g. `draft`.
    pub stage: Option<String>,
    /// Body between the tags, trimmed.
    pub content: String,
}

/// Drafting stage of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactStage {
    /// First version.
    Draft,
    /// Under review.
    Review,
    /// Finished.
    Final,
    /// Missing or unrecognized.
    Other,
}

impl Artifact {
    fn from_block(attributes: &str, body: &str) -> Self {
        let attrs = parse_attributes(attributes);
        let lookup = |name: &str| {
            attrs
                .iter()
                .rev()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        Self {
            command: lookup("command").unwrap_or_else(|| "create".to_string()),
            artifact_id: lookup("artifact_id").unwrap_or_else(generate_artifact_id),
            title: lookup("title"),
            artifact_type: lookup("type"),
            stage: lookup("stage"),
            content: body.trim().to_string(),
        }
    }

    /// Title to show, falling back to the identifier.
    #[must_use]
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => format!("Document {}", self.artifact_id),
        }
    }

    /// Type as a label, with the first underscore turned into a space.
    #[must_use]
    pub fn type_label(&self) -> Option<String> {
        self.artifact_type
            .as_deref()
            .map(|kind| kind.replacen('_', " ", 1))
    }

    /// Classify the stage attribute.
    #[must_use]
    pub fn stage(&self) -> ArtifactStage {
        match self.stage.as_deref() {
            Some("draft") => ArtifactStage::Draft,
            Some("review") => ArtifactStage::Review,
            Some("final") => ArtifactStage::Final,
            _ => ArtifactStage::Other,
        }
    }

    /// Whether the body is long enough to be collapsed.
    #[must_use]
    pub fn is_long(&self) -> bool {
        self.content.chars().count() > COLLAPSE_THRESHOLD
    }

    /// File name used when saving the artifact: `<title or id>.txt`.
    #[must_use]
    pub fn file_name(&self) -> String {
        let stem = self.title.as_deref().unwrap_or(&self.artifact_id);
        let stem: String = stem
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
            .collect();
        format!("{stem}.txt")
    }

    /// Write the body to `dir/<file_name>`, returning the written path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn export(&self, dir: &Path) -> io::Result<PathBuf> {
        let path = dir.join(self.file_name());
        fs::write(&path, &self.content)?;
        tracing::debug!(artifact_id = %self.artifact_id, path = %path.display(), "Artifact exported");
        Ok(path)
    }
}

/// Result of scanning a text for artifact blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArtifacts {
    /// Extracted blocks in document order.
    pub artifacts: Vec<Artifact>,
    /// The input with every extracted block removed. Not trimmed.
    pub residual: String,
}

impl ParsedArtifacts {
    /// Whether no block was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

/// Cheap check for whether a text might carry artifact markup.
#[must_use]
pub fn contains_artifact_markup(text: &str) -> bool {
    text.contains(OPEN_TAG)
}

/// Extract every artifact block from `text`, in document order.
///
/// Malformed markup is never an error; it simply stays in the residual text.
#[must_use]
pub fn parse_artifacts(text: &str) -> ParsedArtifacts {
    let mut artifacts = Vec::new();
    let mut residual = String::with_capacity(text.len());
    let mut cursor = 0;

    while let Some(block) = next_block(text, cursor) {
        residual.push_str(&text[cursor..block.start]);
        artifacts.push(Artifact::from_block(block.attributes, block.body));
        cursor = block.end;
    }
    residual.push_str(&text[cursor..]);

    ParsedArtifacts {
        artifacts,
        residual,
    }
}

/// Byte span of one block inside the scanned text.
struct Block<'a> {
    start: usize,
    end: usize,
    attributes: &'a str,
    body: &'a str,
}

/// Find the first well-formed block starting at or after `from`.
fn next_block(text: &str, from: usize) -> Option<Block<'_>> {
    let mut search = from;
    loop {
        let start = search + text[search..].find(OPEN_TAG)?;
        if let Some(block) = block_at(text, start) {
            return Some(block);
        }
        search = start + OPEN_TAG.len();
    }
}

/// Try to read a block whose opening tag starts exactly at `start`.
fn block_at(text: &str, start: usize) -> Option<Block<'_>> {
    let head_start = start + OPEN_TAG.len();
    let head = &text[head_start..];

    let separator = head.chars().next().filter(|c| c.is_whitespace())?;
    let head_len = head.find('>')?;
    let attributes = &head[separator.len_utf8()..head_len];
    if attributes.is_empty() {
        return None;
    }

    let body_start = head_start + head_len + 1;
    let body_len = text[body_start..].find(CLOSE_TAG)?;

    Some(Block {
        start,
        end: body_start + body_len + CLOSE_TAG.len(),
        attributes,
        body: &text[body_start..body_start + body_len],
    })
}

/// Scan `key="value"` pairs, skipping anything in between.
fn parse_attributes(input: &str) -> Vec<(&str, &str)> {
    let bytes = input.as_bytes();
    let mut attrs = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if !is_word_byte(bytes[i]) {
            i += 1;
            continue;
        }

        let key_end = i + bytes[i..].iter().take_while(|b| is_word_byte(**b)).count();
        if bytes[key_end..].starts_with(b"=\"") {
            let value_start = key_end + 2;
            if let Some(value_len) = bytes[value_start..].iter().position(|b| *b == b'"') {
                attrs.push((
                    &input[i..key_end],
                    &input[value_start..value_start + value_len],
                ));
                i = value_start + value_len + 1;
                continue;
            }
        }
        i = key_end;
    }

    attrs
}

const fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn generate_artifact_id() -> String {
    format!("artifact_{}", uuid::Uuid::new_v4().simple())
}
