//! Research interrupts.
//!
//! The research backend can pause a turn and hand the user a decision. The
//! paused turn is described by an [`Interrupt`]. A conversation holds at most
//! one of these at a time.

use serde::{Deserialize, Serialize};

/// What the backend is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptKind {
    /// Approve or reject candidate sources before drafting.
    SourceApproval,
    /// Review drafted artifacts.
    ArtifactReview,
}

/// A candidate source offered for approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Backend document identifier, echoed back in approval messages.
    pub document_id: String,
    /// Document title.
    #[serde(default)]
    pub title: String,
    /// Relevance in `[0, 1]`.
    #[serde(default)]
    pub relevance_score: f64,
    /// Why the backend considers the document relevant.
    #[serde(default)]
    pub reasoning: String,
    /// Link to the document, may be empty.
    #[serde(default)]
    pub url: String,
}

/// Coarse relevance bucket for a source score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelevanceLabel {
    /// Score of at least 0.8.
    High,
    /// Score of at least 0.6.
    Medium,
    /// Anything lower.
    Low,
}

impl RelevanceLabel {
    /// Bucket a relevance score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::High
        } else if score >= 0.6 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Human-readable display string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl Source {
    /// Relevance bucket of this source.
    #[must_use]
    pub fn relevance_label(&self) -> RelevanceLabel {
        RelevanceLabel::from_score(self.relevance_score)
    }
}

/// A drafted artifact offered for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    /// Artifact identifier.
    pub id: String,
    /// Artifact title.
    #[serde(default)]
    pub title: String,
    /// Artifact type, e.g. `legal_analysis`.
    #[serde(rename = "type", default)]
    pub artifact_type: String,
    /// Current artifact body.
    #[serde(default)]
    pub content: String,
}

/// Payload of an interrupt. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterruptData {
    /// Sources offered for approval.
    #[serde(default)]
    pub sources: Vec<Source>,
    /// Artifacts offered for review.
    #[serde(default)]
    pub artifacts: Vec<ArtifactSummary>,
    /// Number of sources the backend offered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_sources: Option<u32>,
    /// The research question being worked on.
    #[serde(default)]
    pub question: String,
    /// Set when the search found nothing relevant enough to offer.
    #[serde(default)]
    pub no_relevant_sources: bool,
    /// How many candidates were found before relevance filtering.
    #[serde(default)]
    pub total_found: u32,
}

/// A paused conversation turn awaiting user input.
#[derive(Debug, Clone, PartialEq)]
pub struct Interrupt {
    /// What the backend is waiting for.
    pub kind: InterruptKind,
    /// Data needed to present the decision.
    pub data: InterruptData,
    /// Backend tracking token, empty when the backend sent none.
    pub id: String,
}

impl Interrupt {
    /// Assemble an interrupt from the optional response fields.
    ///
    /// Returns `None` unless both the kind and the payload are present.
    #[must_use]
    pub fn from_parts(
        kind: Option<InterruptKind>,
        data: Option<InterruptData>,
        id: Option<String>,
    ) -> Option<Self> {
        Some(Self {
            kind: kind?,
            data: data?,
            id: id.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relevance_buckets() {
        assert_eq!(RelevanceLabel::from_score(0.95), RelevanceLabel::High);
        assert_eq!(RelevanceLabel::from_score(0.8), RelevanceLabel::High);
        assert_eq!(RelevanceLabel::from_score(0.79), RelevanceLabel::Medium);
        assert_eq!(RelevanceLabel::from_score(0.6), RelevanceLabel::Medium);
        assert_eq!(RelevanceLabel::from_score(0.1), RelevanceLabel::Low);
    }

    #[test]
    fn data_defaults_when_fields_missing() {
        let data: InterruptData = serde_json::from_str("{}").unwrap();
        assert!(data.sources.is_empty());
        assert!(!data.no_relevant_sources);
        assert_eq!(data.total_found, 0);
        assert_eq!(data.total_sources, None);
    }

    #[test]
    fn data_parses_no_relevant_sources_payload() {
        let data: InterruptData = serde_json::from_value(serde_json::json!({
            "sources": [],
            "total_sources": 0,
            "question": "land lease terms",
            "no_relevant_sources": true,
            "total_found": 7
        }))
        .unwrap();
        assert!(data.no_relevant_sources);
        assert_eq!(data.total_found, 7);
        assert_eq!(data.question, "land lease terms");
    }

    #[test]
    fn from_parts_requires_kind_and_data() {
        assert!(Interrupt::from_parts(Some(InterruptKind::SourceApproval), None, None).is_none());
        assert!(Interrupt::from_parts(None, Some(InterruptData::default()), None).is_none());

        let interrupt = Interrupt::from_parts(
            Some(InterruptKind::ArtifactReview),
            Some(InterruptData::default()),
            None,
        )
        .unwrap();
        assert_eq!(interrupt.id, "");
        assert_eq!(interrupt.kind, InterruptKind::ArtifactReview);
    }
}
