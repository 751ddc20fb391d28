//! Source approval prompt.
//!
//! When research pauses for source approval, the user picks which of the
//! offered sources the backend may use. The decision travels back as an
//! ordinary user message whose text the backend matches literally:
//!
//! | Decision | Message |
//! |---|---|
//! | nothing approved | `none` |
//! | every offered source approved | `all` |
//! | a strict subset | `approved: <id>, <id>, ...` |
//! | no relevant sources, try again | `retry` |
//! | no relevant sources, loosen the search | `broaden` |
//! | no relevant sources, use what was found | `proceed` |
//!
//! Subset ids are listed in the order the sources were offered.

use std::collections::HashSet;
use std::fmt;

use lexora_core::{InterruptData, Source};

/// Recovery options when no source was relevant enough to offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoveryAction {
    /// Search again with a different approach.
    Retry,
    /// Lower the relevance threshold.
    Broaden,
    /// Continue with the best sources found.
    Proceed,
}

impl RecoveryAction {
    /// All actions in menu order.
    pub const ALL: [Self; 3] = [Self::Retry, Self::Broaden, Self::Proceed];

    /// Wire encoding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Retry => "retry",
            Self::Broaden => "broaden",
            Self::Proceed => "proceed",
        }
    }

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Retry => "Try a different search approach",
            Self::Broaden => "Broaden the search criteria",
            Self::Proceed => "Proceed with best available sources",
        }
    }
}

/// The user's answer to a source approval interrupt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalDecision {
    /// Reject every source.
    None,
    /// Approve every offered source.
    All,
    /// Approve these document ids, in offered order.
    Approved(Vec<String>),
    /// No-relevant-sources recovery.
    Recovery(RecoveryAction),
}

impl ApprovalDecision {
    /// Classify a selection against the number of offered sources.
    #[must_use]
    pub fn from_selection(selected: Vec<String>, offered: usize) -> Self {
        if selected.is_empty() {
            Self::None
        } else if selected.len() == offered {
            Self::All
        } else {
            Self::Approved(selected)
        }
    }

    /// Message text sent to the backend.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::None => "none".to_string(),
            Self::All => "all".to_string(),
            Self::Approved(ids) => format!("approved: {}", ids.join(", ")),
            Self::Recovery(action) => action.as_str().to_string(),
        }
    }
}

impl fmt::Display for ApprovalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Selection state over the offered sources.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceApproval {
    sources: Vec<Source>,
    question: String,
    no_relevant_sources: bool,
    total_found: u32,
    selected: HashSet<String>,
    focused: usize,
}

impl SourceApproval {
    /// Build a prompt from an interrupt payload. Nothing starts selected.
    #[must_use]
    pub fn from_data(data: &InterruptData) -> Self {
        Self {
            sources: data.sources.clone(),
            question: data.question.clone(),
            no_relevant_sources: data.no_relevant_sources,
            total_found: data.total_found,
            selected: HashSet::new(),
            focused: 0,
        }
    }

    /// Offered sources, in backend order.
    #[must_use]
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// The research question.
    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Whether this is the no-relevant-sources variant.
    #[must_use]
    pub fn no_relevant_sources(&self) -> bool {
        self.no_relevant_sources
    }

    /// Candidates found before relevance filtering.
    #[must_use]
    pub fn total_found(&self) -> u32 {
        self.total_found
    }

    /// Flip one source. Returns the new selection state, or `None` for an
    /// id that was not offered.
    pub fn toggle(&mut self, document_id: &str) -> Option<bool> {
        if !self.sources.iter().any(|s| s.document_id == document_id) {
            return None;
        }
        if self.selected.remove(document_id) {
            Some(false)
        } else {
            self.selected.insert(document_id.to_string());
            Some(true)
        }
    }

    /// Select every offered source.
    pub fn select_all(&mut self) {
        self.selected = self.sources.iter().map(|s| s.document_id.clone()).collect();
    }

    /// Clear the selection.
    pub fn select_none(&mut self) {
        self.selected.clear();
    }

    /// Whether a source is selected.
    #[must_use]
    pub fn is_selected(&self, document_id: &str) -> bool {
        self.selected.contains(document_id)
    }

    /// Number of selected sources.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Selected ids in offered order.
    #[must_use]
    pub fn selected_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.sources
            .iter()
            .map(|s| s.document_id.as_str())
            .filter(|id| self.selected.contains(*id) && seen.insert(*id))
            .map(str::to_string)
            .collect()
    }

    /// Decision for "approve selected".
    #[must_use]
    pub fn submit(&self) -> ApprovalDecision {
        let offered: HashSet<&str> = self.sources.iter().map(|s| s.document_id.as_str()).collect();
        ApprovalDecision::from_selection(self.selected_ids(), offered.len())
    }

    /// Decision for "skip all". Same encoding as submitting nothing.
    ///
    /// Returns `None` in the no-relevant-sources variant, which only offers
    /// recovery actions.
    #[must_use]
    pub fn skip_all(&self) -> Option<ApprovalDecision> {
        (!self.no_relevant_sources).then_some(ApprovalDecision::None)
    }

    /// Decision for a no-relevant-sources recovery action.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn recover(&self, action: RecoveryAction) -> ApprovalDecision {
        ApprovalDecision::Recovery(action)
    }

    // =========================================================================
    // Focus (keyboard navigation)
    // =========================================================================

    /// Number of focusable rows: sources, or recovery actions.
    fn row_count(&self) -> usize {
        if self.no_relevant_sources {
            RecoveryAction::ALL.len()
        } else {
            self.sources.len()
        }
    }

    /// Index of the focused row.
    #[must_use]
    pub fn focused(&self) -> usize {
        self.focused
    }

    /// Move focus down, wrapping.
    pub fn focus_next(&mut self) {
        let rows = self.row_count();
        if rows > 0 {
            self.focused = (self.focused + 1) % rows;
        }
    }

    /// Move focus up, wrapping.
    pub fn focus_prev(&mut self) {
        let rows = self.row_count();
        if rows > 0 {
            self.focused = (self.focused + rows - 1) % rows;
        }
    }

    /// Toggle the focused source.
    pub fn toggle_focused(&mut self) -> Option<bool> {
        let id = self.sources.get(self.focused)?.document_id.clone();
        self.toggle(&id)
    }

    /// Recovery action under focus, in the no-relevant-sources variant.
    #[must_use]
    pub fn focused_recovery(&self) -> Option<RecoveryAction> {
        if !self.no_relevant_sources {
            return None;
        }
        RecoveryAction::ALL.get(self.focused).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: &str) -> Source {
        Source {
            document_id: id.to_string(),
            title: format!("Title {id}"),
            relevance_score: 0.7,
            reasoning: String::new(),
            url: String::new(),
        }
    }

    fn prompt(ids: &[&str]) -> SourceApproval {
        SourceApproval::from_data(&InterruptData {
            sources: ids.iter().map(|id| source(id)).collect(),
            question: "lease termination".to_string(),
            ..InterruptData::default()
        })
    }

    #[test]
    fn select_all_encodes_all() {
        let mut p = prompt(&["id1", "id2", "id3"]);
        p.select_all();
        assert_eq!(p.submit().encode(), "all");
    }

    #[test]
    fn toggling_every_source_encodes_all() {
        let mut p = prompt(&["id1", "id2"]);
        p.toggle("id2");
        p.toggle("id1");
        assert_eq!(p.submit(), ApprovalDecision::All);
    }

    #[test]
    fn empty_selection_and_skip_encode_none() {
        let mut p = prompt(&["id1", "id2"]);
        assert_eq!(p.submit().encode(), "none");
        assert_eq!(p.skip_all().unwrap().encode(), "none");

        p.select_all();
        p.select_none();
        assert_eq!(p.submit().encode(), "none");
    }

    #[test]
    fn subset_is_listed_in_offered_order() {
        let mut p = prompt(&["id1", "id2", "id3", "id4", "id5"]);
        p.toggle("id3");
        p.toggle("id1");
        assert_eq!(p.submit().encode(), "approved: id1, id3");
    }

    #[test]
    fn toggle_twice_deselects() {
        let mut p = prompt(&["id1", "id2"]);
        assert_eq!(p.toggle("id1"), Some(true));
        assert_eq!(p.toggle("id1"), Some(false));
        assert_eq!(p.selected_count(), 0);
    }

    #[test]
    fn unknown_id_is_not_selectable() {
        let mut p = prompt(&["id1"]);
        assert_eq!(p.toggle("other"), None);
        assert!(!p.is_selected("other"));
    }

    #[test]
    fn recovery_encodings() {
        let p = SourceApproval::from_data(&InterruptData {
            no_relevant_sources: true,
            total_found: 4,
            ..InterruptData::default()
        });
        assert!(p.no_relevant_sources());
        assert_eq!(p.total_found(), 4);
        assert_eq!(p.skip_all(), None);
        assert_eq!(p.recover(RecoveryAction::Retry).encode(), "retry");
        assert_eq!(p.recover(RecoveryAction::Broaden).encode(), "broaden");
        assert_eq!(p.recover(RecoveryAction::Proceed).encode(), "proceed");
    }

    #[test]
    fn focus_wraps_over_sources() {
        let mut p = prompt(&["a", "b", "c"]);
        p.focus_prev();
        assert_eq!(p.focused(), 2);
        assert_eq!(p.toggle_focused(), Some(true));
        assert!(p.is_selected("c"));
        p.focus_next();
        assert_eq!(p.focused(), 0);
        assert_eq!(p.focused_recovery(), None);
    }

    #[test]
    fn focus_walks_recovery_actions() {
        let mut p = SourceApproval::from_data(&InterruptData {
            no_relevant_sources: true,
            ..InterruptData::default()
        });
        assert_eq!(p.focused_recovery(), Some(RecoveryAction::Retry));
        p.focus_next();
        assert_eq!(p.focused_recovery(), Some(RecoveryAction::Broaden));
        assert_eq!(p.toggle_focused(), None);
    }
}
