//! Tab, focus, dirty, and filter state for one editing session.
//!
//! The session holds id references only. Bodies and metadata belong to the
//! document store; keeping content out of here means what is displayed can
//! never diverge from what is stored.

use std::collections::HashSet;

use tracing::warn;

use quill_api::DocumentId;

/// Which documents are open as tabs, which is focused, which have unsaved
/// edits, and the current search filter.
///
/// Per-id state machine: `Closed → Open → Active`, back to `Closed` on close
/// or delete. An id can never be active without being open.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    open_ids: Vec<DocumentId>,
    active_id: Option<DocumentId>,
    unsaved_ids: HashSet<DocumentId>,
    search_filter: String,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `id` as a tab (appending, never reordering existing tabs) and
    /// focus it. Idempotent on repeat calls with the same id.
    pub fn open_tab(&mut self, id: &DocumentId) {
        if !self.open_ids.contains(id) {
            self.open_ids.push(id.clone());
        }
        self.active_id = Some(id.clone());
    }

    /// Focus an already-open tab. Returns false (and changes nothing) if the
    /// id is not open, so an active id can never reference a closed tab.
    pub fn focus_tab(&mut self, id: &DocumentId) -> bool {
        if self.open_ids.contains(id) {
            self.active_id = Some(id.clone());
            true
        } else {
            warn!(%id, "focus on a tab that is not open; ignored");
            false
        }
    }

    /// Close the tab for `id`. If it was the active tab, the first remaining
    /// tab in original order becomes active, or none if no tabs remain.
    pub fn close_tab(&mut self, id: &DocumentId) {
        self.open_ids.retain(|open| open != id);
        if self.active_id.as_ref() == Some(id) {
            self.active_id = self.open_ids.first().cloned();
        }
    }

    pub fn mark_dirty(&mut self, id: &DocumentId) {
        self.unsaved_ids.insert(id.clone());
    }

    pub fn clear_dirty(&mut self, id: &DocumentId) {
        self.unsaved_ids.remove(id);
    }

    /// Replace the search filter. Empty means "no filter, show all".
    pub fn set_filter(&mut self, keyword: impl Into<String>) {
        self.search_filter = keyword.into();
    }

    /// Whether `title` passes the current filter (literal, case-sensitive
    /// substring match; not a pattern language).
    pub fn matches_filter(&self, title: &str) -> bool {
        self.search_filter.is_empty() || title.contains(&self.search_filter)
    }

    pub fn open_ids(&self) -> &[DocumentId] {
        &self.open_ids
    }

    pub fn active_id(&self) -> Option<&DocumentId> {
        self.active_id.as_ref()
    }

    pub fn unsaved_ids(&self) -> &HashSet<DocumentId> {
        &self.unsaved_ids
    }

    pub fn filter(&self) -> &str {
        &self.search_filter
    }

    pub fn is_open(&self, id: &DocumentId) -> bool {
        self.open_ids.contains(id)
    }

    pub fn is_dirty(&self, id: &DocumentId) -> bool {
        self.unsaved_ids.contains(id)
    }
}
