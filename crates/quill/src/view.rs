//! Projection of store + session into what the presentation layer renders.
//!
//! The view model is re-derived after every state change and carries ids,
//! titles, and flags — never bodies — except for the single active document,
//! whose body the editor widget needs.

use std::collections::HashSet;

use serde::Serialize;

use quill_api::DocumentId;

use crate::session::SessionState;
use crate::store::DocumentStore;

/// One row in the document list or tab strip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentListItem {
    pub id: DocumentId,
    pub title: String,
    pub is_new: bool,
    pub is_unsaved: bool,
}

/// The focused document, with its body (if loaded) for the editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveDocument {
    pub id: DocumentId,
    pub title: String,
    pub body: Option<String>,
    pub is_unsaved: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ViewModel {
    /// Documents matching the current filter, ordered by creation time.
    pub documents: Vec<DocumentListItem>,
    /// Open documents in tab order.
    pub open_documents: Vec<DocumentListItem>,
    pub active: Option<ActiveDocument>,
    pub unsaved_ids: HashSet<DocumentId>,
}

pub fn derive_view(store: &DocumentStore, session: &SessionState) -> ViewModel {
    let item = |id: &DocumentId| {
        store.get(id).map(|doc| DocumentListItem {
            id: doc.id.clone(),
            title: doc.title.clone(),
            is_new: doc.is_new,
            is_unsaved: session.is_dirty(&doc.id),
        })
    };

    let mut documents: Vec<_> = store
        .documents()
        .filter(|doc| session.matches_filter(&doc.title))
        .map(|doc| (doc.created_at, doc.id.clone()))
        .collect();
    documents.sort();
    let documents = documents
        .into_iter()
        .filter_map(|(_, id)| item(&id))
        .collect();

    // Tabs may briefly reference ids the store already dropped (the close
    // command is queued right behind the purge); skip them instead of
    // rendering ghosts.
    let open_documents = session.open_ids().iter().filter_map(item).collect();

    let active = session.active_id().and_then(|id| {
        store.get(id).map(|doc| ActiveDocument {
            id: doc.id.clone(),
            title: doc.title.clone(),
            body: doc.body.clone(),
            is_unsaved: session.is_dirty(&doc.id),
        })
    });

    ViewModel {
        documents,
        open_documents,
        active,
        unsaved_ids: session.unsaved_ids().clone(),
    }
}
