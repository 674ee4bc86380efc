//! Per-document undo/redo history of structural edits.
//!
//! Each document owns an independent pair of stacks. Pushing a new action
//! clears that document's redo stack, and the undo stack is bounded by
//! `max_depth` with the oldest entries dropped first.

use parking_lot::Mutex;
use sitetree_core::{DocumentId, HistoryAction};
use sitetree_events::{Event, EventBus};
use std::collections::HashMap;
use std::sync::Arc;

/// History shared between the sessions of one editor process.
pub type SharedHistory = Arc<Mutex<HistoryStore>>;

pub const DEFAULT_MAX_DEPTH: usize = 50;

#[derive(Debug, Default)]
struct DocumentHistory {
    undo_stack: Vec<HistoryAction>,
    redo_stack: Vec<HistoryAction>,
}

pub struct HistoryStore {
    documents: HashMap<DocumentId, DocumentHistory>,
    max_depth: usize,
    event_bus: Option<EventBus>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl HistoryStore {
    pub fn new(max_depth: usize) -> Self {
        Self {
            documents: HashMap::new(),
            max_depth: max_depth.max(1),
            event_bus: None,
        }
    }

    /// Publish `HistoryChanged` on every mutation.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn into_shared(self) -> SharedHistory {
        Arc::new(Mutex::new(self))
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn push(&mut self, document: DocumentId, action: HistoryAction) {
        let history = self.documents.entry(document).or_default();
        history.redo_stack.clear();
        history.undo_stack.push(action);

        if history.undo_stack.len() > self.max_depth {
            let excess = history.undo_stack.len() - self.max_depth;
            history.undo_stack.drain(..excess);
        }

        self.notify_change(document);
    }

    /// The action the next `undo` would revert, left in place.
    pub fn peek_undo(&self, document: DocumentId) -> Option<HistoryAction> {
        self.documents.get(&document)?.undo_stack.last().cloned()
    }

    /// The action the next `redo` would re-apply, left in place.
    pub fn peek_redo(&self, document: DocumentId) -> Option<HistoryAction> {
        self.documents.get(&document)?.redo_stack.last().cloned()
    }

    /// Pop the latest action onto the redo stack and return it.
    ///
    /// Call once the inverse has been applied; `None` means nothing to undo.
    pub fn undo(&mut self, document: DocumentId) -> Option<HistoryAction> {
        let history = self.documents.get_mut(&document)?;
        let action = history.undo_stack.pop()?;
        history.redo_stack.push(action.clone());
        self.notify_change(document);
        Some(action)
    }

    /// Pop the latest undone action back onto the undo stack and return it.
    pub fn redo(&mut self, document: DocumentId) -> Option<HistoryAction> {
        let history = self.documents.get_mut(&document)?;
        let action = history.redo_stack.pop()?;
        history.undo_stack.push(action.clone());
        self.notify_change(document);
        Some(action)
    }

    pub fn can_undo(&self, document: DocumentId) -> bool {
        self.undo_count(document) > 0
    }

    pub fn can_redo(&self, document: DocumentId) -> bool {
        self.redo_count(document) > 0
    }

    pub fn undo_count(&self, document: DocumentId) -> usize {
        self.documents
            .get(&document)
            .map_or(0, |history| history.undo_stack.len())
    }

    pub fn redo_count(&self, document: DocumentId) -> usize {
        self.documents
            .get(&document)
            .map_or(0, |history| history.redo_stack.len())
    }

    pub fn undo_description(&self, document: DocumentId) -> Option<String> {
        self.documents
            .get(&document)?
            .undo_stack
            .last()
            .map(HistoryAction::describe)
    }

    pub fn redo_description(&self, document: DocumentId) -> Option<String> {
        self.documents
            .get(&document)?
            .redo_stack
            .last()
            .map(HistoryAction::describe)
    }

    pub fn clear(&mut self, document: DocumentId) {
        if let Some(history) = self.documents.get_mut(&document) {
            history.undo_stack.clear();
            history.redo_stack.clear();
        }
        self.notify_change(document);
    }

    /// Forget a document entirely when it is closed.
    pub fn close(&mut self, document: DocumentId) {
        if self.documents.remove(&document).is_some() {
            tracing::debug!("Dropped history for document {}", document);
            self.notify_change(document);
        }
    }

    fn notify_change(&self, document: DocumentId) {
        let Some(bus) = &self.event_bus else {
            return;
        };
        bus.publish(Event::HistoryChanged {
            document_id: document,
            can_undo: self.can_undo(document),
            can_redo: self.can_redo(document),
            undo_count: self.undo_count(document),
            redo_count: self.redo_count(document),
            undo_description: self.undo_description(document),
            redo_description: self.redo_description(document),
        });
    }
}
