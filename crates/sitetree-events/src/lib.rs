use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};
use sitetree_core::{DocumentId, PageId, TabId, Viewport};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // ========================================================================
    // Notifications
    // ========================================================================
    ShowInfo {
        message: String,
    },
    ShowSuccess {
        message: String,
    },
    ShowWarning {
        message: String,
    },
    ShowError {
        message: String,
    },

    // ========================================================================
    // Structure
    // ========================================================================
    TreeRefreshed {
        document_id: DocumentId,
        page_count: usize,
    },
    PageReparented {
        page_id: PageId,
        old_parent_id: Option<PageId>,
        new_parent_id: Option<PageId>,
    },
    BulkReparentFinished {
        succeeded: usize,
        failed: usize,
    },

    // ========================================================================
    // Undo/Redo
    // ========================================================================
    HistoryChanged {
        document_id: DocumentId,
        can_undo: bool,
        can_redo: bool,
        undo_count: usize,
        redo_count: usize,
        undo_description: Option<String>,
        redo_description: Option<String>,
    },

    // ========================================================================
    // Canvas
    // ========================================================================
    /// The highlighted auto-connect target changed while dragging.
    DropTargetChanged {
        target: Option<PageId>,
    },
    UnsavedChangesChanged {
        has_unsaved_changes: bool,
    },
    TabSwitched {
        tab_id: TabId,
    },
    ViewportFitted {
        viewport: Viewport,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    pub fn publish(&self, event: Event) {
        tracing::trace!(?event, "publish");
        let _ = self.tx.send(event);
    }

    /// Dispatch all pending events to a listener.
    pub fn dispatch_to<L: EventListener>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }

    /// Drain pending events without a listener.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }
}

/// Trait for components that respond to events.
pub trait EventListener {
    fn handle_event(&mut self, event: &Event);
}
