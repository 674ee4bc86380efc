use crate::PageId;
use serde::{Deserialize, Serialize};

/// One parent change. `None` means the page is (or becomes) a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReparentChange {
    pub page_id: PageId,
    pub old_parent_id: Option<PageId>,
    pub new_parent_id: Option<PageId>,
}

impl ReparentChange {
    pub fn new(page_id: PageId, old_parent_id: Option<PageId>, new_parent_id: Option<PageId>) -> Self {
        Self {
            page_id,
            old_parent_id,
            new_parent_id,
        }
    }

    pub fn inverse(&self) -> Self {
        Self {
            page_id: self.page_id,
            old_parent_id: self.new_parent_id,
            new_parent_id: self.old_parent_id,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.old_parent_id == self.new_parent_id
    }
}

/// A confirmed structural edit as recorded in the undo history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryAction {
    Reparent(ReparentChange),
    BulkReparent { changes: Vec<ReparentChange> },
}

impl HistoryAction {
    /// The action that undoes this one. Bulk changes are reversed in order so
    /// a page touched twice ends up where it started.
    pub fn inverse(&self) -> Self {
        match self {
            HistoryAction::Reparent(change) => HistoryAction::Reparent(change.inverse()),
            HistoryAction::BulkReparent { changes } => HistoryAction::BulkReparent {
                changes: changes.iter().rev().map(ReparentChange::inverse).collect(),
            },
        }
    }

    pub fn changes(&self) -> &[ReparentChange] {
        match self {
            HistoryAction::Reparent(change) => std::slice::from_ref(change),
            HistoryAction::BulkReparent { changes } => changes,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            HistoryAction::Reparent(change) => match change.new_parent_id {
                Some(parent) => format!("Move page {} under {}", change.page_id, parent),
                None => format!("Detach page {}", change.page_id),
            },
            HistoryAction::BulkReparent { changes } => {
                format!("Move {} pages", changes.len())
            }
        }
    }
}
