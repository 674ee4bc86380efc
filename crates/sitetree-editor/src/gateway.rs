//! Contract with the remote service that owns the document graph.

use serde::{Deserialize, Serialize};
use sitetree_core::{CanvasTab, DocumentId, PageId, TabId, TreeSnapshot, Vec2, Viewport};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentChanged {
    pub page_id: PageId,
    pub old_parent_id: Option<PageId>,
    pub new_parent_id: Option<PageId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReparentItem {
    pub page_id: PageId,
    /// `None` detaches the page to a root.
    pub new_parent_id: Option<PageId>,
}

/// Outcome of one bulk item. Items succeed or fail independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItemResult {
    pub page_id: PageId,
    pub old_parent_id: Option<PageId>,
    pub new_parent_id: Option<PageId>,
    pub error: Option<String>,
}

impl BulkItemResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub id: PageId,
    pub x: f32,
    pub y: f32,
}

impl PositionUpdate {
    pub fn new(id: PageId, position: Vec2) -> Self {
        Self {
            id,
            x: position.x,
            y: position.y,
        }
    }
}

/// Remote tree operations. A `null` parent always means "make root".
#[allow(async_fn_in_trait)]
pub trait TreeGateway {
    async fn fetch_tree(&self, document: DocumentId) -> Result<TreeSnapshot, GatewayError>;

    async fn change_parent(
        &self,
        page: PageId,
        new_parent: Option<PageId>,
    ) -> Result<ParentChanged, GatewayError>;

    /// No cross-item transaction: failed items leave successful ones applied.
    async fn bulk_reparent(
        &self,
        items: &[BulkReparentItem],
    ) -> Result<Vec<BulkItemResult>, GatewayError>;

    async fn bulk_update_positions(&self, updates: &[PositionUpdate])
    -> Result<(), GatewayError>;

    async fn reset_position(&self, page: PageId) -> Result<(), GatewayError>;

    async fn save_tab_positions(
        &self,
        tab: TabId,
        positions: &BTreeMap<PageId, Vec2>,
        viewport: Option<Viewport>,
    ) -> Result<CanvasTab, GatewayError>;

    async fn list_tabs(&self, document: DocumentId) -> Result<Vec<CanvasTab>, GatewayError>;

    async fn add_tab(&self, document: DocumentId, name: &str) -> Result<CanvasTab, GatewayError>;

    async fn rename_tab(&self, tab: TabId, name: &str) -> Result<CanvasTab, GatewayError>;

    async fn delete_tab(&self, tab: TabId) -> Result<(), GatewayError>;
}
