//! In-process tree service used by the CLI and tests.

use crate::gateway::{
    BulkItemResult, BulkReparentItem, GatewayError, ParentChanged, PositionUpdate, TreeGateway,
};
use chrono::Utc;
use parking_lot::Mutex;
use sitetree_core::{
    CanvasTab, DocumentId, PageId, TabId, TreeError, TreeSnapshot, Vec2, Viewport,
};
use sitetree_graph::TreeModel;
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
struct ServiceState {
    documents: HashMap<DocumentId, TreeModel>,
    tabs: BTreeMap<TabId, CanvasTab>,
    next_tab_id: i64,
    fail_next: Option<GatewayError>,
    calls: Vec<&'static str>,
}

impl ServiceState {
    /// Record the call and hand back an injected failure, if any.
    fn enter(&mut self, operation: &'static str) -> Result<(), GatewayError> {
        self.calls.push(operation);
        match self.fail_next.take() {
            Some(error) => {
                tracing::debug!("Injected failure for {}: {}", operation, error);
                Err(error)
            }
            None => Ok(()),
        }
    }

    fn document_of(&self, page: PageId) -> Option<DocumentId> {
        self.documents
            .iter()
            .find(|(_, model)| model.contains(page))
            .map(|(&id, _)| id)
    }

    fn model_for_page(&mut self, page: PageId) -> Result<&mut TreeModel, GatewayError> {
        let document = self
            .document_of(page)
            .ok_or_else(|| GatewayError::NotFound(format!("page {page}")))?;
        self.documents
            .get_mut(&document)
            .ok_or_else(|| GatewayError::NotFound(format!("document {document}")))
    }

    fn reparent(
        &mut self,
        page: PageId,
        new_parent: Option<PageId>,
    ) -> Result<ParentChanged, GatewayError> {
        let model = self.model_for_page(page)?;
        let change = model.reparent(page, new_parent).map_err(tree_error)?;
        Ok(ParentChanged {
            page_id: change.page_id,
            old_parent_id: change.old_parent_id,
            new_parent_id: change.new_parent_id,
        })
    }

    fn allocate_tab_id(&mut self) -> TabId {
        self.next_tab_id += 1;
        TabId(self.next_tab_id)
    }

    fn editable_tab(&mut self, tab: TabId) -> Result<&mut CanvasTab, GatewayError> {
        let record = self
            .tabs
            .get_mut(&tab)
            .ok_or_else(|| tree_error(TreeError::UnknownTab(tab)))?;
        if record.is_main {
            return Err(tree_error(TreeError::ImmutableMainTab));
        }
        Ok(record)
    }
}

fn tree_error(error: TreeError) -> GatewayError {
    match error {
        TreeError::UnknownPage(_) | TreeError::UnknownTab(_) => {
            GatewayError::NotFound(error.to_string())
        }
        TreeError::ImmutableMainTab => GatewayError::Rejected(error.to_string()),
        _ => GatewayError::Validation(error.to_string()),
    }
}

/// A [`TreeGateway`] over an in-memory store.
///
/// Validates like the real service: unknown ids, self-parenting and cycles
/// are rejected, and the main tab of a document cannot be edited.
#[derive(Default)]
pub struct InMemoryTreeService {
    state: Mutex<ServiceState>,
}

impl InMemoryTreeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `snapshot` and create its main tab.
    pub fn insert_document(&self, snapshot: TreeSnapshot) {
        let mut state = self.state.lock();
        let document = snapshot.document_id;
        if state.documents.contains_key(&document) {
            tracing::warn!("Replacing document {}", document);
        } else {
            let id = state.allocate_tab_id();
            state.tabs.insert(id, CanvasTab::main(id, document));
        }
        state
            .documents
            .insert(document, TreeModel::from_snapshot(snapshot));
    }

    pub fn with_document(self, snapshot: TreeSnapshot) -> Self {
        self.insert_document(snapshot);
        self
    }

    /// Make the next call fail with `error`.
    pub fn fail_next_call(&self, error: GatewayError) {
        self.state.lock().fail_next = Some(error);
    }

    /// Names of the operations called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().calls.clone()
    }

    pub fn parent_of(&self, page: PageId) -> Option<PageId> {
        let state = self.state.lock();
        let document = state.document_of(page)?;
        state.documents.get(&document)?.parent_of(page)
    }
}

impl TreeGateway for InMemoryTreeService {
    async fn fetch_tree(&self, document: DocumentId) -> Result<TreeSnapshot, GatewayError> {
        let mut state = self.state.lock();
        state.enter("fetch_tree")?;
        state
            .documents
            .get(&document)
            .map(|model| model.snapshot(document))
            .ok_or_else(|| GatewayError::NotFound(format!("document {document}")))
    }

    async fn change_parent(
        &self,
        page: PageId,
        new_parent: Option<PageId>,
    ) -> Result<ParentChanged, GatewayError> {
        let mut state = self.state.lock();
        state.enter("change_parent")?;
        state.reparent(page, new_parent)
    }

    async fn bulk_reparent(
        &self,
        items: &[BulkReparentItem],
    ) -> Result<Vec<BulkItemResult>, GatewayError> {
        let mut state = self.state.lock();
        state.enter("bulk_reparent")?;
        let results = items
            .iter()
            .map(|item| match state.reparent(item.page_id, item.new_parent_id) {
                Ok(changed) => BulkItemResult {
                    page_id: changed.page_id,
                    old_parent_id: changed.old_parent_id,
                    new_parent_id: changed.new_parent_id,
                    error: None,
                },
                Err(error) => BulkItemResult {
                    page_id: item.page_id,
                    old_parent_id: None,
                    new_parent_id: item.new_parent_id,
                    error: Some(error.to_string()),
                },
            })
            .collect();
        Ok(results)
    }

    async fn bulk_update_positions(
        &self,
        updates: &[PositionUpdate],
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state.enter("bulk_update_positions")?;
        if let Some(missing) = updates
            .iter()
            .find(|update| state.document_of(update.id).is_none())
        {
            return Err(GatewayError::NotFound(format!("page {}", missing.id)));
        }
        for update in updates {
            let model = state.model_for_page(update.id)?;
            model.set_manual_position(update.id, Vec2::new(update.x, update.y));
        }
        Ok(())
    }

    async fn reset_position(&self, page: PageId) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state.enter("reset_position")?;
        state.model_for_page(page)?.clear_manual_position(page);
        Ok(())
    }

    async fn save_tab_positions(
        &self,
        tab: TabId,
        positions: &BTreeMap<PageId, Vec2>,
        viewport: Option<Viewport>,
    ) -> Result<CanvasTab, GatewayError> {
        let mut state = self.state.lock();
        state.enter("save_tab_positions")?;
        let record = state.editable_tab(tab)?;
        record.positions = positions.clone();
        if viewport.is_some() {
            record.viewport = viewport;
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn list_tabs(&self, document: DocumentId) -> Result<Vec<CanvasTab>, GatewayError> {
        let mut state = self.state.lock();
        state.enter("list_tabs")?;
        if !state.documents.contains_key(&document) {
            return Err(GatewayError::NotFound(format!("document {document}")));
        }
        Ok(state
            .tabs
            .values()
            .filter(|tab| tab.document_id == document)
            .cloned()
            .collect())
    }

    async fn add_tab(&self, document: DocumentId, name: &str) -> Result<CanvasTab, GatewayError> {
        let mut state = self.state.lock();
        state.enter("add_tab")?;
        if !state.documents.contains_key(&document) {
            return Err(GatewayError::NotFound(format!("document {document}")));
        }
        if name.trim().is_empty() {
            return Err(GatewayError::Validation("Tab name is empty".to_string()));
        }
        let id = state.allocate_tab_id();
        let tab = CanvasTab::overlay(id, document, name.trim());
        state.tabs.insert(id, tab.clone());
        Ok(tab)
    }

    async fn rename_tab(&self, tab: TabId, name: &str) -> Result<CanvasTab, GatewayError> {
        let mut state = self.state.lock();
        state.enter("rename_tab")?;
        if name.trim().is_empty() {
            return Err(GatewayError::Validation("Tab name is empty".to_string()));
        }
        let record = state.editable_tab(tab)?;
        record.name = name.trim().to_string();
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete_tab(&self, tab: TabId) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state.enter("delete_tab")?;
        state.editable_tab(tab)?;
        state.tabs.remove(&tab);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitetree_core::{Page, PageEdge};

    fn service() -> InMemoryTreeService {
        InMemoryTreeService::new().with_document(TreeSnapshot {
            document_id: DocumentId(1),
            pages: vec![
                Page::new(PageId(1), "/", 0),
                Page::new(PageId(2), "/a", 1),
                Page::new(PageId(3), "/b", 1),
            ],
            edges: vec![
                PageEdge::new(PageId(1), PageId(2)),
                PageEdge::new(PageId(1), PageId(3)),
            ],
            groups: vec![],
        })
    }

    #[tokio::test]
    async fn test_change_parent_validates() {
        let service = service();

        let changed = service.change_parent(PageId(3), Some(PageId(2))).await.unwrap();
        assert_eq!(changed.old_parent_id, Some(PageId(1)));
        assert_eq!(service.parent_of(PageId(3)), Some(PageId(2)));

        let cycle = service.change_parent(PageId(2), Some(PageId(3))).await;
        assert!(matches!(cycle, Err(GatewayError::Validation(_))));

        let missing = service.change_parent(PageId(2), Some(PageId(99))).await;
        assert!(matches!(missing, Err(GatewayError::NotFound(_))));

        let detached = service.change_parent(PageId(2), None).await.unwrap();
        assert_eq!(detached.new_parent_id, None);
        assert_eq!(service.parent_of(PageId(2)), None);
    }

    #[tokio::test]
    async fn test_bulk_reparent_reports_per_item() {
        let service = service();
        let results = service
            .bulk_reparent(&[
                BulkReparentItem {
                    page_id: PageId(3),
                    new_parent_id: Some(PageId(2)),
                },
                BulkReparentItem {
                    page_id: PageId(2),
                    new_parent_id: Some(PageId(42)),
                },
            ])
            .await
            .unwrap();

        assert!(results[0].is_success());
        assert!(!results[1].is_success());
        assert_eq!(service.parent_of(PageId(3)), Some(PageId(2)));
        assert_eq!(service.parent_of(PageId(2)), Some(PageId(1)));
    }

    #[tokio::test]
    async fn test_injected_failure_hits_next_call_only() {
        let service = service();
        service.fail_next_call(GatewayError::Network("offline".to_string()));

        assert!(service.fetch_tree(DocumentId(1)).await.is_err());
        assert!(service.fetch_tree(DocumentId(1)).await.is_ok());
        assert_eq!(service.calls(), vec!["fetch_tree", "fetch_tree"]);
    }

    #[tokio::test]
    async fn test_positions_pin_and_reset() {
        let service = service();
        service
            .bulk_update_positions(&[PositionUpdate::new(PageId(2), Vec2::new(5.0, 6.0))])
            .await
            .unwrap();
        let snapshot = service.fetch_tree(DocumentId(1)).await.unwrap();
        assert_eq!(snapshot.pages[1].manual_override(), Some(Vec2::new(5.0, 6.0)));

        service.reset_position(PageId(2)).await.unwrap();
        let snapshot = service.fetch_tree(DocumentId(1)).await.unwrap();
        assert_eq!(snapshot.pages[1].manual_override(), None);

        let unknown = service
            .bulk_update_positions(&[PositionUpdate::new(PageId(77), Vec2::ZERO)])
            .await;
        assert!(matches!(unknown, Err(GatewayError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_main_tab_is_immutable() {
        let service = service();
        let tabs = service.list_tabs(DocumentId(1)).await.unwrap();
        assert_eq!(tabs.len(), 1);
        let main = tabs[0].id;
        assert!(tabs[0].is_main);

        assert!(matches!(
            service.rename_tab(main, "Other").await,
            Err(GatewayError::Rejected(_))
        ));
        assert!(matches!(
            service.delete_tab(main).await,
            Err(GatewayError::Rejected(_))
        ));
        assert!(
            service
                .save_tab_positions(main, &BTreeMap::new(), None)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_overlay_tab_lifecycle() {
        let service = service();
        let tab = service.add_tab(DocumentId(1), " Draft ").await.unwrap();
        assert_eq!(tab.name, "Draft");
        assert!(!tab.is_main);

        let positions = BTreeMap::from([(PageId(2), Vec2::new(1.0, 2.0))]);
        let viewport = Viewport {
            x: 3.0,
            y: 4.0,
            zoom: 0.5,
        };
        let saved = service
            .save_tab_positions(tab.id, &positions, Some(viewport))
            .await
            .unwrap();
        assert_eq!(saved.positions, positions);
        assert_eq!(saved.viewport, Some(viewport));

        let renamed = service.rename_tab(tab.id, "Final").await.unwrap();
        assert_eq!(renamed.name, "Final");

        service.delete_tab(tab.id).await.unwrap();
        assert_eq!(service.list_tabs(DocumentId(1)).await.unwrap().len(), 1);
    }
}
