//! Per-document editing session.
//!
//! The session owns the local replica of one document and coordinates the
//! scene pipeline, drag gestures, history and the remote gateway. Structural
//! edits are validated locally, confirmed, sent to the gateway and only then
//! applied to the replica. A failed remote edit is recovered by refetching
//! the document.

use crate::config::EditorConfig;
use crate::confirm::{ConfirmRequest, Confirmer};
use crate::drag::{DragDropController, DropOutcome};
use crate::error::{EditorError, Result};
use crate::gateway::{BulkItemResult, BulkReparentItem, GatewayError, PositionUpdate, TreeGateway};
use crate::history::SharedHistory;
use crate::viewport::ViewportController;
use sitetree_core::{
    CanvasTab, DocumentId, FilterState, HistoryAction, PageId, ReparentChange, TabId, TreeError,
    TreeSnapshot, Vec2, Viewport,
};
use sitetree_events::{Event, EventBus};
use sitetree_graph::{Scene, SceneInput, ScenePipeline, StyledNode, TreeModel};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Reported for bulk items the service did not answer.
const NO_RESPONSE: &str = "no response from service";

pub struct TreeSession<G: TreeGateway, C: Confirmer> {
    gateway: Arc<G>,
    confirmer: C,
    config: EditorConfig,
    pipeline: ScenePipeline,
    event_bus: EventBus,
    history: SharedHistory,

    document: Option<DocumentId>,
    model: TreeModel,
    filter: FilterState,
    /// Positions dragged this session and not yet saved.
    drag_positions: HashMap<PageId, Vec2>,
    has_unsaved_changes: bool,
    selected: HashSet<PageId>,
    drop_target: Option<PageId>,
    edit_mode: bool,

    drag: DragDropController,
    /// Snap candidates captured when the current drag started.
    drag_candidates: Vec<StyledNode>,
    viewport: ViewportController,
    tabs: Vec<CanvasTab>,
    active_tab: Option<TabId>,
    tab_viewports: HashMap<TabId, Viewport>,
}

impl<G: TreeGateway, C: Confirmer> TreeSession<G, C> {
    pub fn new(
        gateway: Arc<G>,
        confirmer: C,
        history: SharedHistory,
        config: EditorConfig,
        event_bus: EventBus,
    ) -> Self {
        Self {
            gateway,
            confirmer,
            pipeline: ScenePipeline::new(config.layout, config.edges),
            viewport: ViewportController::new(config.viewport),
            config,
            event_bus,
            history,
            document: None,
            model: TreeModel::new(),
            filter: FilterState::default(),
            drag_positions: HashMap::new(),
            has_unsaved_changes: false,
            selected: HashSet::new(),
            drop_target: None,
            edit_mode: false,
            drag: DragDropController::new(),
            drag_candidates: Vec::new(),
            tabs: Vec::new(),
            active_tab: None,
            tab_viewports: HashMap::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn document_id(&self) -> Option<DocumentId> {
        self.document
    }

    pub fn model(&self) -> &TreeModel {
        &self.model
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn drag_positions(&self) -> &HashMap<PageId, Vec2> {
        &self.drag_positions
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    pub fn selection(&self) -> &HashSet<PageId> {
        &self.selected
    }

    pub fn drop_target(&self) -> Option<PageId> {
        self.drop_target
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn drag(&self) -> &DragDropController {
        &self.drag
    }

    pub fn history(&self) -> SharedHistory {
        Arc::clone(&self.history)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn tabs(&self) -> &[CanvasTab] {
        &self.tabs
    }

    pub fn active_tab(&self) -> Option<&CanvasTab> {
        let id = self.active_tab?;
        self.tabs.iter().find(|tab| tab.id == id)
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport.saved()
    }

    pub fn can_undo(&self) -> bool {
        self.document
            .is_some_and(|document| self.history.lock().can_undo(document))
    }

    pub fn can_redo(&self) -> bool {
        self.document
            .is_some_and(|document| self.history.lock().can_redo(document))
    }

    // ========================================================================
    // Document lifecycle
    // ========================================================================

    /// Fetch `document` and its tabs. On failure the session stays open with
    /// an empty tree.
    pub async fn open(&mut self, document: DocumentId) -> Result<()> {
        if self.document.is_some_and(|open| open != document) {
            self.close();
        }
        self.document = Some(document);
        tracing::info!("Opening document {}", document);

        if let Err(error) = self.refresh().await {
            self.model = TreeModel::new();
            return Err(error);
        }
        if let Err(error) = self.load_tabs().await {
            tracing::warn!("Could not load tabs for document {}: {}", document, error);
        }
        Ok(())
    }

    /// Refetch the document. Drag positions, viewport and filter survive.
    pub async fn refresh(&mut self) -> Result<()> {
        let document = self.require_document()?;
        match self.gateway.fetch_tree(document).await {
            Ok(snapshot) => {
                self.apply_snapshot(snapshot);
                Ok(())
            }
            Err(error) => {
                tracing::warn!("Failed to fetch document {}: {}", document, error);
                self.notify_error(format!("Failed to load the site tree: {error}"));
                Err(error.into())
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: TreeSnapshot) {
        let document = snapshot.document_id;
        self.model.replace(snapshot);

        let model = &self.model;
        self.drag_positions.retain(|id, _| model.contains(*id));
        self.selected.retain(|id| model.contains(*id));
        if self.drop_target.is_some_and(|id| !model.contains(id)) {
            self.set_drop_target(None);
        }

        tracing::debug!(
            "Refreshed document {}: {} pages, {} edges",
            document,
            self.model.page_count(),
            self.model.edge_count()
        );
        self.event_bus.publish(Event::TreeRefreshed {
            document_id: document,
            page_count: self.model.page_count(),
        });
    }

    /// Drop every piece of session state for the open document.
    pub fn close(&mut self) {
        let Some(document) = self.document.take() else {
            return;
        };
        self.history.lock().close(document);
        self.model = TreeModel::new();
        self.drag_positions.clear();
        self.selected.clear();
        self.drop_target = None;
        self.drag.cancel();
        self.drag_candidates.clear();
        self.viewport.reset();
        self.tabs.clear();
        self.active_tab = None;
        self.tab_viewports.clear();
        self.has_unsaved_changes = false;
        tracing::info!("Closed document {}", document);
    }

    fn require_document(&self) -> Result<DocumentId> {
        self.document.ok_or(EditorError::NotOpen)
    }

    // ========================================================================
    // View state
    // ========================================================================

    pub fn scene(&self) -> Scene {
        let drag_positions = match self.drag.current() {
            Some((page, position)) => {
                let mut live = self.drag_positions.clone();
                live.insert(page, position);
                Cow::Owned(live)
            }
            None => Cow::Borrowed(&self.drag_positions),
        };
        let tab_positions = self
            .active_tab()
            .filter(|tab| !tab.is_main)
            .map(|tab| &tab.positions);

        self.pipeline.build(&SceneInput {
            model: &self.model,
            filter: &self.filter,
            drag_positions: &drag_positions,
            tab_positions,
            highlighted: self.drop_target,
            selected: &self.selected,
            edit_mode: self.edit_mode,
        })
    }

    /// Build the scene and the viewport to show it in on a `screen` sized canvas.
    pub fn render(&mut self, screen: Vec2) -> (Scene, Viewport) {
        let scene = self.scene();
        let had_viewport = self.viewport.saved().is_some();
        let viewport = self.viewport.on_layout(scene.bounds, screen);
        if !had_viewport && self.viewport.saved().is_some() {
            self.event_bus.publish(Event::ViewportFitted { viewport });
        }
        (scene, viewport)
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        tracing::debug!("Filter changed: {:?}", filter);
        self.filter = filter;
    }

    pub fn set_edit_mode(&mut self, edit_mode: bool) {
        if !edit_mode && self.drag.is_dragging() {
            self.cancel_drag();
        }
        self.edit_mode = edit_mode;
    }

    pub fn select(&mut self, pages: impl IntoIterator<Item = PageId>) {
        self.selected = pages
            .into_iter()
            .filter(|id| self.model.contains(*id))
            .collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn on_viewport_changed(&mut self, viewport: Viewport) {
        self.viewport.on_viewport_changed(viewport);
    }

    pub fn zoom_by(&mut self, factor: f32, anchor: Vec2) -> Viewport {
        self.viewport.zoom_by(factor, anchor)
    }

    // ========================================================================
    // Drag and drop
    // ========================================================================

    /// Start dragging a visible page. Returns false when the gesture is refused.
    pub fn begin_drag(&mut self, page: PageId) -> bool {
        let scene = self.scene();
        let Some(node) = scene.node(page) else {
            tracing::debug!("Cannot drag {}: not in the scene", page);
            return false;
        };
        if !self.drag.begin(node, self.edit_mode) {
            return false;
        }
        self.drag_candidates = scene.nodes;
        true
    }

    /// Move the dragged page. Returns the highlighted drop target.
    pub fn drag_to(&mut self, pointer: Vec2) -> Option<PageId> {
        if !self.drag.is_dragging() {
            return None;
        }
        let target = self
            .drag
            .update(pointer, &self.drag_candidates, &self.config.drag);
        self.set_drop_target(target);
        target
    }

    /// Drop the dragged page at `pointer`.
    ///
    /// The position is always committed to the unsaved drag positions. With
    /// auto-connect on the main tab, a snap target other than the current
    /// parent also reparents the page; errors from that step are returned
    /// after the position was committed.
    pub async fn end_drag(&mut self, pointer: Vec2) -> Result<Option<DropOutcome>> {
        let Some(outcome) = self.drag.finish(pointer) else {
            return Ok(None);
        };
        self.drag_candidates.clear();
        self.set_drop_target(None);

        self.drag_positions.insert(outcome.page_id, outcome.position);
        self.set_unsaved(true);
        tracing::debug!(
            "Dropped {} at {:?} (snap target {:?})",
            outcome.page_id,
            outcome.position,
            outcome.snap_target
        );

        let Some(target) = outcome.snap_target else {
            return Ok(Some(outcome));
        };
        if !self.config.drag.auto_connect
            || self.model.parent_of(outcome.page_id) == Some(target)
        {
            return Ok(Some(outcome));
        }
        if self.active_tab().is_some_and(|tab| !tab.is_main) {
            tracing::debug!("Not reparenting {}: overlay tab is active", outcome.page_id);
            return Ok(Some(outcome));
        }

        self.reparent(outcome.page_id, Some(target)).await?;
        Ok(Some(outcome))
    }

    pub fn cancel_drag(&mut self) -> Option<(PageId, Vec2)> {
        let cancelled = self.drag.cancel();
        self.drag_candidates.clear();
        self.set_drop_target(None);
        cancelled
    }

    // ========================================================================
    // Structural edits
    // ========================================================================

    /// Move `page` under `new_parent` (`None` makes it a root).
    ///
    /// Returns `Ok(false)` when nothing changed: the page already has that
    /// parent or the user declined.
    pub async fn reparent(&mut self, page: PageId, new_parent: Option<PageId>) -> Result<bool> {
        let document = self.require_document()?;
        if let Err(error) = self.model.validate_reparent(page, new_parent) {
            tracing::warn!("Rejected reparent of {}: {}", page, error);
            self.event_bus.publish(Event::ShowWarning {
                message: error.to_string(),
            });
            return Err(error.into());
        }
        if self.model.parent_of(page) == new_parent {
            return Ok(false);
        }

        let request = ConfirmRequest::Reparent {
            page_id: page,
            page_label: self.label(page),
            new_parent_id: new_parent,
            new_parent_label: new_parent.map(|parent| self.label(parent)),
        };
        if !self.confirmer.confirm(&request).await {
            tracing::debug!("Reparent of {} declined", page);
            return Ok(false);
        }

        let changed = match self.gateway.change_parent(page, new_parent).await {
            Ok(changed) => changed,
            Err(error) => return self.recover("Moving the page", error).await,
        };

        if !self.apply_local(page, new_parent) {
            self.resync().await;
        }
        let change = ReparentChange::new(page, changed.old_parent_id, changed.new_parent_id);
        self.history
            .lock()
            .push(document, HistoryAction::Reparent(change));
        tracing::info!("{}", HistoryAction::Reparent(change).describe());
        Ok(true)
    }

    /// Reparent several pages at once. Items fail independently; the
    /// returned results follow the input order.
    ///
    /// Items rejected by the local checks never reach the gateway. Declining
    /// the confirmation returns an empty list.
    pub async fn bulk_reparent(
        &mut self,
        items: &[BulkReparentItem],
    ) -> Result<Vec<BulkItemResult>> {
        let document = self.require_document()?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut results: Vec<Option<BulkItemResult>> = vec![None; items.len()];
        let mut remote_items = Vec::new();
        let mut remote_slots = Vec::new();
        for (slot, item) in items.iter().enumerate() {
            match self.model.validate_reparent(item.page_id, item.new_parent_id) {
                Ok(()) => {
                    remote_items.push(*item);
                    remote_slots.push(slot);
                }
                Err(error) => {
                    results[slot] = Some(BulkItemResult {
                        page_id: item.page_id,
                        old_parent_id: self.model.parent_of(item.page_id),
                        new_parent_id: item.new_parent_id,
                        error: Some(error.to_string()),
                    });
                }
            }
        }

        if !self
            .confirmer
            .confirm(&ConfirmRequest::BulkReparent { count: items.len() })
            .await
        {
            tracing::debug!("Bulk reparent of {} pages declined", items.len());
            return Ok(Vec::new());
        }

        let mut in_sync = true;
        if !remote_items.is_empty() {
            let remote_results = match self.gateway.bulk_reparent(&remote_items).await {
                Ok(remote_results) => remote_results,
                Err(error) => return self.recover("Moving the pages", error).await,
            };
            if remote_results.len() != remote_items.len() {
                tracing::warn!(
                    "Bulk reparent returned {} results for {} items",
                    remote_results.len(),
                    remote_items.len()
                );
                in_sync = false;
            }
            let mut remote_results = remote_results.into_iter();
            for (&slot, item) in remote_slots.iter().zip(&remote_items) {
                results[slot] = Some(remote_results.next().unwrap_or_else(|| BulkItemResult {
                    page_id: item.page_id,
                    old_parent_id: self.model.parent_of(item.page_id),
                    new_parent_id: item.new_parent_id,
                    error: Some(NO_RESPONSE.to_string()),
                }));
            }
        }

        let results: Vec<BulkItemResult> = results.into_iter().flatten().collect();
        let mut changes = Vec::new();
        for result in results.iter().filter(|result| result.is_success()) {
            in_sync &= self.apply_local(result.page_id, result.new_parent_id);
            let change =
                ReparentChange::new(result.page_id, result.old_parent_id, result.new_parent_id);
            if !change.is_noop() {
                changes.push(change);
            }
        }
        if !in_sync {
            self.resync().await;
        }

        let succeeded = results.iter().filter(|result| result.is_success()).count();
        let failed = results.len() - succeeded;
        if let Some(action) = Self::bulk_action(changes) {
            tracing::info!("{}", action.describe());
            self.history.lock().push(document, action);
        }
        self.event_bus
            .publish(Event::BulkReparentFinished { succeeded, failed });
        if failed > 0 {
            let reasons: Vec<String> = results
                .iter()
                .filter_map(|result| {
                    let error = result.error.as_deref()?;
                    Some(format!("page {}: {}", result.page_id, error))
                })
                .collect();
            tracing::warn!("{} of {} moves failed", failed, results.len());
            self.event_bus.publish(Event::ShowWarning {
                message: format!(
                    "{failed} of {} moves failed ({})",
                    results.len(),
                    reasons.join("; ")
                ),
            });
        }
        Ok(results)
    }

    fn bulk_action(mut changes: Vec<ReparentChange>) -> Option<HistoryAction> {
        match changes.len() {
            0 => None,
            1 => changes.pop().map(HistoryAction::Reparent),
            _ => Some(HistoryAction::BulkReparent { changes }),
        }
    }

    /// Revert the latest edit. `Ok(false)` when there is nothing to undo.
    pub async fn undo(&mut self) -> Result<bool> {
        let document = self.require_document()?;
        let Some(action) = self.history.lock().peek_undo(document) else {
            return Ok(false);
        };
        tracing::info!("Undo: {}", action.describe());
        // The entry only moves to the redo stack once the service accepted it.
        self.replay(&action.inverse(), "Undo").await?;
        self.history.lock().undo(document);
        Ok(true)
    }

    /// Re-apply the latest undone edit. `Ok(false)` when there is nothing to redo.
    pub async fn redo(&mut self) -> Result<bool> {
        let document = self.require_document()?;
        let Some(action) = self.history.lock().peek_redo(document) else {
            return Ok(false);
        };
        tracing::info!("Redo: {}", action.describe());
        self.replay(&action, "Redo").await?;
        self.history.lock().redo(document);
        Ok(true)
    }

    /// Send `action` to the gateway and mirror it locally.
    async fn replay(&mut self, action: &HistoryAction, context: &str) -> Result<()> {
        match action {
            HistoryAction::Reparent(change) => {
                if let Err(error) = self
                    .gateway
                    .change_parent(change.page_id, change.new_parent_id)
                    .await
                {
                    return self.recover(context, error).await;
                }
                if !self.apply_local(change.page_id, change.new_parent_id) {
                    self.resync().await;
                }
            }
            HistoryAction::BulkReparent { changes } => {
                let items: Vec<BulkReparentItem> = changes
                    .iter()
                    .map(|change| BulkReparentItem {
                        page_id: change.page_id,
                        new_parent_id: change.new_parent_id,
                    })
                    .collect();
                let results = match self.gateway.bulk_reparent(&items).await {
                    Ok(results) => results,
                    Err(error) => return self.recover(context, error).await,
                };
                let mut in_sync = true;
                for result in &results {
                    if result.is_success() {
                        in_sync &= self.apply_local(result.page_id, result.new_parent_id);
                    } else {
                        in_sync = false;
                    }
                }
                if !in_sync {
                    self.event_bus.publish(Event::ShowWarning {
                        message: format!("{context} was only partly applied"),
                    });
                    self.resync().await;
                }
            }
        }
        Ok(())
    }

    /// Mirror a confirmed remote reparent in the replica. False when the
    /// replica disagrees with the service.
    fn apply_local(&mut self, page: PageId, new_parent: Option<PageId>) -> bool {
        match self.model.reparent(page, new_parent) {
            Ok(change) => {
                if !change.is_noop() {
                    self.event_bus.publish(Event::PageReparented {
                        page_id: change.page_id,
                        old_parent_id: change.old_parent_id,
                        new_parent_id: change.new_parent_id,
                    });
                }
                true
            }
            Err(error) => {
                tracing::warn!("Local tree out of sync after moving {}: {}", page, error);
                false
            }
        }
    }

    /// Report a failed remote edit and refetch the authoritative tree.
    async fn recover<T>(&mut self, context: &str, error: GatewayError) -> Result<T> {
        tracing::warn!("{} failed: {}", context, error);
        self.notify_error(format!("{context} failed: {error}"));
        self.resync().await;
        Err(error.into())
    }

    async fn resync(&mut self) {
        if let Err(error) = self.refresh().await {
            tracing::warn!("Refetch after failure also failed: {}", error);
        }
    }

    // ========================================================================
    // Positions
    // ========================================================================

    /// Persist dragged positions. On the main tab they become the pages'
    /// manual positions; on an overlay tab they are stored with the tab
    /// together with the current viewport.
    pub async fn save_positions(&mut self) -> Result<()> {
        self.require_document()?;
        let overlay = self.active_tab().filter(|tab| !tab.is_main).cloned();

        match overlay {
            Some(tab) => {
                let mut positions = tab.positions.clone();
                positions.extend(self.drag_positions.iter().map(|(&id, &pos)| (id, pos)));
                let viewport = self.viewport.saved();
                match self
                    .gateway
                    .save_tab_positions(tab.id, &positions, viewport)
                    .await
                {
                    Ok(saved) => self.replace_tab(saved),
                    Err(error) => return self.save_failed(error),
                }
            }
            None => {
                if self.drag_positions.is_empty() {
                    self.set_unsaved(false);
                    return Ok(());
                }
                let sorted: BTreeMap<PageId, Vec2> =
                    self.drag_positions.iter().map(|(&id, &pos)| (id, pos)).collect();
                let updates: Vec<PositionUpdate> = sorted
                    .iter()
                    .map(|(&id, &pos)| PositionUpdate::new(id, pos))
                    .collect();
                if let Err(error) = self.gateway.bulk_update_positions(&updates).await {
                    return self.save_failed(error);
                }
                for (id, pos) in sorted {
                    self.model.set_manual_position(id, pos);
                }
            }
        }

        let saved = self.drag_positions.len();
        self.drag_positions.clear();
        self.set_unsaved(false);
        tracing::info!("Saved {} positions", saved);
        self.event_bus.publish(Event::ShowSuccess {
            message: "Positions saved".to_string(),
        });
        Ok(())
    }

    fn save_failed(&self, error: GatewayError) -> Result<()> {
        tracing::warn!("Saving positions failed: {}", error);
        self.notify_error(format!("Saving positions failed: {error}"));
        Err(error.into())
    }

    /// Throw away unsaved drag positions and refetch.
    pub async fn discard_changes(&mut self) -> Result<()> {
        self.cancel_drag();
        self.drag_positions.clear();
        self.set_unsaved(false);
        self.refresh().await
    }

    /// Drop the stored manual position of `page`.
    pub async fn reset_position(&mut self, page: PageId) -> Result<()> {
        self.require_document()?;
        if !self.model.contains(page) {
            return Err(TreeError::UnknownPage(page).into());
        }
        if let Err(error) = self.gateway.reset_position(page).await {
            tracing::warn!("Resetting position of {} failed: {}", page, error);
            self.notify_error(format!("Resetting the position failed: {error}"));
            return Err(error.into());
        }
        self.model.clear_manual_position(page);
        self.drag_positions.remove(&page);
        if self.drag_positions.is_empty() {
            self.set_unsaved(false);
        }
        Ok(())
    }

    // ========================================================================
    // Tabs
    // ========================================================================

    pub async fn load_tabs(&mut self) -> Result<()> {
        let document = self.require_document()?;
        let tabs = self.gateway.list_tabs(document).await?;
        self.tabs = tabs;
        let active_exists = self
            .active_tab
            .is_some_and(|id| self.tabs.iter().any(|tab| tab.id == id));
        if !active_exists {
            self.active_tab = self.main_tab_id();
            let stored = self.active_tab().and_then(|tab| tab.viewport);
            if stored.is_some() {
                self.viewport.restore(stored);
            }
        }
        Ok(())
    }

    pub async fn add_tab(&mut self, name: &str) -> Result<TabId> {
        let document = self.require_document()?;
        let tab = match self.gateway.add_tab(document, name).await {
            Ok(tab) => tab,
            Err(error) => {
                self.notify_error(format!("Adding the tab failed: {error}"));
                return Err(error.into());
            }
        };
        let id = tab.id;
        self.tabs.push(tab);
        Ok(id)
    }

    pub async fn rename_tab(&mut self, tab: TabId, name: &str) -> Result<()> {
        self.editable_tab(tab)?;
        match self.gateway.rename_tab(tab, name).await {
            Ok(renamed) => {
                self.replace_tab(renamed);
                Ok(())
            }
            Err(error) => {
                self.notify_error(format!("Renaming the tab failed: {error}"));
                Err(error.into())
            }
        }
    }

    pub async fn delete_tab(&mut self, tab: TabId) -> Result<()> {
        self.editable_tab(tab)?;
        if let Err(error) = self.gateway.delete_tab(tab).await {
            self.notify_error(format!("Deleting the tab failed: {error}"));
            return Err(error.into());
        }
        self.tabs.retain(|record| record.id != tab);
        self.tab_viewports.remove(&tab);
        if self.active_tab == Some(tab)
            && let Some(main) = self.main_tab_id()
        {
            self.switch_tab(main)?;
        }
        Ok(())
    }

    /// Show another tab. Unsaved drag positions belong to the tab they were
    /// made on and are discarded.
    pub fn switch_tab(&mut self, tab: TabId) -> Result<()> {
        let Some(target) = self.tabs.iter().find(|record| record.id == tab) else {
            return Err(TreeError::UnknownTab(tab).into());
        };
        let stored_viewport = target.viewport;
        if self.active_tab == Some(tab) {
            return Ok(());
        }

        self.cancel_drag();
        if !self.drag_positions.is_empty() {
            tracing::warn!(
                "Discarding {} unsaved positions on tab switch",
                self.drag_positions.len()
            );
            self.event_bus.publish(Event::ShowWarning {
                message: "Unsaved positions were discarded".to_string(),
            });
            self.drag_positions.clear();
        }
        self.set_unsaved(false);

        if let (Some(previous), Some(viewport)) = (self.active_tab, self.viewport.saved()) {
            self.tab_viewports.insert(previous, viewport);
        }
        let viewport = self.tab_viewports.get(&tab).copied().or(stored_viewport);
        self.viewport.restore(viewport);

        self.active_tab = Some(tab);
        self.event_bus.publish(Event::TabSwitched { tab_id: tab });
        Ok(())
    }

    fn main_tab_id(&self) -> Option<TabId> {
        self.tabs.iter().find(|tab| tab.is_main).map(|tab| tab.id)
    }

    fn editable_tab(&self, tab: TabId) -> Result<&CanvasTab> {
        let record = self
            .tabs
            .iter()
            .find(|record| record.id == tab)
            .ok_or(TreeError::UnknownTab(tab))?;
        if record.is_main {
            return Err(TreeError::ImmutableMainTab.into());
        }
        Ok(record)
    }

    fn replace_tab(&mut self, tab: CanvasTab) {
        match self.tabs.iter_mut().find(|record| record.id == tab.id) {
            Some(record) => *record = tab,
            None => self.tabs.push(tab),
        }
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    fn label(&self, page: PageId) -> String {
        self.model
            .page(page)
            .map_or_else(|| page.to_string(), |page| page.display_label().to_string())
    }

    fn notify_error(&self, message: String) {
        self.event_bus.publish(Event::ShowError { message });
    }

    fn set_unsaved(&mut self, has_unsaved_changes: bool) {
        if self.has_unsaved_changes != has_unsaved_changes {
            self.has_unsaved_changes = has_unsaved_changes;
            self.event_bus
                .publish(Event::UnsavedChangesChanged { has_unsaved_changes });
        }
    }

    fn set_drop_target(&mut self, target: Option<PageId>) {
        if self.drop_target != target {
            self.drop_target = target;
            self.event_bus.publish(Event::DropTargetChanged { target });
        }
    }
}
