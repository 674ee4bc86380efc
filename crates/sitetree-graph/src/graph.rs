use sitetree_core::{
    DocumentId, Page, PageEdge, PageGroup, PageId, ReparentChange, TreeError, TreeSnapshot, Vec2,
};
use std::collections::{HashMap, HashSet, VecDeque};

/// Client-side replica of one document's page forest.
///
/// Edges that reference unknown pages, and extra incoming edges beyond the
/// first for any page, are dropped on load so the replica is always a forest
/// of known pages.
#[derive(Debug, Clone, Default)]
pub struct TreeModel {
    pages: Vec<Page>,
    edges: Vec<PageEdge>,
    groups: Vec<PageGroup>,
    page_map: HashMap<PageId, usize>,
    parents: HashMap<PageId, PageId>,
}

impl TreeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: TreeSnapshot) -> Self {
        let mut model = Self::new();
        model.replace(snapshot);
        model
    }

    /// Swap in a freshly fetched snapshot.
    pub fn replace(&mut self, snapshot: TreeSnapshot) {
        self.pages.clear();
        self.edges.clear();
        self.page_map.clear();
        self.parents.clear();
        self.groups = snapshot.groups;

        for page in snapshot.pages {
            self.add_page(page);
        }
        for edge in snapshot.edges {
            self.add_edge(edge);
        }
    }

    /// Export the replica in snapshot form.
    pub fn snapshot(&self, document_id: DocumentId) -> TreeSnapshot {
        TreeSnapshot {
            document_id,
            pages: self.pages.clone(),
            edges: self.edges.clone(),
            groups: self.groups.clone(),
        }
    }

    pub fn add_page(&mut self, page: Page) {
        if self.page_map.contains_key(&page.id) {
            tracing::warn!("Ignoring duplicate page {}", page.id);
            return;
        }
        self.page_map.insert(page.id, self.pages.len());
        self.pages.push(page);
    }

    pub fn add_edge(&mut self, edge: PageEdge) {
        if !self.page_map.contains_key(&edge.source) {
            tracing::warn!(
                "Dropping edge {} -> {} because source page is missing",
                edge.source,
                edge.target
            );
            return;
        }
        if !self.page_map.contains_key(&edge.target) {
            tracing::warn!(
                "Dropping edge {} -> {} because target page is missing",
                edge.source,
                edge.target
            );
            return;
        }
        // Keep the first parent only; a page has at most one incoming edge.
        if let Some(existing) = self.parents.get(&edge.target) {
            tracing::warn!(
                "Dropping edge {} -> {}: page already has parent {}",
                edge.source,
                edge.target,
                existing
            );
            return;
        }
        self.parents.insert(edge.target, edge.source);
        self.edges.push(edge);
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn edges(&self) -> &[PageEdge] {
        &self.edges
    }

    pub fn groups(&self) -> &[PageGroup] {
        &self.groups
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains(&self, id: PageId) -> bool {
        self.page_map.contains_key(&id)
    }

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.page_map.get(&id).map(|&idx| &self.pages[idx])
    }

    pub fn page_mut(&mut self, id: PageId) -> Option<&mut Page> {
        self.page_map.get(&id).map(|&idx| &mut self.pages[idx])
    }

    pub fn parent_of(&self, id: PageId) -> Option<PageId> {
        self.parents.get(&id).copied()
    }

    /// Children in edge order.
    pub fn children_of(&self, id: PageId) -> Vec<PageId> {
        self.edges
            .iter()
            .filter(|edge| edge.source == id)
            .map(|edge| edge.target)
            .collect()
    }

    pub fn roots(&self) -> Vec<PageId> {
        self.pages
            .iter()
            .filter(|page| !self.parents.contains_key(&page.id))
            .map(|page| page.id)
            .collect()
    }

    /// True when `ancestor` appears on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: PageId, id: PageId) -> bool {
        let mut seen = HashSet::new();
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            if !seen.insert(parent) {
                // Malformed chain; treat as not found.
                return false;
            }
            current = self.parent_of(parent);
        }
        false
    }

    /// Reject edits that would break the forest: unknown pages, self-parents,
    /// and moving a page under one of its own descendants.
    pub fn validate_reparent(
        &self,
        page_id: PageId,
        new_parent: Option<PageId>,
    ) -> Result<(), TreeError> {
        if !self.contains(page_id) {
            return Err(TreeError::UnknownPage(page_id));
        }
        let Some(parent) = new_parent else {
            return Ok(());
        };
        if !self.contains(parent) {
            return Err(TreeError::UnknownPage(parent));
        }
        if parent == page_id {
            return Err(TreeError::SelfParent(page_id));
        }
        if self.is_ancestor(page_id, parent) {
            return Err(TreeError::CycleDetected {
                page: page_id,
                new_parent: parent,
            });
        }
        Ok(())
    }

    /// Rewrite the incoming edge of `page_id` locally and shift the depth of
    /// the moved subtree. Returns the change that was applied.
    pub fn reparent(
        &mut self,
        page_id: PageId,
        new_parent: Option<PageId>,
    ) -> Result<ReparentChange, TreeError> {
        self.validate_reparent(page_id, new_parent)?;
        let old_parent = self.parent_of(page_id);
        let change = ReparentChange::new(page_id, old_parent, new_parent);
        if change.is_noop() {
            return Ok(change);
        }

        self.edges.retain(|edge| edge.target != page_id);
        self.parents.remove(&page_id);
        if let Some(parent) = new_parent {
            self.edges.push(PageEdge::new(parent, page_id));
            self.parents.insert(page_id, parent);
        }

        let new_depth = new_parent
            .and_then(|parent| self.page(parent))
            .map_or(0, |parent| parent.depth + 1);
        self.shift_subtree_depth(page_id, new_depth);

        tracing::debug!(
            "Reparented page {} from {:?} to {:?}",
            page_id,
            old_parent,
            new_parent
        );
        Ok(change)
    }

    fn shift_subtree_depth(&mut self, root: PageId, new_depth: u32) {
        let Some(old_depth) = self.page(root).map(|page| page.depth) else {
            return;
        };
        let delta = i64::from(new_depth) - i64::from(old_depth);
        if delta == 0 {
            return;
        }

        let mut queue = VecDeque::from([root]);
        let mut seen = HashSet::new();
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(page) = self.page_mut(id) {
                page.depth = (i64::from(page.depth) + delta).max(0) as u32;
            }
            queue.extend(self.children_of(id));
        }
    }

    pub fn set_manual_position(&mut self, id: PageId, position: Vec2) -> bool {
        match self.page_mut(id) {
            Some(page) => {
                page.manual_position = sitetree_core::ManualPosition::pinned(position);
                true
            }
            None => false,
        }
    }

    pub fn clear_manual_position(&mut self, id: PageId) -> bool {
        match self.page_mut(id) {
            Some(page) => {
                page.manual_position = Default::default();
                true
            }
            None => false,
        }
    }

    /// Count of pages carrying an authoritative manual position.
    pub fn manual_position_count(&self) -> usize {
        self.pages
            .iter()
            .filter(|page| page.manual_override().is_some())
            .count()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// R(1) -> A(2), R -> B(3), A -> C(4)
    pub(crate) fn sample_snapshot() -> TreeSnapshot {
        TreeSnapshot {
            document_id: DocumentId(1),
            pages: vec![
                Page::new(PageId(1), "/", 0),
                Page::new(PageId(2), "/a", 1),
                Page::new(PageId(3), "/b", 1),
                Page::new(PageId(4), "/a/c", 2),
            ],
            edges: vec![
                PageEdge::new(PageId(1), PageId(2)),
                PageEdge::new(PageId(1), PageId(3)),
                PageEdge::new(PageId(2), PageId(4)),
            ],
            groups: vec![],
        }
    }

    #[test]
    fn test_tree_model_loads_forest() {
        let model = TreeModel::from_snapshot(sample_snapshot());
        assert_eq!(model.page_count(), 4);
        assert_eq!(model.edge_count(), 3);
        assert_eq!(model.roots(), vec![PageId(1)]);
        assert_eq!(model.children_of(PageId(1)), vec![PageId(2), PageId(3)]);
        assert_eq!(model.parent_of(PageId(4)), Some(PageId(2)));
    }

    #[test]
    fn test_tree_model_drops_dangling_and_second_parent_edges() {
        let mut snapshot = sample_snapshot();
        snapshot.edges.push(PageEdge::new(PageId(99), PageId(2)));
        snapshot.edges.push(PageEdge::new(PageId(3), PageId(4)));
        let model = TreeModel::from_snapshot(snapshot);

        assert_eq!(model.edge_count(), 3);
        assert_eq!(model.parent_of(PageId(4)), Some(PageId(2)));
    }

    #[test]
    fn test_reparent_rewrites_edge_and_depths() {
        let mut model = TreeModel::from_snapshot(sample_snapshot());
        let change = model.reparent(PageId(3), Some(PageId(4))).unwrap();

        assert_eq!(
            change,
            ReparentChange::new(PageId(3), Some(PageId(1)), Some(PageId(4)))
        );
        assert_eq!(model.parent_of(PageId(3)), Some(PageId(4)));
        assert_eq!(model.page(PageId(3)).unwrap().depth, 3);
        assert_eq!(model.edge_count(), 3);
    }

    #[test]
    fn test_reparent_moves_whole_subtree_depth() {
        let mut model = TreeModel::from_snapshot(sample_snapshot());
        model.reparent(PageId(2), Some(PageId(3))).unwrap();

        assert_eq!(model.page(PageId(2)).unwrap().depth, 2);
        assert_eq!(model.page(PageId(4)).unwrap().depth, 3);
    }

    #[test]
    fn test_detach_makes_root() {
        let mut model = TreeModel::from_snapshot(sample_snapshot());
        model.reparent(PageId(2), None).unwrap();

        assert_eq!(model.parent_of(PageId(2)), None);
        assert_eq!(model.page(PageId(2)).unwrap().depth, 0);
        assert_eq!(model.page(PageId(4)).unwrap().depth, 1);
        assert_eq!(model.roots(), vec![PageId(1), PageId(2)]);
    }

    #[test]
    fn test_validate_rejects_cycles_and_self_parent() {
        let model = TreeModel::from_snapshot(sample_snapshot());

        assert_eq!(
            model.validate_reparent(PageId(2), Some(PageId(4))),
            Err(TreeError::CycleDetected {
                page: PageId(2),
                new_parent: PageId(4)
            })
        );
        assert_eq!(
            model.validate_reparent(PageId(2), Some(PageId(2))),
            Err(TreeError::SelfParent(PageId(2)))
        );
        assert_eq!(
            model.validate_reparent(PageId(2), Some(PageId(77))),
            Err(TreeError::UnknownPage(PageId(77)))
        );
        assert!(model.validate_reparent(PageId(4), None).is_ok());
    }

    #[test]
    fn test_snapshot_reflects_local_edits() {
        let mut model = TreeModel::from_snapshot(sample_snapshot());
        model.reparent(PageId(3), Some(PageId(2))).unwrap();
        let snapshot = model.snapshot(DocumentId(1));

        assert_eq!(snapshot.pages.len(), 4);
        assert!(snapshot.edges.contains(&PageEdge::new(PageId(2), PageId(3))));
        assert_eq!(TreeModel::from_snapshot(snapshot).parent_of(PageId(3)), Some(PageId(2)));
    }

    #[test]
    fn test_noop_reparent_keeps_edges() {
        let mut model = TreeModel::from_snapshot(sample_snapshot());
        let before = model.edges().to_vec();
        let change = model.reparent(PageId(4), Some(PageId(2))).unwrap();

        assert!(change.is_noop());
        assert_eq!(model.edges(), before.as_slice());
    }
}
