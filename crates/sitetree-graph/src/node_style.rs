use crate::filter::FilteredPage;
use serde::Serialize;
use sitetree_core::{GroupId, Page, PageId, PageMetrics, PositionSource, Vec2};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Per-render inputs that are not part of the page data itself.
#[derive(Debug, Clone, Copy)]
pub struct NodeStyleContext<'a> {
    /// Session-only positions of nodes the user has dragged but not saved.
    pub drag_positions: &'a HashMap<PageId, Vec2>,
    /// Overlay positions of the active non-main tab. They act as the manual
    /// layer while that tab is shown.
    pub tab_positions: Option<&'a BTreeMap<PageId, Vec2>>,
    pub highlighted: Option<PageId>,
    pub selected: &'a HashSet<PageId>,
    pub edit_mode: bool,
}

/// A page ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledNode {
    pub id: PageId,
    pub label: String,
    pub url: String,
    pub path: String,
    pub depth: u32,
    pub position: Vec2,
    pub position_source: PositionSource,
    /// Has a manual-layer position (tab overlay or pinned), even while a
    /// drag overrides it.
    pub pinned: bool,
    pub is_subdomain: bool,
    pub is_visible: bool,
    pub group_id: Option<GroupId>,
    pub seo_score: Option<f32>,
    pub performance_score: Option<f32>,
    pub metrics: PageMetrics,
    /// Outside the active group; rendered dimmed.
    pub filtered_out: bool,
    /// Current auto-connect drop target.
    pub highlighted: bool,
    pub selected: bool,
    pub draggable: bool,
}

pub struct NodeStyler;

impl NodeStyler {
    pub fn style(pages: &[FilteredPage<'_>], ctx: &NodeStyleContext<'_>) -> Vec<StyledNode> {
        pages
            .iter()
            .map(|entry| Self::style_page(entry.page, entry.filtered_out, ctx))
            .collect()
    }

    fn style_page(page: &Page, filtered_out: bool, ctx: &NodeStyleContext<'_>) -> StyledNode {
        let (position, position_source) = Self::resolve_position(page, ctx);
        StyledNode {
            id: page.id,
            label: page.display_label().to_string(),
            url: page.url.clone(),
            path: page.path.clone(),
            depth: page.depth,
            position,
            position_source,
            pinned: Self::manual_position(page, ctx).is_some(),
            is_subdomain: page.is_subdomain,
            is_visible: page.is_visible,
            group_id: page.group_id,
            seo_score: page.seo_score,
            performance_score: page.performance_score,
            metrics: page.metrics.clone(),
            filtered_out,
            highlighted: ctx.highlighted == Some(page.id),
            selected: ctx.selected.contains(&page.id),
            draggable: ctx.edit_mode,
        }
    }

    /// Drag position, then manual layer (tab overlay before the page's own
    /// pinned position), then the backend position, then the origin.
    pub fn resolve_position(page: &Page, ctx: &NodeStyleContext<'_>) -> (Vec2, PositionSource) {
        if let Some(&dragged) = ctx.drag_positions.get(&page.id) {
            return (dragged, PositionSource::Dragged);
        }
        if let Some(manual) = Self::manual_position(page, ctx) {
            return (manual, PositionSource::Manual);
        }
        if let Some(computed) = page.position {
            return (computed, PositionSource::Computed);
        }
        (Vec2::ZERO, PositionSource::Origin)
    }

    fn manual_position(page: &Page, ctx: &NodeStyleContext<'_>) -> Option<Vec2> {
        ctx.tab_positions
            .and_then(|positions| positions.get(&page.id).copied())
            .or_else(|| page.manual_override())
    }
}

impl StyledNode {
    pub fn has_manual_position(&self) -> bool {
        self.pinned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sitetree_core::ManualPosition;

    fn ctx<'a>(
        drags: &'a HashMap<PageId, Vec2>,
        selected: &'a HashSet<PageId>,
    ) -> NodeStyleContext<'a> {
        NodeStyleContext {
            drag_positions: drags,
            tab_positions: None,
            highlighted: None,
            selected,
            edit_mode: true,
        }
    }

    fn full_page() -> Page {
        Page {
            position: Some(Vec2::new(1.0, 1.0)),
            manual_position: ManualPosition::pinned(Vec2::new(2.0, 2.0)),
            ..Page::new(PageId(1), "/", 0)
        }
    }

    #[test]
    fn test_position_priority_order() {
        let selected = HashSet::new();
        let mut drags = HashMap::new();
        let mut page = full_page();

        drags.insert(PageId(1), Vec2::new(3.0, 3.0));
        assert_eq!(
            NodeStyler::resolve_position(&page, &ctx(&drags, &selected)),
            (Vec2::new(3.0, 3.0), PositionSource::Dragged)
        );

        drags.clear();
        assert_eq!(
            NodeStyler::resolve_position(&page, &ctx(&drags, &selected)),
            (Vec2::new(2.0, 2.0), PositionSource::Manual)
        );

        page.manual_position.is_manual = false;
        assert_eq!(
            NodeStyler::resolve_position(&page, &ctx(&drags, &selected)),
            (Vec2::new(1.0, 1.0), PositionSource::Computed)
        );

        page.position = None;
        assert_eq!(
            NodeStyler::resolve_position(&page, &ctx(&drags, &selected)),
            (Vec2::ZERO, PositionSource::Origin)
        );
    }

    #[test]
    fn test_tab_overlay_beats_page_manual_but_not_drag() {
        let selected = HashSet::new();
        let mut drags = HashMap::new();
        let mut overlay = BTreeMap::new();
        overlay.insert(PageId(1), Vec2::new(9.0, 9.0));
        let page = full_page();

        let mut context = ctx(&drags, &selected);
        context.tab_positions = Some(&overlay);
        assert_eq!(
            NodeStyler::resolve_position(&page, &context),
            (Vec2::new(9.0, 9.0), PositionSource::Manual)
        );

        drags.insert(PageId(1), Vec2::new(3.0, 3.0));
        let mut context = ctx(&drags, &selected);
        context.tab_positions = Some(&overlay);
        assert_eq!(
            NodeStyler::resolve_position(&page, &context).1,
            PositionSource::Dragged
        );
    }

    #[test]
    fn test_style_attaches_interaction_flags() {
        let drags = HashMap::new();
        let selected = HashSet::from([PageId(1)]);
        let page = full_page();
        let filtered = [FilteredPage {
            page: &page,
            filtered_out: true,
        }];
        let mut context = ctx(&drags, &selected);
        context.highlighted = Some(PageId(1));
        context.edit_mode = false;

        let nodes = NodeStyler::style(&filtered, &context);
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].selected);
        assert!(nodes[0].highlighted);
        assert!(nodes[0].filtered_out);
        assert!(!nodes[0].draggable);
        assert_eq!(nodes[0].label, "/");
    }

    #[test]
    fn test_dragged_node_stays_pinned() {
        let selected = HashSet::new();
        let drags = HashMap::from([(PageId(1), Vec2::new(3.0, 3.0))]);
        let mut page = full_page();
        let filtered = [FilteredPage {
            page: &page,
            filtered_out: false,
        }];

        let nodes = NodeStyler::style(&filtered, &ctx(&drags, &selected));
        assert_eq!(nodes[0].position_source, PositionSource::Dragged);
        assert!(nodes[0].has_manual_position());

        page.manual_position.is_manual = false;
        let filtered = [FilteredPage {
            page: &page,
            filtered_out: false,
        }];
        let nodes = NodeStyler::style(&filtered, &ctx(&drags, &selected));
        assert!(!nodes[0].has_manual_position());
    }

    proptest! {
        #[test]
        fn prop_drag_always_wins(
            drag in proptest::option::of((-500.0f32..500.0, -500.0f32..500.0)),
            manual in proptest::option::of((-500.0f32..500.0, -500.0f32..500.0)),
            computed in proptest::option::of((-500.0f32..500.0, -500.0f32..500.0)),
        ) {
            let selected = HashSet::new();
            let mut drags = HashMap::new();
            if let Some((x, y)) = drag {
                drags.insert(PageId(1), Vec2::new(x, y));
            }
            let page = Page {
                position: computed.map(|(x, y)| Vec2::new(x, y)),
                manual_position: manual
                    .map(|(x, y)| ManualPosition::pinned(Vec2::new(x, y)))
                    .unwrap_or_default(),
                ..Page::new(PageId(1), "/", 0)
            };

            let (position, source) = NodeStyler::resolve_position(&page, &ctx(&drags, &selected));
            let expected = match (drag, manual, computed) {
                (Some((x, y)), _, _) => (Vec2::new(x, y), PositionSource::Dragged),
                (None, Some((x, y)), _) => (Vec2::new(x, y), PositionSource::Manual),
                (None, None, Some((x, y))) => (Vec2::new(x, y), PositionSource::Computed),
                (None, None, None) => (Vec2::ZERO, PositionSource::Origin),
            };
            prop_assert_eq!((position, source), expected);
        }
    }
}
