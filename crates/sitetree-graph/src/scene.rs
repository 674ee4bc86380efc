use crate::filter::GraphFilter;
use crate::graph::TreeModel;
use crate::layout::{LayeredLayouter, LayoutConfig, LayoutMode, Layouter, Rect};
use crate::node_style::{NodeStyleContext, NodeStyler, StyledNode};
use crate::style::{EdgeStyleConfig, EdgeStyler, StyledEdge};
use serde::Serialize;
use sitetree_core::{FilterState, PageEdge, PageId, PositionSource, Vec2};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Everything needed to render one frame of the tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scene {
    pub nodes: Vec<StyledNode>,
    pub edges: Vec<StyledEdge>,
    pub bounds: Rect,
    pub layout_mode: LayoutMode,
    /// Set when layout failed and stored positions were used instead.
    pub diagnostic: Option<String>,
}

impl Scene {
    pub fn node(&self, id: PageId) -> Option<&StyledNode> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

/// Session state the pipeline reads but does not own.
#[derive(Debug, Clone, Copy)]
pub struct SceneInput<'a> {
    pub model: &'a TreeModel,
    pub filter: &'a FilterState,
    pub drag_positions: &'a HashMap<PageId, Vec2>,
    pub tab_positions: Option<&'a BTreeMap<PageId, Vec2>>,
    pub highlighted: Option<PageId>,
    pub selected: &'a HashSet<PageId>,
    pub edit_mode: bool,
}

/// filter -> node style -> edge style -> layout.
#[derive(Debug, Clone, Default)]
pub struct ScenePipeline {
    pub layout: LayoutConfig,
    pub edges: EdgeStyleConfig,
}

impl ScenePipeline {
    pub fn new(layout: LayoutConfig, edges: EdgeStyleConfig) -> Self {
        Self { layout, edges }
    }

    pub fn build(&self, input: &SceneInput<'_>) -> Scene {
        let filtered = GraphFilter::apply(input.model.pages(), input.filter);
        let mut nodes = NodeStyler::style(
            &filtered,
            &NodeStyleContext {
                drag_positions: input.drag_positions,
                tab_positions: input.tab_positions,
                highlighted: input.highlighted,
                selected: input.selected,
                edit_mode: input.edit_mode,
            },
        );
        let edges = EdgeStyler::style(
            input.model.edges(),
            &nodes,
            input.model.groups(),
            &self.edges,
        );

        let layout_mode = self.layout.mode.effective(&nodes);
        let mut diagnostic = None;
        if layout_mode == LayoutMode::Auto {
            if let Err(message) = self.apply_auto_layout(&mut nodes, &edges) {
                tracing::warn!("Layout failed, keeping stored positions: {}", message);
                diagnostic = Some(message);
            }
        }

        let layouter = LayeredLayouter::from(&self.layout);
        let bounds = Rect::bounding(nodes.iter().map(|node| node.position), layouter.node_size());

        tracing::debug!(
            "Built scene: {} nodes, {} edges, {:?} layout",
            nodes.len(),
            edges.len(),
            layout_mode
        );
        Scene {
            nodes,
            edges,
            bounds,
            layout_mode,
            diagnostic,
        }
    }

    /// Layout positions fill in every node that is neither dragged nor
    /// pinned by the manual layer.
    fn apply_auto_layout(
        &self,
        nodes: &mut [StyledNode],
        edges: &[StyledEdge],
    ) -> Result<(), String> {
        let layouter = LayeredLayouter::from(&self.layout);
        let ids: Vec<PageId> = nodes.iter().map(|node| node.id).collect();
        let edges: Vec<PageEdge> = edges
            .iter()
            .map(|edge| PageEdge::new(edge.source, edge.target))
            .collect();
        let result = layouter.execute(&ids, &edges).map_err(|e| e.to_string())?;

        for node in nodes.iter_mut() {
            if node.position_source == PositionSource::Dragged || node.pinned {
                continue;
            }
            if let Some(&position) = result.positions.get(&node.id) {
                node.position = position;
                node.position_source = PositionSource::Layout;
            }
        }
        Ok(())
    }
}
