use crate::node_style::StyledNode;
use serde::{Deserialize, Serialize};
use sitetree_core::{LayoutDirection, PageEdge, PageId, Vec2};
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Graph contains a cycle; page {0} could not be ranked")]
    Cycle(PageId),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: Vec2::new(pos.x + size.x, pos.y + size.y),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min: Vec2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Vec2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Bounding box of equally sized boxes at `positions` (top-left corners).
    pub fn bounding(positions: impl IntoIterator<Item = Vec2>, size: Vec2) -> Rect {
        positions
            .into_iter()
            .map(|pos| Rect::from_pos_size(pos, size))
            .reduce(|acc, rect| acc.union(&rect))
            .unwrap_or_default()
    }
}

/// Whether the scene is arranged by the layout engine or by stored positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    #[default]
    Auto,
    Manual,
}

impl LayoutMode {
    /// Manual mode with nothing pinned would stack every node at the origin,
    /// so it falls back to automatic layout.
    pub fn effective(self, nodes: &[StyledNode]) -> LayoutMode {
        match self {
            LayoutMode::Manual if !nodes.iter().any(StyledNode::has_manual_position) => {
                tracing::debug!("No manual positions present, falling back to auto layout");
                LayoutMode::Auto
            }
            mode => mode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub mode: LayoutMode,
    pub direction: LayoutDirection,
    pub node_width: f32,
    pub node_height: f32,
    /// Gap between neighbors on the same rank.
    pub node_sep: f32,
    /// Gap between consecutive ranks.
    pub rank_sep: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mode: LayoutMode::Auto,
            direction: LayoutDirection::TopToBottom,
            node_width: LayeredLayouter::DEFAULT_NODE_WIDTH,
            node_height: LayeredLayouter::DEFAULT_NODE_HEIGHT,
            node_sep: LayeredLayouter::DEFAULT_NODE_SEP,
            rank_sep: LayeredLayouter::DEFAULT_RANK_SEP,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutResult {
    /// Top-left corner of every laid out node.
    pub positions: HashMap<PageId, Vec2>,
    pub ranks: HashMap<PageId, usize>,
    pub bounds: Rect,
}

pub trait Layouter {
    fn execute(&self, nodes: &[PageId], edges: &[PageEdge]) -> Result<LayoutResult, LayoutError>;
}

/// Layered (Sugiyama-style) layout for parent/child page graphs.
///
/// Ranks come from the longest path from a root, nodes within a rank are
/// ordered by depth-first discovery and refined with barycenter sweeps, and
/// coordinates are pulled toward parents and children while keeping every
/// pair of rank neighbors at least `node_sep` apart. Every step iterates in
/// input order with stable sorts, so equal input gives equal output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayeredLayouter {
    pub node_width: f32,
    pub node_height: f32,
    pub node_sep: f32,
    pub rank_sep: f32,
    pub direction: LayoutDirection,
}

impl Default for LayeredLayouter {
    fn default() -> Self {
        Self::from(&LayoutConfig::default())
    }
}

impl From<&LayoutConfig> for LayeredLayouter {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            node_width: config.node_width,
            node_height: config.node_height,
            node_sep: config.node_sep,
            rank_sep: config.rank_sep,
            direction: config.direction,
        }
    }
}

/// Adjacency over dense node indices.
struct LayerGraph {
    ids: Vec<PageId>,
    parents: Vec<Vec<usize>>,
    children: Vec<Vec<usize>>,
}

impl LayeredLayouter {
    pub const DEFAULT_NODE_WIDTH: f32 = 220.0;
    pub const DEFAULT_NODE_HEIGHT: f32 = 80.0;
    pub const DEFAULT_NODE_SEP: f32 = 60.0;
    pub const DEFAULT_RANK_SEP: f32 = 120.0;

    const BARYCENTER_SWEEPS: usize = 2;

    pub fn node_size(&self) -> Vec2 {
        Vec2::new(self.node_width, self.node_height)
    }

    /// Extent of a node across the flow direction.
    fn cross_size(&self) -> f32 {
        match self.direction {
            LayoutDirection::TopToBottom => self.node_width,
            LayoutDirection::LeftToRight => self.node_height,
        }
    }

    /// Extent of a node along the flow direction.
    fn main_size(&self) -> f32 {
        match self.direction {
            LayoutDirection::TopToBottom => self.node_height,
            LayoutDirection::LeftToRight => self.node_width,
        }
    }

    fn build_graph(nodes: &[PageId], edges: &[PageEdge]) -> LayerGraph {
        let mut ids = Vec::with_capacity(nodes.len());
        let mut index: HashMap<PageId, usize> = HashMap::with_capacity(nodes.len());
        for &id in nodes {
            if !index.contains_key(&id) {
                index.insert(id, ids.len());
                ids.push(id);
            }
        }

        let mut parents = vec![Vec::new(); ids.len()];
        let mut children = vec![Vec::new(); ids.len()];
        let mut seen_edges = HashSet::new();
        for edge in edges {
            let (Some(&source), Some(&target)) = (index.get(&edge.source), index.get(&edge.target))
            else {
                tracing::warn!(
                    "Layout ignoring edge {} -> {} with an endpoint outside the node set",
                    edge.source,
                    edge.target
                );
                continue;
            };
            if !seen_edges.insert((source, target)) {
                continue;
            }
            parents[target].push(source);
            children[source].push(target);
        }

        LayerGraph {
            ids,
            parents,
            children,
        }
    }

    /// Kahn's algorithm; nodes left unvisited sit on or below a cycle.
    fn topological_order(graph: &LayerGraph) -> Result<Vec<usize>, LayoutError> {
        let mut in_degree: Vec<usize> = graph.parents.iter().map(Vec::len).collect();
        let mut queue: VecDeque<usize> = (0..graph.ids.len())
            .filter(|&idx| in_degree[idx] == 0)
            .collect();
        let mut order = Vec::with_capacity(graph.ids.len());

        while let Some(idx) = queue.pop_front() {
            order.push(idx);
            for &child in &graph.children[idx] {
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    queue.push_back(child);
                }
            }
        }

        if order.len() != graph.ids.len() {
            let stuck = (0..graph.ids.len())
                .find(|&idx| in_degree[idx] > 0)
                .unwrap_or_default();
            return Err(LayoutError::Cycle(graph.ids[stuck]));
        }
        Ok(order)
    }

    fn assign_ranks(graph: &LayerGraph, order: &[usize]) -> Vec<usize> {
        let mut ranks = vec![0usize; graph.ids.len()];
        for &idx in order {
            for &child in &graph.children[idx] {
                ranks[child] = ranks[child].max(ranks[idx] + 1);
            }
        }
        ranks
    }

    /// Pre-order discovery index from roots in input order. Used as the
    /// initial in-layer order so siblings start out next to each other.
    fn discovery_order(graph: &LayerGraph) -> Vec<usize> {
        let mut discovered = vec![usize::MAX; graph.ids.len()];
        let mut next = 0;
        let roots = (0..graph.ids.len()).filter(|&idx| graph.parents[idx].is_empty());

        for root in roots {
            let mut stack = vec![root];
            while let Some(idx) = stack.pop() {
                if discovered[idx] != usize::MAX {
                    continue;
                }
                discovered[idx] = next;
                next += 1;
                stack.extend(graph.children[idx].iter().rev().copied());
            }
        }
        discovered
    }

    fn build_layers(ranks: &[usize], discovered: &[usize]) -> Vec<Vec<usize>> {
        let layer_count = ranks.iter().copied().max().map_or(0, |max| max + 1);
        let mut layers = vec![Vec::new(); layer_count];
        for (idx, &rank) in ranks.iter().enumerate() {
            layers[rank].push(idx);
        }
        for layer in &mut layers {
            layer.sort_by_key(|&idx| discovered[idx]);
        }
        layers
    }

    fn order_layer_by_barycenter(
        layer: &mut [usize],
        order_pos: &[f32],
        neighbors: &[Vec<usize>],
    ) {
        let barycenter = |idx: usize| -> f32 {
            let adjacent = &neighbors[idx];
            if adjacent.is_empty() {
                order_pos[idx]
            } else {
                adjacent.iter().map(|&n| order_pos[n]).sum::<f32>() / adjacent.len() as f32
            }
        };
        let keyed: HashMap<usize, f32> = layer.iter().map(|&idx| (idx, barycenter(idx))).collect();
        layer.sort_by(|a, b| {
            keyed[a]
                .partial_cmp(&keyed[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    fn run_barycenter_passes(layers: &mut [Vec<usize>], graph: &LayerGraph) {
        let mut order_pos = vec![0.0f32; graph.ids.len()];
        for layer in layers.iter() {
            Self::record_order(layer, &mut order_pos);
        }

        for _ in 0..Self::BARYCENTER_SWEEPS {
            for rank in 1..layers.len() {
                Self::order_layer_by_barycenter(&mut layers[rank], &order_pos, &graph.parents);
                Self::record_order(&layers[rank], &mut order_pos);
            }
            for rank in (0..layers.len().saturating_sub(1)).rev() {
                Self::order_layer_by_barycenter(&mut layers[rank], &order_pos, &graph.children);
                Self::record_order(&layers[rank], &mut order_pos);
            }
        }
    }

    fn record_order(layer: &[usize], order_pos: &mut [f32]) {
        for (j, &idx) in layer.iter().enumerate() {
            order_pos[idx] = j as f32;
        }
    }

    /// Move each node toward `desired` but never closer than `step` to its
    /// left neighbor.
    fn settle_layer(layer: &[usize], cross: &mut [f32], desired: &[f32], step: f32) {
        let mut previous: Option<f32> = None;
        for &idx in layer {
            let mut pos = desired[idx];
            if let Some(prev) = previous {
                pos = pos.max(prev + step);
            }
            cross[idx] = pos;
            previous = Some(pos);
        }
    }

    fn mean_of(indices: &[usize], cross: &[f32]) -> Option<f32> {
        if indices.is_empty() {
            return None;
        }
        Some(indices.iter().map(|&n| cross[n]).sum::<f32>() / indices.len() as f32)
    }

    fn assign_cross_coordinates(&self, layers: &[Vec<usize>], graph: &LayerGraph) -> Vec<f32> {
        let step = self.cross_size() + self.node_sep;
        let mut cross = vec![0.0f32; graph.ids.len()];
        for layer in layers {
            for (j, &idx) in layer.iter().enumerate() {
                cross[idx] = j as f32 * step;
            }
        }

        // Children follow their parents.
        for layer in layers.iter().skip(1) {
            let desired: Vec<f32> = (0..graph.ids.len())
                .map(|idx| Self::mean_of(&graph.parents[idx], &cross).unwrap_or(cross[idx]))
                .collect();
            Self::settle_layer(layer, &mut cross, &desired, step);
        }

        // Parents center over their children.
        for layer in layers.iter().rev().skip(1) {
            let desired: Vec<f32> = (0..graph.ids.len())
                .map(|idx| Self::mean_of(&graph.children[idx], &cross).unwrap_or(cross[idx]))
                .collect();
            Self::settle_layer(layer, &mut cross, &desired, step);
        }

        let min = cross.iter().copied().fold(f32::INFINITY, f32::min);
        if min.is_finite() {
            for value in &mut cross {
                *value -= min;
            }
        }
        cross
    }
}

impl Layouter for LayeredLayouter {
    fn execute(&self, nodes: &[PageId], edges: &[PageEdge]) -> Result<LayoutResult, LayoutError> {
        let graph = Self::build_graph(nodes, edges);
        if graph.ids.is_empty() {
            return Ok(LayoutResult::default());
        }

        let order = Self::topological_order(&graph)?;
        let ranks = Self::assign_ranks(&graph, &order);
        let discovered = Self::discovery_order(&graph);
        let mut layers = Self::build_layers(&ranks, &discovered);
        Self::run_barycenter_passes(&mut layers, &graph);
        let cross = self.assign_cross_coordinates(&layers, &graph);

        let rank_step = self.main_size() + self.rank_sep;
        let mut result = LayoutResult::default();
        for (idx, &id) in graph.ids.iter().enumerate() {
            let main = ranks[idx] as f32 * rank_step;
            let position = match self.direction {
                LayoutDirection::TopToBottom => Vec2::new(cross[idx], main),
                LayoutDirection::LeftToRight => Vec2::new(main, cross[idx]),
            };
            result.positions.insert(id, position);
            result.ranks.insert(id, ranks[idx]);
        }
        result.bounds = Rect::bounding(
            graph.ids.iter().map(|id| result.positions[id]),
            self.node_size(),
        );

        tracing::debug!(
            "Laid out {} nodes in {} ranks",
            graph.ids.len(),
            layers.len()
        );
        Ok(result)
    }
}
