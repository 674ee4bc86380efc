pub mod filter;
pub mod graph;
pub mod layout;
pub mod nearest;
pub mod node_style;
pub mod scene;
pub mod style;

pub use filter::{FilteredPage, GraphFilter};
pub use graph::TreeModel;
pub use layout::{
    LayeredLayouter, LayoutConfig, LayoutError, LayoutMode, LayoutResult, Layouter, Rect,
};
pub use nearest::{NearestCandidate, NearestNodeFinder, SnapCandidate};
pub use node_style::{NodeStyleContext, NodeStyler, StyledNode};
pub use scene::{Scene, ScenePipeline, SceneInput};
pub use style::{
    Color, DEPTH_PALETTE, EdgeStyleConfig, EdgeStyler, StrokeWidthMode, StyledEdge, depth_color,
};
