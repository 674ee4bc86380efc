//! Edge Style System
//!
//! Derives edge color, stroke width and dash pattern from the target page.
//! Edges are colored by the target's group when group colors are enabled,
//! otherwise by the target's depth level.

use crate::node_style::StyledNode;
use serde::{Deserialize, Serialize, Serializer};
use sitetree_core::{GroupId, PageEdge, PageGroup, PageId};
use std::collections::HashMap;

/// RGB color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
        Some(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn lighten(&self, factor: f32) -> Self {
        Self {
            r: ((self.r as f32) + (255.0 - self.r as f32) * factor) as u8,
            g: ((self.g as f32) + (255.0 - self.g as f32) * factor) as u8,
            b: ((self.b as f32) + (255.0 - self.b as f32) * factor) as u8,
            a: self.a,
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

// ============================================================================
// Color Constants
// ============================================================================

/// Edge colors by target depth; depths past the end wrap around.
pub const DEPTH_PALETTE: [Color; 6] = [
    Color::rgb(59, 130, 246),
    Color::rgb(16, 185, 129),
    Color::rgb(245, 158, 11),
    Color::rgb(239, 68, 68),
    Color::rgb(139, 92, 246),
    Color::rgb(236, 72, 153),
];

/// How far edges into group-dimmed pages are washed out.
pub const DIMMED_LIGHTEN: f32 = 0.6;

pub fn depth_color(depth: u32) -> Color {
    DEPTH_PALETTE[depth as usize % DEPTH_PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrokeWidthMode {
    Thin,
    Medium,
    Thick,
    /// Subdomain edges drawn wider than page edges.
    #[default]
    Auto,
}

impl StrokeWidthMode {
    pub fn width(self, is_subdomain: bool) -> f32 {
        match self {
            StrokeWidthMode::Thin => 1.0,
            StrokeWidthMode::Medium => 2.0,
            StrokeWidthMode::Thick => 3.0,
            StrokeWidthMode::Auto if is_subdomain => 3.0,
            StrokeWidthMode::Auto => 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EdgeStyleConfig {
    pub use_group_colors: bool,
    pub animated: bool,
    pub show_labels: bool,
    pub stroke_width: StrokeWidthMode,
}

/// A renderable parent -> child connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledEdge {
    pub source: PageId,
    pub target: PageId,
    pub color: Color,
    pub width: f32,
    pub dashed: bool,
    pub animated: bool,
    pub label: Option<String>,
}

pub struct EdgeStyler;

impl EdgeStyler {
    /// Style every edge whose endpoints are both in `nodes`.
    pub fn style(
        edges: &[PageEdge],
        nodes: &[StyledNode],
        groups: &[PageGroup],
        config: &EdgeStyleConfig,
    ) -> Vec<StyledEdge> {
        let visible: HashMap<PageId, &StyledNode> =
            nodes.iter().map(|node| (node.id, node)).collect();
        let group_colors: HashMap<GroupId, Color> = groups
            .iter()
            .filter_map(|group| {
                let color = group.color.as_deref().and_then(Color::from_hex);
                if color.is_none() && group.color.is_some() {
                    tracing::debug!("Group {:?} has an unparseable color", group.id);
                }
                color.map(|color| (group.id, color))
            })
            .collect();

        edges
            .iter()
            .filter(|edge| visible.contains_key(&edge.source))
            .filter_map(|edge| {
                let target = visible.get(&edge.target)?;
                Some(Self::style_edge(edge, target, &group_colors, config))
            })
            .collect()
    }

    fn style_edge(
        edge: &PageEdge,
        target: &StyledNode,
        group_colors: &HashMap<GroupId, Color>,
        config: &EdgeStyleConfig,
    ) -> StyledEdge {
        let group_color = config
            .use_group_colors
            .then(|| target.group_id.and_then(|group| group_colors.get(&group)))
            .flatten()
            .copied();

        let mut color = group_color.unwrap_or_else(|| depth_color(target.depth));
        if target.filtered_out {
            color = color.lighten(DIMMED_LIGHTEN);
        }

        StyledEdge {
            source: edge.source,
            target: edge.target,
            color,
            width: config.stroke_width.width(target.is_subdomain),
            dashed: !target.is_subdomain,
            animated: config.animated,
            label: config.show_labels.then(|| target.label.clone()),
        }
    }
}
