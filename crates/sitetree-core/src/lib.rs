use serde::{Deserialize, Serialize};
use std::fmt;

pub mod error;
pub mod filter;
pub mod history;
pub mod tab;

pub use error::{EnumConversionError, TreeError};
pub use filter::{FilterState, HIGH_SCORE_THRESHOLD, LOW_SCORE_THRESHOLD, ViewMode};
pub use history::{HistoryAction, ReparentChange};
pub use tab::{CanvasTab, Viewport};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PageId(pub i64);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DocumentId(pub i64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Where a page's on-screen position came from.
///
/// Variants are listed in resolution priority: a session drag beats a pinned
/// manual position, which beats the position the backend computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSource {
    Dragged,
    Manual,
    Computed,
    /// Produced by the layout engine for the current render.
    Layout,
    Origin,
}

/// A position pinned by the user. Only authoritative when `is_manual` is set
/// and both coordinates are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualPosition {
    pub x: Option<f32>,
    pub y: Option<f32>,
    #[serde(default)]
    pub is_manual: bool,
}

impl ManualPosition {
    pub fn pinned(at: Vec2) -> Self {
        Self {
            x: Some(at.x),
            y: Some(at.y),
            is_manual: true,
        }
    }

    pub fn resolve(&self) -> Option<Vec2> {
        match (self.is_manual, self.x, self.y) {
            (true, Some(x), Some(y)) => Some(Vec2::new(x, y)),
            _ => None,
        }
    }
}

/// Search/analytics fields carried along for display. Never interpreted here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetrics {
    pub index_status: Option<String>,
    pub coverage_state: Option<String>,
    pub clicks: Option<u64>,
    pub impressions: Option<u64>,
    pub ctr: Option<f32>,
    pub average_position: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Page {
    pub id: PageId,
    pub url: String,
    pub path: String,
    pub custom_label: Option<String>,
    /// Distance from the document root; the root itself is 0.
    pub depth: u32,
    pub seo_score: Option<f32>,
    pub performance_score: Option<f32>,
    pub is_subdomain: bool,
    pub is_visible: bool,
    pub group_id: Option<GroupId>,
    /// Position computed by the backend layout, if any.
    pub position: Option<Vec2>,
    pub manual_position: ManualPosition,
    pub metrics: PageMetrics,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            id: PageId::default(),
            url: String::new(),
            path: String::new(),
            custom_label: None,
            depth: 0,
            seo_score: None,
            performance_score: None,
            is_subdomain: false,
            // Pages are shown unless the backend says otherwise.
            is_visible: true,
            group_id: None,
            position: None,
            manual_position: ManualPosition::default(),
            metrics: PageMetrics::default(),
        }
    }
}

impl Page {
    pub fn new(id: PageId, path: impl Into<String>, depth: u32) -> Self {
        Self {
            id,
            path: path.into(),
            depth,
            ..Default::default()
        }
    }

    pub fn display_label(&self) -> &str {
        match self.custom_label.as_deref() {
            Some(label) if !label.trim().is_empty() => label,
            _ if !self.path.is_empty() => &self.path,
            _ => &self.url,
        }
    }

    pub fn manual_override(&self) -> Option<Vec2> {
        self.manual_position.resolve()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageEdge {
    pub source: PageId,
    pub target: PageId,
}

impl PageEdge {
    pub fn new(source: PageId, target: PageId) -> Self {
        Self { source, target }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageGroup {
    pub id: GroupId,
    pub name: String,
    /// Hex color such as `#3b82f6`.
    pub color: Option<String>,
}

/// Everything the remote service returns for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeSnapshot {
    pub document_id: DocumentId,
    pub pages: Vec<Page>,
    pub edges: Vec<PageEdge>,
    pub groups: Vec<PageGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LayoutDirection {
    #[default]
    TopToBottom,
    LeftToRight,
}

impl TryFrom<&str> for LayoutDirection {
    type Error = EnumConversionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "tb" | "top_to_bottom" | "vertical" => Ok(LayoutDirection::TopToBottom),
            "lr" | "left_to_right" | "horizontal" => Ok(LayoutDirection::LeftToRight),
            _ => Err(EnumConversionError::InvalidLayoutDirection(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_label_prefers_custom_then_path_then_url() {
        let mut page = Page::new(PageId(1), "/about", 1);
        page.url = "https://example.com/about".to_string();
        assert_eq!(page.display_label(), "/about");

        page.custom_label = Some("About us".to_string());
        assert_eq!(page.display_label(), "About us");

        page.custom_label = Some("   ".to_string());
        page.path.clear();
        assert_eq!(page.display_label(), "https://example.com/about");
    }

    #[test]
    fn test_manual_override_requires_flag_and_both_coordinates() {
        let mut page = Page::new(PageId(1), "/", 0);
        page.manual_position = ManualPosition {
            x: Some(10.0),
            y: None,
            is_manual: true,
        };
        assert_eq!(page.manual_override(), None);

        page.manual_position.y = Some(20.0);
        assert_eq!(page.manual_override(), Some(Vec2::new(10.0, 20.0)));

        page.manual_position.is_manual = false;
        assert_eq!(page.manual_override(), None);
    }

    #[test]
    fn test_snapshot_deserializes_with_defaults() {
        let json = r#"{
            "document_id": 7,
            "pages": [{"id": 1, "path": "/"}],
            "edges": []
        }"#;
        let snapshot: TreeSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.document_id, DocumentId(7));
        assert_eq!(snapshot.pages[0].depth, 0);
        assert!(snapshot.pages[0].is_visible);
        assert!(snapshot.groups.is_empty());
    }

    #[test]
    fn test_layout_direction_parsing() {
        assert_eq!(
            LayoutDirection::try_from("LR").unwrap(),
            LayoutDirection::LeftToRight
        );
        assert!(LayoutDirection::try_from("diagonal").is_err());
    }
}
