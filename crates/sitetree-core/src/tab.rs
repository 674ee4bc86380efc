use crate::{DocumentId, PageId, TabId, Vec2};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// A named position overlay for a document.
///
/// The main tab mirrors the backend layout and is never edited through tab
/// operations; every other tab stores position overrides only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasTab {
    pub id: TabId,
    pub document_id: DocumentId,
    pub name: String,
    pub is_main: bool,
    #[serde(default)]
    pub positions: BTreeMap<PageId, Vec2>,
    #[serde(default)]
    pub viewport: Option<Viewport>,
    pub updated_at: DateTime<Utc>,
}

impl CanvasTab {
    pub fn main(id: TabId, document_id: DocumentId) -> Self {
        Self {
            id,
            document_id,
            name: "Main".to_string(),
            is_main: true,
            positions: BTreeMap::new(),
            viewport: None,
            updated_at: Utc::now(),
        }
    }

    pub fn overlay(id: TabId, document_id: DocumentId, name: impl Into<String>) -> Self {
        Self {
            is_main: false,
            name: name.into(),
            ..Self::main(id, document_id)
        }
    }
}
