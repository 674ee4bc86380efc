use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sitetree_graph::{EdgeStyleConfig, LayoutConfig};
use std::fs;
use std::path::Path;

use crate::history::DEFAULT_MAX_DEPTH;
use crate::viewport::ViewportConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Snap dropped nodes onto the nearest page and reparent them.
    pub auto_connect: bool,
    pub snap_distance: f32,
    /// Prefer a candidate on a different depth over a nearer one on the same depth.
    pub depth_priority: bool,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            auto_connect: false,
            snap_distance: 150.0,
            depth_priority: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Editor preferences. Every field falls back to its default so partial
/// files load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub layout: LayoutConfig,
    pub edges: EdgeStyleConfig,
    pub drag: DragConfig,
    pub history: HistoryConfig,
    pub viewport: ViewportConfig,
}

impl EditorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: EditorConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        anyhow::ensure!(
            config.viewport.is_valid(),
            "Invalid zoom range in {}: min_zoom {} / max_zoom {}",
            path.display(),
            config.viewport.min_zoom,
            config.viewport.max_zoom
        );
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), content)?;
        Ok(())
    }
}
