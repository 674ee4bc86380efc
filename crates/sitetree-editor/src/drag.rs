//! Drag gesture state machine.
//!
//! `Idle -> Dragging -> (SnapPreview <-> Dragging) -> Idle`. The controller
//! only tracks the gesture; committing positions and reparenting is the
//! session's job.

use crate::config::DragConfig;
use serde::Serialize;
use sitetree_core::{PageId, Vec2};
use sitetree_graph::{NearestNodeFinder, StyledNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging,
    /// Hovering within snap distance of a drop target.
    SnapPreview(PageId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveDrag {
    page_id: PageId,
    depth: u32,
    origin: Vec2,
    position: Vec2,
    snap_target: Option<PageId>,
}

/// Result of releasing a dragged node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DropOutcome {
    pub page_id: PageId,
    /// Position before the gesture started.
    pub origin: Vec2,
    pub position: Vec2,
    pub snap_target: Option<PageId>,
}

#[derive(Debug, Clone, Default)]
pub struct DragDropController {
    active: Option<ActiveDrag>,
}

impl DragDropController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DragPhase {
        match self.active {
            None => DragPhase::Idle,
            Some(ActiveDrag {
                snap_target: Some(target),
                ..
            }) => DragPhase::SnapPreview(target),
            Some(_) => DragPhase::Dragging,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn dragged_page(&self) -> Option<PageId> {
        self.active.map(|drag| drag.page_id)
    }

    /// Page being dragged and its live position.
    pub fn current(&self) -> Option<(PageId, Vec2)> {
        self.active.map(|drag| (drag.page_id, drag.position))
    }

    /// Start dragging `node`. Refused outside edit mode or while another
    /// drag is in progress.
    pub fn begin(&mut self, node: &StyledNode, edit_mode: bool) -> bool {
        if !edit_mode {
            tracing::debug!("Ignoring drag of {}: not in edit mode", node.id);
            return false;
        }
        if let Some(active) = self.active {
            tracing::debug!(
                "Ignoring drag of {}: {} is already being dragged",
                node.id,
                active.page_id
            );
            return false;
        }
        self.active = Some(ActiveDrag {
            page_id: node.id,
            depth: node.depth,
            origin: node.position,
            position: node.position,
            snap_target: None,
        });
        tracing::debug!("Drag started for {} at {:?}", node.id, node.position);
        true
    }

    /// Track the pointer and refresh the snap target. Returns the current
    /// target, which is always `None` when auto-connect is off.
    pub fn update(
        &mut self,
        pointer: Vec2,
        nodes: &[StyledNode],
        config: &DragConfig,
    ) -> Option<PageId> {
        let active = self.active.as_mut()?;
        active.position = pointer;
        active.snap_target = if config.auto_connect {
            NearestNodeFinder::new(config.snap_distance, config.depth_priority)
                .find_among(active.page_id, active.depth, pointer, nodes)
                .map(|candidate| candidate.page_id)
        } else {
            None
        };
        active.snap_target
    }

    /// Release the node at `pointer`.
    pub fn finish(&mut self, pointer: Vec2) -> Option<DropOutcome> {
        let active = self.active.take()?;
        Some(DropOutcome {
            page_id: active.page_id,
            origin: active.origin,
            position: pointer,
            snap_target: active.snap_target,
        })
    }

    /// Abort the gesture; returns the page and the position to restore.
    pub fn cancel(&mut self) -> Option<(PageId, Vec2)> {
        self.active
            .take()
            .map(|active| (active.page_id, active.origin))
    }
}
