//! Replay scripts: a JSON array of editing operations applied in order.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sitetree_core::{PageEdge, PageId, Vec2};
use sitetree_editor::{BulkReparentItem, Confirmer, InMemoryTreeService, TreeSession};
use sitetree_events::{Event, EventListener};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Reparent {
        page: PageId,
        parent: Option<PageId>,
    },
    Bulk {
        items: Vec<BulkReparentItem>,
    },
    /// Full drag gesture ending at `(x, y)`.
    Drag {
        page: PageId,
        x: f32,
        y: f32,
    },
    Undo,
    Redo,
    Save,
}

pub fn load(path: &Path) -> Result<Vec<Operation>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    let operations = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse script {}", path.display()))?;
    Ok(operations)
}

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub edges: Vec<PageEdge>,
    pub undo_count: usize,
    pub redo_count: usize,
    pub failed_operations: usize,
    pub messages: Vec<String>,
}

/// Collects user-facing notifications while a script runs.
#[derive(Default)]
pub struct ConsoleReporter {
    pub messages: Vec<String>,
}

impl EventListener for ConsoleReporter {
    fn handle_event(&mut self, event: &Event) {
        let message = match event {
            Event::ShowInfo { message } => format!("info: {message}"),
            Event::ShowSuccess { message } => format!("ok: {message}"),
            Event::ShowWarning { message } => format!("warning: {message}"),
            Event::ShowError { message } => format!("error: {message}"),
            _ => return,
        };
        eprintln!("{message}");
        self.messages.push(message);
    }
}

/// Apply `operations` in order. A failing operation is reported and the
/// replay continues with the next one.
pub async fn run<C: Confirmer>(
    session: &mut TreeSession<InMemoryTreeService, C>,
    operations: &[Operation],
) -> Result<ReplayReport> {
    let document = session
        .document_id()
        .context("No document is open for replay")?;
    let mut reporter = ConsoleReporter::default();
    let mut failed_operations = 0;

    for (index, operation) in operations.iter().enumerate() {
        tracing::debug!("Step {}: {:?}", index, operation);
        let outcome = match operation {
            Operation::Reparent { page, parent } => {
                session.reparent(*page, *parent).await.map(|_| ())
            }
            Operation::Bulk { items } => session.bulk_reparent(items).await.map(|_| ()),
            Operation::Drag { page, x, y } => {
                let pointer = Vec2::new(*x, *y);
                if session.begin_drag(*page) {
                    session.drag_to(pointer);
                    session.end_drag(pointer).await.map(|_| ())
                } else {
                    tracing::warn!("Step {}: page {} cannot be dragged", index, page);
                    Ok(())
                }
            }
            Operation::Undo => session.undo().await.map(|_| ()),
            Operation::Redo => session.redo().await.map(|_| ()),
            Operation::Save => session.save_positions().await,
        };
        if let Err(error) = outcome {
            tracing::warn!("Step {} failed: {}", index, error);
            failed_operations += 1;
        }
        session.event_bus().dispatch_to(&mut reporter);
    }

    let history = session.history();
    let history = history.lock();
    Ok(ReplayReport {
        edges: session.model().edges().to_vec(),
        undo_count: history.undo_count(document),
        redo_count: history.redo_count(document),
        failed_operations,
        messages: reporter.messages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_script_parsing() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("ops.json");
        fs::write(
            &path,
            r#"[
                {"op": "reparent", "page": 3, "parent": 4},
                {"op": "reparent", "page": 2, "parent": null},
                {"op": "bulk", "items": [{"page_id": 3, "new_parent_id": 1}]},
                {"op": "drag", "page": 3, "x": 10.0, "y": 20.5},
                {"op": "undo"},
                {"op": "redo"},
                {"op": "save"}
            ]"#,
        )?;

        let operations = load(&path)?;
        assert_eq!(operations.len(), 7);
        assert_eq!(
            operations[0],
            Operation::Reparent {
                page: PageId(3),
                parent: Some(PageId(4))
            }
        );
        assert_eq!(
            operations[1],
            Operation::Reparent {
                page: PageId(2),
                parent: None
            }
        );
        assert_eq!(operations[4], Operation::Undo);
        Ok(())
    }

    #[test]
    fn test_unknown_operation_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"[{"op": "teleport"}]"#)?;
        assert!(load(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_reporter_keeps_notifications_only() {
        let mut reporter = ConsoleReporter::default();
        reporter.handle_event(&Event::ShowError {
            message: "boom".to_string(),
        });
        reporter.handle_event(&Event::BulkReparentFinished {
            succeeded: 1,
            failed: 0,
        });
        assert_eq!(reporter.messages, vec!["error: boom".to_string()]);
    }
}
