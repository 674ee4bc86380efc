use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sitetree_core::{FilterState, GroupId, LayoutDirection, TreeSnapshot, ViewMode};
use sitetree_editor::{AutoApprove, EditorConfig, HistoryStore, InMemoryTreeService, TreeSession};
use sitetree_events::EventBus;
use sitetree_graph::{SceneInput, ScenePipeline, TreeModel};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod script;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lay out a tree snapshot and print the styled scene as JSON
    Layout {
        /// Path to the tree snapshot (JSON)
        #[arg(short, long)]
        tree: PathBuf,

        /// Path to the editor config (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Flow direction: tb or lr
        #[arg(short, long)]
        direction: Option<String>,

        /// all, subdomains, high_score or low_score
        #[arg(long, default_value = "all")]
        view_mode: String,

        /// Include pages marked hidden
        #[arg(long)]
        show_hidden: bool,

        /// Dim pages outside this group
        #[arg(long)]
        group: Option<i64>,
    },
    /// Apply an editing script to a snapshot and print the resulting tree
    Replay {
        /// Path to the tree snapshot (JSON)
        #[arg(short, long)]
        tree: PathBuf,

        /// Path to the operations script (JSON)
        #[arg(short, long)]
        script: PathBuf,

        /// Path to the editor config (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_snapshot(path: &Path) -> Result<TreeSnapshot> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read tree {}", path.display()))?;
    let snapshot = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse tree {}", path.display()))?;
    Ok(snapshot)
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    match path {
        Some(path) => EditorConfig::load(path),
        None => Ok(EditorConfig::default()),
    }
}

fn layout(
    tree: &Path,
    config: Option<&Path>,
    direction: Option<&str>,
    filter: FilterState,
) -> Result<()> {
    let mut config = load_config(config)?;
    if let Some(direction) = direction {
        config.layout.direction = LayoutDirection::try_from(direction)?;
    }
    let model = TreeModel::from_snapshot(load_snapshot(tree)?);

    let scene = ScenePipeline::new(config.layout, config.edges).build(&SceneInput {
        model: &model,
        filter: &filter,
        drag_positions: &HashMap::new(),
        tab_positions: None,
        highlighted: None,
        selected: &HashSet::new(),
        edit_mode: false,
    });
    if let Some(diagnostic) = &scene.diagnostic {
        eprintln!("warning: {diagnostic}");
    }
    println!("{}", serde_json::to_string_pretty(&scene)?);
    Ok(())
}

async fn replay(tree: &Path, script_path: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let snapshot = load_snapshot(tree)?;
    let operations = script::load(script_path)?;
    let document = snapshot.document_id;

    let service = Arc::new(InMemoryTreeService::new().with_document(snapshot));
    let event_bus = EventBus::new();
    let history = HistoryStore::new(config.history.max_depth)
        .with_event_bus(event_bus.clone())
        .into_shared();
    let mut session = TreeSession::new(service, AutoApprove, history, config, event_bus);
    session.open(document).await?;
    session.set_edit_mode(true);

    let report = script::run(&mut session, &operations).await?;
    tracing::info!(
        "Replayed {} operations, {} failed",
        operations.len(),
        report.failed_operations
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the JSON output.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let args = Args::parse();

    match args.command {
        Command::Layout {
            tree,
            config,
            direction,
            view_mode,
            show_hidden,
            group,
        } => {
            let filter = FilterState {
                view_mode: ViewMode::try_from(view_mode.as_str())?,
                show_hidden,
                active_group: group.map(GroupId),
            };
            layout(&tree, config.as_deref(), direction.as_deref(), filter)
        }
        Command::Replay {
            tree,
            script,
            config,
        } => replay(&tree, &script, config.as_deref()).await,
    }
}
