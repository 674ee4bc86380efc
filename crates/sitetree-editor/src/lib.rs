pub mod config;
pub mod confirm;
pub mod drag;
pub mod error;
pub mod gateway;
pub mod history;
pub mod memory;
pub mod session;
pub mod viewport;

pub use config::{DragConfig, EditorConfig, HistoryConfig};
pub use confirm::{AlwaysDeny, AutoApprove, ConfirmRequest, Confirmer};
pub use drag::{DragDropController, DragPhase, DropOutcome};
pub use error::{EditorError, Result};
pub use gateway::{
    BulkItemResult, BulkReparentItem, GatewayError, ParentChanged, PositionUpdate, TreeGateway,
};
pub use history::{HistoryStore, SharedHistory};
pub use memory::InMemoryTreeService;
pub use session::TreeSession;
pub use viewport::{ViewportConfig, ViewportController};
