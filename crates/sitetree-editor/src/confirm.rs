use serde::Serialize;
use sitetree_core::PageId;

/// A structural edit awaiting the user's approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConfirmRequest {
    Reparent {
        page_id: PageId,
        page_label: String,
        new_parent_id: Option<PageId>,
        new_parent_label: Option<String>,
    },
    BulkReparent {
        count: usize,
    },
}

impl ConfirmRequest {
    pub fn message(&self) -> String {
        match self {
            ConfirmRequest::Reparent {
                page_label,
                new_parent_label: Some(parent),
                ..
            } => format!("Move '{page_label}' under '{parent}'?"),
            ConfirmRequest::Reparent { page_label, .. } => {
                format!("Detach '{page_label}' and make it a root page?")
            }
            ConfirmRequest::BulkReparent { count } => format!("Move {count} pages?"),
        }
    }
}

/// Asks the user before a structural edit. Returning `false` cancels it.
#[allow(async_fn_in_trait)]
pub trait Confirmer {
    async fn confirm(&self, request: &ConfirmRequest) -> bool;
}

/// Approves everything. Used by the CLI and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl Confirmer for AutoApprove {
    async fn confirm(&self, request: &ConfirmRequest) -> bool {
        tracing::debug!("Auto-approving: {}", request.message());
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysDeny;

impl Confirmer for AlwaysDeny {
    async fn confirm(&self, request: &ConfirmRequest) -> bool {
        tracing::debug!("Declining: {}", request.message());
        false
    }
}
