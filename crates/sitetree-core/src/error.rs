use crate::{PageId, TabId};
use thiserror::Error;

/// Error type for enum conversion failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnumConversionError {
    #[error("Invalid layout direction: {0}")]
    InvalidLayoutDirection(String),
    #[error("Invalid view mode: {0}")]
    InvalidViewMode(String),
}

/// Structural violations detected locally before anything is sent to the
/// remote service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Unknown page {0}")]
    UnknownPage(PageId),
    #[error("Page {0} cannot be its own parent")]
    SelfParent(PageId),
    #[error("Moving page {page} under {new_parent} would create a cycle")]
    CycleDetected { page: PageId, new_parent: PageId },
    #[error("The main tab is read-only")]
    ImmutableMainTab,
    #[error("Unknown tab {0}")]
    UnknownTab(TabId),
    #[error("Invalid enum value: {0}")]
    EnumConversion(#[from] EnumConversionError),
}
