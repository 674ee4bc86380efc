use crate::gateway::GatewayError;
use sitetree_core::TreeError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("No document is open")]
    NotOpen,
}

pub type Result<T> = std::result::Result<T, EditorError>;
