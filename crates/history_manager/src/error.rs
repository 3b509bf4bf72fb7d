//! History store error types

use thiserror::Error;

use chat_tree::TreeError;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("History entry not found: {0}")]
    NotFound(String),

    #[error("History entry already exists: {0}")]
    NameTaken(String),

    #[error("History names must not be blank")]
    InvalidName,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid stored tree: {0}")]
    Tree(#[from] TreeError),
}

pub type Result<T> = std::result::Result<T, HistoryError>;
