//! Tree error types

use thiserror::Error;

/// Precondition violations raised by tree operations.
///
/// None of these are recovered locally: a bad index means the caller's view
/// of the tree is out of date.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("parent index {index} is out of bounds (tree has {len} nodes)")]
    ParentOutOfBounds { index: usize, len: usize },

    #[error("node index {index} is out of bounds (tree has {len} nodes)")]
    NodeOutOfBounds { index: usize, len: usize },

    #[error("branch {requested} is out of range for node {parent} ({available} children)")]
    BranchOutOfRange {
        parent: usize,
        requested: isize,
        available: usize,
    },

    #[error("the root node has no siblings")]
    RootHasNoSiblings,

    #[error("no node with index 0 found")]
    RootNotFound,

    #[error("malformed tree: {0}")]
    MalformedTree(String),
}

pub type Result<T> = std::result::Result<T, TreeError>;
