//! `chat_tree` holds a multi-turn conversation as a branching tree.
//!
//! Nodes live in an append-only arena addressed by integer index, with a
//! separate parent table. Editing a message never rewrites history: it adds
//! a sibling branch and makes it the active one.

pub mod error;
pub mod structs;

pub use error::{Result, TreeError};
pub use structs::message::{Role, WireMessage};
pub use structs::node::MessageNode;
pub use structs::persisted::{PersistedNode, PersistedTree};
pub use structs::tree::{BranchInfo, MessageTree};
