pub mod message;
pub mod node;
pub mod persisted;
pub mod tree;
pub mod tree_branches;
