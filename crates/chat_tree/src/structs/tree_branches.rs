//! Branch selection and editing for `MessageTree`.
//!
//! Selection is never clamped: asking for a branch that does not exist is a
//! caller error and leaves the tree untouched.

use crate::error::{Result, TreeError};
use crate::structs::message::WireMessage;
use crate::structs::node::MessageNode;
use crate::structs::tree::{BranchInfo, MessageTree};

impl MessageTree {
    /// Makes `children[position]` of `parent` the active branch.
    pub fn select_branch(&mut self, parent: usize, position: usize) -> Result<()> {
        let node = self.node_mut(parent)?;
        let available = node.children().len();
        if position >= available {
            tracing::warn!(
                parent = parent,
                requested = position,
                available = available,
                "MessageTree: rejected out-of-range branch selection"
            );
            return Err(TreeError::BranchOutOfRange {
                parent,
                requested: position as isize,
                available,
            });
        }
        node.set_selected_child(position);
        tracing::debug!(parent = parent, position = position, "MessageTree: branch selected");
        Ok(())
    }

    /// Switches the parent of `node` to the previous sibling branch.
    /// Returns the new selected position.
    pub fn previous_branch(&mut self, node: usize) -> Result<usize> {
        self.step_branch(node, -1)
    }

    /// Switches the parent of `node` to the next sibling branch.
    pub fn next_branch(&mut self, node: usize) -> Result<usize> {
        self.step_branch(node, 1)
    }

    fn step_branch(&mut self, node: usize, delta: isize) -> Result<usize> {
        let parent = self.parent_of(node)?.ok_or(TreeError::RootHasNoSiblings)?;
        let parent_node = self.node(parent)?;
        let available = parent_node.children().len();
        let current = parent_node.selected_child_index().unwrap_or(0) as isize;
        let requested = current + delta;
        if requested < 0 || requested as usize >= available {
            return Err(TreeError::BranchOutOfRange {
                parent,
                requested,
                available,
            });
        }
        self.select_branch(parent, requested as usize)?;
        Ok(requested as usize)
    }

    /// Position of the parent's active branch among `node`'s siblings.
    pub fn branch_info(&self, node: usize) -> Result<BranchInfo> {
        let Some(parent) = self.parent_of(node)? else {
            return Ok(BranchInfo {
                position: 1,
                total: 1,
            });
        };
        let parent_node = self.node(parent)?;
        Ok(BranchInfo {
            position: parent_node.selected_child_index().unwrap_or(0) + 1,
            total: parent_node.children().len(),
        })
    }

    /// Replaces `node` on the active path with `message` by adding a sibling
    /// branch. The original node and its subtree stay reachable.
    pub fn edit_message(&mut self, node: usize, message: WireMessage) -> Result<&MessageNode> {
        let parent = self.parent_of(node)?.ok_or(TreeError::RootHasNoSiblings)?;
        tracing::info!(node = node, parent = parent, "MessageTree: editing as new branch");
        self.push_message(parent, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_edits() -> MessageTree {
        let mut tree = MessageTree::from_messages(vec![
            WireMessage::system("s"),
            WireMessage::assistant("hi"),
        ])
        .unwrap();
        tree.push_back(WireMessage::user("v1"));
        tree.edit_message(2, WireMessage::user("v2")).unwrap();
        tree
    }

    #[test]
    fn previous_and_next_move_one_step() {
        let mut tree = two_edits();
        assert_eq!(tree.branch_info(3).unwrap(), BranchInfo { position: 2, total: 2 });

        assert_eq!(tree.previous_branch(3).unwrap(), 0);
        assert_eq!(tree.node(1).unwrap().active_child(), Some(2));

        assert_eq!(tree.next_branch(2).unwrap(), 1);
        assert_eq!(tree.node(1).unwrap().active_child(), Some(3));
    }

    #[test]
    fn stepping_past_either_end_fails_without_clamping() {
        let mut tree = two_edits();
        let err = tree.next_branch(3).unwrap_err();
        assert_eq!(
            err,
            TreeError::BranchOutOfRange {
                parent: 1,
                requested: 2,
                available: 2
            }
        );
        assert_eq!(tree.node(1).unwrap().selected_child_index(), Some(1));

        tree.previous_branch(3).unwrap();
        assert!(tree.previous_branch(2).is_err());
        assert_eq!(tree.node(1).unwrap().selected_child_index(), Some(0));
    }

    #[test]
    fn root_has_no_siblings() {
        let mut tree = two_edits();
        assert_eq!(tree.previous_branch(0).unwrap_err(), TreeError::RootHasNoSiblings);
        assert_eq!(
            tree.edit_message(0, WireMessage::system("x")).unwrap_err(),
            TreeError::RootHasNoSiblings
        );
        assert_eq!(tree.branch_info(0).unwrap(), BranchInfo { position: 1, total: 1 });
    }

    #[test]
    fn select_branch_on_leaf_is_rejected() {
        let mut tree = two_edits();
        assert!(matches!(
            tree.select_branch(3, 0),
            Err(TreeError::BranchOutOfRange { available: 0, .. })
        ));
    }
}
