use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeError};
use crate::structs::message::{Role, WireMessage};
use crate::structs::node::MessageNode;
use crate::structs::persisted::PersistedTree;

/// Caption shown in the transcript in place of a tool result.
pub const TOOL_CALLED_CAPTION: &str = "[tool called]";

/// A branching conversation.
///
/// `nodes` is an append-only arena: position equals node index, and indices
/// are never reused. `parent_map[i]` is the parent of node `i`; the root maps
/// to itself. Both sequences always have the same length.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "PersistedTree", try_from = "PersistedTree")]
pub struct MessageTree {
    pub(crate) title: Option<String>,
    pub(crate) root: usize,
    pub(crate) parent_map: Vec<usize>,
    pub(crate) nodes: Vec<MessageNode>,
}

/// Where a node sits among its siblings, for the "k/n" indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BranchInfo {
    /// 1-based position of the active sibling.
    pub position: usize,
    pub total: usize,
}

impl BranchInfo {
    pub fn has_previous(&self) -> bool {
        self.position > 1
    }

    pub fn has_next(&self) -> bool {
        self.position < self.total
    }
}

impl MessageTree {
    /// Creates a tree holding only `root` at index 0.
    pub fn new(title: Option<String>, root: WireMessage) -> Self {
        Self {
            title,
            root: 0,
            parent_map: vec![0],
            nodes: vec![MessageNode::new(0, root)],
        }
    }

    /// Builds a linear chain: each message becomes the only child of the one
    /// before it. Returns `None` for an empty sequence.
    pub fn from_messages<I>(messages: I) -> Option<Self>
    where
        I: IntoIterator<Item = WireMessage>,
    {
        let mut messages = messages.into_iter();
        let mut tree = MessageTree::new(None, messages.next()?);
        for message in messages {
            tree.push_back(message);
        }
        Some(tree)
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    pub fn root(&self) -> &MessageNode {
        &self.nodes[self.root]
    }

    pub fn node(&self, index: usize) -> Result<&MessageNode> {
        self.nodes.get(index).ok_or(TreeError::NodeOutOfBounds {
            index,
            len: self.nodes.len(),
        })
    }

    pub(crate) fn node_mut(&mut self, index: usize) -> Result<&mut MessageNode> {
        let len = self.nodes.len();
        self.nodes
            .get_mut(index)
            .ok_or(TreeError::NodeOutOfBounds { index, len })
    }

    pub fn nodes(&self) -> &[MessageNode] {
        &self.nodes
    }

    pub fn parent_map(&self) -> &[usize] {
        &self.parent_map
    }

    /// Number of nodes, which is also the next index to be assigned.
    pub fn node_count(&self) -> usize {
        self.parent_map.len()
    }

    /// Parent of `index`, or `None` for the root.
    pub fn parent_of(&self, index: usize) -> Result<Option<usize>> {
        self.node(index)?;
        if index == self.root().index() {
            return Ok(None);
        }
        Ok(Some(self.parent_map[index]))
    }

    /// Appends `message` as a new child of `parent_index` and makes it the
    /// parent's active branch.
    pub fn push_message(
        &mut self,
        parent_index: usize,
        message: WireMessage,
    ) -> Result<&MessageNode> {
        if parent_index >= self.nodes.len() {
            return Err(TreeError::ParentOutOfBounds {
                index: parent_index,
                len: self.nodes.len(),
            });
        }
        Ok(self.attach(parent_index, message))
    }

    /// Appends under the most recently added node, whether or not it is on
    /// the active path.
    pub fn push_back(&mut self, message: WireMessage) -> &MessageNode {
        let last = self.node_count() - 1;
        self.attach(last, message)
    }

    fn attach(&mut self, parent_index: usize, message: WireMessage) -> &MessageNode {
        let new_index = self.parent_map.len();
        let role = message.role();
        let child = self.nodes[parent_index].create_child(new_index, message);
        self.parent_map.push(parent_index);
        self.nodes.push(child);

        tracing::debug!(
            index = new_index,
            parent = parent_index,
            role = %role,
            node_count = self.nodes.len(),
            "MessageTree: node appended"
        );

        &self.nodes[new_index]
    }

    /// Indices on the active path, root first.
    pub fn active_path(&self) -> Vec<usize> {
        let mut path = vec![self.root().index()];
        let mut node = self.root();
        while let Some(child) = node.active_child() {
            match self.nodes.get(child) {
                Some(next) => {
                    path.push(child);
                    node = next;
                }
                None => break,
            }
        }
        path
    }

    /// The active transcript in model-facing form. Recomputed on every call.
    pub fn get_messages(&self) -> Vec<WireMessage> {
        self.active_path()
            .into_iter()
            .map(|index| self.nodes[index].to_message())
            .collect()
    }

    /// Visible text of the active path, as the transcript pane would show it.
    pub fn transcript_text(&self) -> String {
        self.active_path()
            .into_iter()
            .map(|index| &self.nodes[index])
            .filter(|node| !node.content().is_empty())
            .filter_map(|node| match node.role() {
                Role::User | Role::Assistant => Some(node.content()),
                Role::Tool => Some(TOOL_CALLED_CAPTION),
                Role::System => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MessageTree {
        MessageTree::from_messages(vec![
            WireMessage::system("be brief"),
            WireMessage::assistant("hello"),
        ])
        .unwrap()
    }

    #[test]
    fn push_message_rejects_unknown_parent() {
        let mut tree = seeded();
        let err = tree.push_message(7, WireMessage::user("x")).unwrap_err();
        assert_eq!(err, TreeError::ParentOutOfBounds { index: 7, len: 2 });
        assert_eq!(tree.node_count(), 2);
        assert_eq!(tree.nodes().len(), tree.parent_map().len());
    }

    #[test]
    fn push_back_extends_the_latest_node_not_the_active_tail() {
        let mut tree = seeded();
        tree.push_back(WireMessage::user("first"));
        // Branch off the root; node 3 is now the latest node but the
        // active path runs root -> 3.
        tree.push_message(0, WireMessage::assistant("alt")).unwrap();
        // Re-select the original branch under the root.
        tree.select_branch(0, 0).unwrap();

        let appended = tree.push_back(WireMessage::user("after alt")).index();
        assert_eq!(tree.parent_map()[appended], 3);
        assert_eq!(
            tree.get_messages(),
            vec![
                WireMessage::system("be brief"),
                WireMessage::assistant("hello"),
                WireMessage::user("first"),
            ]
        );
    }

    #[test]
    fn parent_of_root_is_none() {
        let tree = seeded();
        assert_eq!(tree.parent_of(0).unwrap(), None);
        assert_eq!(tree.parent_of(1).unwrap(), Some(0));
        assert!(tree.parent_of(5).is_err());
    }

    #[test]
    fn transcript_text_skips_system_and_captions_tools() {
        let mut tree = seeded();
        tree.push_back(WireMessage::user("what time is it"));
        tree.push_back(WireMessage::tool("12:00", "call_1"));
        tree.push_back(WireMessage::assistant("It is noon."));

        assert_eq!(
            tree.transcript_text(),
            format!("hello\nwhat time is it\n{TOOL_CALLED_CAPTION}\nIt is noon.")
        );
    }
}
