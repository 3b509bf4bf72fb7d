use crate::structs::message::{Role, WireMessage};

/// One node of the conversation tree.
///
/// A node knows its children (by index) and which of them is active, but not
/// its parent; parent edges live in the owning tree's parent table.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageNode {
    index: usize,
    message: WireMessage,
    children: Vec<usize>,
    /// Position in `children` of the active branch. `None` until the first
    /// child is created.
    selected_child: Option<usize>,
}

impl MessageNode {
    pub fn new(index: usize, message: WireMessage) -> Self {
        Self {
            index,
            message,
            children: Vec::new(),
            selected_child: None,
        }
    }

    /// Rebuilds a node with its links, as read back from persistence.
    pub(crate) fn with_links(
        index: usize,
        message: WireMessage,
        children: Vec<usize>,
        selected_child: Option<usize>,
    ) -> Self {
        Self {
            index,
            message,
            children,
            selected_child,
        }
    }

    /// Creates a child node and makes it the active branch.
    ///
    /// The caller guarantees `new_index` is unique and larger than every
    /// index already handed out in the owning tree.
    pub fn create_child(&mut self, new_index: usize, message: WireMessage) -> MessageNode {
        self.children.push(new_index);
        self.selected_child = Some(self.children.len() - 1);
        MessageNode::new(new_index, message)
    }

    /// Index of the active child, if any.
    pub fn active_child(&self) -> Option<usize> {
        self.selected_child
            .and_then(|position| self.children.get(position).copied())
    }

    /// Projects the node onto the model-facing message shape.
    pub fn to_message(&self) -> WireMessage {
        self.message.clone()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn role(&self) -> Role {
        self.message.role()
    }

    pub fn content(&self) -> &str {
        self.message.content()
    }

    pub fn message(&self) -> &WireMessage {
        &self.message
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn selected_child_index(&self) -> Option<usize> {
        self.selected_child
    }

    /// Moves the active branch. Bounds are the tree's responsibility.
    pub(crate) fn set_selected_child(&mut self, position: usize) {
        debug_assert!(position < self.children.len());
        self.selected_child = Some(position);
    }
}
