//! Persisted form of a `MessageTree`.
//!
//! The JSON shape is shared with the history store:
//! `{title, parentMap, messageNodes: [{index, content, role, tool_calls,
//! tool_call_id, children, selectedChildIndex}]}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, TreeError};
use crate::structs::message::{Role, WireMessage};
use crate::structs::node::MessageNode;
use crate::structs::tree::MessageTree;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PersistedTree {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "parentMap")]
    pub parent_map: Vec<usize>,
    #[serde(rename = "messageNodes")]
    pub message_nodes: Vec<PersistedNode>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PersistedNode {
    pub index: usize,
    #[serde(default)]
    pub content: String,
    pub role: Role,
    #[serde(default)]
    pub tool_calls: Option<Vec<Value>>,
    #[serde(default)]
    pub tool_call_id: Option<String>,
    #[serde(default)]
    pub children: Vec<usize>,
    #[serde(rename = "selectedChildIndex", default)]
    pub selected_child_index: Option<usize>,
}

impl From<&MessageNode> for PersistedNode {
    fn from(node: &MessageNode) -> Self {
        let message = node.message();
        Self {
            index: node.index(),
            content: message.content().to_string(),
            role: message.role(),
            tool_calls: message.tool_calls().map(<[Value]>::to_vec),
            tool_call_id: message.tool_call_id().map(str::to_string),
            children: node.children().to_vec(),
            selected_child_index: node.selected_child_index(),
        }
    }
}

impl MessageTree {
    pub fn to_persisted(&self) -> PersistedTree {
        PersistedTree {
            title: self.title.clone(),
            parent_map: self.parent_map.clone(),
            message_nodes: self.nodes.iter().map(PersistedNode::from).collect(),
        }
    }

    /// Rebuilds a tree in two phases: every node is materialised first so
    /// that all indices resolve, then the child links are restored.
    pub fn from_persisted(data: PersistedTree) -> Result<Self> {
        let len = data.message_nodes.len();
        if data.parent_map.len() != len {
            return Err(TreeError::MalformedTree(format!(
                "{} nodes but {} parent entries",
                len,
                data.parent_map.len()
            )));
        }

        let mut links = Vec::with_capacity(len);
        let mut materialized = Vec::with_capacity(len);
        for (position, node) in data.message_nodes.into_iter().enumerate() {
            if node.index != position {
                return Err(TreeError::MalformedTree(format!(
                    "node at position {position} carries index {}",
                    node.index
                )));
            }
            let message = WireMessage::from_parts(
                node.role,
                node.content,
                node.tool_calls,
                node.tool_call_id,
            );
            materialized.push((node.index, message));
            links.push((node.children, node.selected_child_index));
        }

        if let Some(&parent) = data.parent_map.first().filter(|parent| **parent != 0) {
            return Err(TreeError::MalformedTree(format!("root has parent {parent}")));
        }

        let mut listed = vec![false; len];
        let mut nodes = Vec::with_capacity(len);
        for ((index, message), (children, selected)) in materialized.into_iter().zip(links) {
            for &child in &children {
                if child == 0 || child >= len || data.parent_map[child] != index || listed[child] {
                    return Err(TreeError::MalformedTree(format!(
                        "node {index} lists {child} as a child"
                    )));
                }
                listed[child] = true;
            }
            let selected = match (children.is_empty(), selected) {
                (true, _) => None,
                (false, Some(position)) if position < children.len() => Some(position),
                (false, other) => {
                    return Err(TreeError::MalformedTree(format!(
                        "node {index} selects {other:?} of {} children",
                        children.len()
                    )));
                }
            };
            nodes.push(MessageNode::with_links(index, message, children, selected));
        }

        let root = nodes
            .iter()
            .position(|node| node.index() == 0)
            .ok_or(TreeError::RootNotFound)?;

        if let Some((index, parent)) = data
            .parent_map
            .iter()
            .enumerate()
            .skip(1)
            .find(|(index, parent)| **parent >= *index)
        {
            return Err(TreeError::MalformedTree(format!(
                "node {index} has parent {parent}"
            )));
        }

        if let Some(orphan) = (1..len).find(|&index| !listed[index]) {
            return Err(TreeError::MalformedTree(format!(
                "node {orphan} is missing from the children of node {}",
                data.parent_map[orphan]
            )));
        }

        tracing::debug!(
            node_count = len,
            title = ?data.title,
            "MessageTree: restored from persisted form"
        );

        Ok(Self {
            title: data.title,
            root,
            parent_map: data.parent_map,
            nodes,
        })
    }
}

impl From<MessageTree> for PersistedTree {
    fn from(tree: MessageTree) -> Self {
        tree.to_persisted()
    }
}

impl TryFrom<PersistedTree> for MessageTree {
    type Error = TreeError;

    fn try_from(data: PersistedTree) -> Result<Self> {
        MessageTree::from_persisted(data)
    }
}
