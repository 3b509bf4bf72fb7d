//! In-memory history store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use chat_tree::MessageTree;

use crate::error::{HistoryError, Result};
use crate::index::{validate_name, HistoryIndex};
use crate::storage::{titled, HistoryStore};

#[derive(Default)]
struct Entries {
    index: HistoryIndex,
    trees: HashMap<String, MessageTree>,
}

/// Keeps entries for the lifetime of the process.
#[derive(Default)]
pub struct MemoryHistoryStore {
    entries: RwLock<Entries>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn save(&self, name: &str, tree: &MessageTree) -> Result<()> {
        validate_name(name)?;
        let mut entries = self.entries.write().await;
        entries.trees.insert(name.to_string(), titled(name, tree));
        entries.index.touch(name);
        tracing::debug!(name = name, "MemoryHistoryStore: saved");
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<Option<MessageTree>> {
        Ok(self.entries.read().await.trees.get(name).cloned())
    }

    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().await.index.names().to_vec())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        let had_tree = entries.trees.remove(name).is_some();
        let listed = entries.index.remove(name);
        Ok(had_tree || listed)
    }

    async fn rename(&self, old: &str, new: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.index.rename(old, new)?;
        if old == new {
            return Ok(());
        }
        let tree = entries
            .trees
            .remove(old)
            .ok_or_else(|| HistoryError::NotFound(old.to_string()))?;
        entries.trees.insert(new.to_string(), titled(new, &tree));
        Ok(())
    }
}
