//! History store trait and the file-backed implementation

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use chat_tree::{MessageTree, PersistedTree};

use crate::error::{HistoryError, Result};
use crate::index::{validate_name, HistoryIndex};

const INDEX_FILE: &str = "index.json";

/// Named, persisted conversations.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Stores `tree` under `name` and makes it the most recent entry.
    async fn save(&self, name: &str, tree: &MessageTree) -> Result<()>;

    /// Loads an entry; `None` if no entry has that name.
    async fn load(&self, name: &str) -> Result<Option<MessageTree>>;

    /// Entry names, most recent first.
    async fn list(&self) -> Result<Vec<String>>;

    /// Deletes an entry. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Renames one entry, keeping its place in the list.
    async fn rename(&self, old: &str, new: &str) -> Result<()>;
}

/// Stores the tree with its title set to the entry name.
pub(crate) fn titled(name: &str, tree: &MessageTree) -> MessageTree {
    let mut tree = tree.clone();
    tree.set_title(Some(name.to_string()));
    tree
}

/// One pretty-printed JSON file per entry plus an `index.json` holding the
/// order. File stems are the hex-encoded entry names, so any name within
/// [`MAX_NAME_BYTES`](crate::index::MAX_NAME_BYTES) is a valid file name.
pub struct FileHistoryStore {
    base_path: PathBuf,
    // Serialises index read-modify-write cycles.
    lock: Mutex<()>,
}

impl FileHistoryStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn entry_path(&self, name: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.json", hex::encode(name.as_bytes())))
    }

    fn index_path(&self) -> PathBuf {
        self.base_path.join(INDEX_FILE)
    }

    async fn read_index(&self) -> Result<HistoryIndex> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(HistoryIndex::default());
        }
        let contents = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    async fn write_index(&self, index: &HistoryIndex) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;
        let contents = serde_json::to_string_pretty(index)?;
        fs::write(self.index_path(), contents).await?;
        Ok(())
    }

    async fn write_entry(&self, name: &str, tree: &MessageTree) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;
        let contents = serde_json::to_string_pretty(&titled(name, tree))?;
        fs::write(self.entry_path(name), contents).await?;
        Ok(())
    }

    async fn read_entry(&self, name: &str) -> Result<Option<MessageTree>> {
        let path = self.entry_path(name);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path).await?;
        let persisted: PersistedTree = serde_json::from_str(&contents)?;
        Ok(Some(MessageTree::from_persisted(persisted)?))
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn save(&self, name: &str, tree: &MessageTree) -> Result<()> {
        validate_name(name)?;
        let _guard = self.lock.lock().await;

        self.write_entry(name, tree).await?;
        let mut index = self.read_index().await?;
        index.touch(name);
        self.write_index(&index).await?;

        tracing::info!(name = name, nodes = tree.node_count(), "FileHistoryStore: saved");
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<Option<MessageTree>> {
        let tree = self.read_entry(name).await?;
        if tree.is_none() {
            tracing::debug!(name = name, "FileHistoryStore: no such entry");
        }
        Ok(tree)
    }

    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.read_index().await?.names().to_vec())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;

        let path = self.entry_path(name);
        let had_file = path.exists();
        if had_file {
            fs::remove_file(&path).await?;
        }

        let mut index = self.read_index().await?;
        let listed = index.remove(name);
        if listed {
            self.write_index(&index).await?;
        }

        tracing::info!(name = name, existed = had_file || listed, "FileHistoryStore: deleted");
        Ok(had_file || listed)
    }

    async fn rename(&self, old: &str, new: &str) -> Result<()> {
        let _guard = self.lock.lock().await;

        let mut index = self.read_index().await?;
        index.rename(old, new)?;
        if old == new {
            return Ok(());
        }

        let tree = self
            .read_entry(old)
            .await?
            .ok_or_else(|| HistoryError::NotFound(old.to_string()))?;
        self.write_entry(new, &tree).await?;
        fs::remove_file(self.entry_path(old)).await?;
        self.write_index(&index).await?;

        tracing::info!(old = old, new = new, "FileHistoryStore: renamed");
        Ok(())
    }
}
