//! Most-recent-first list of history names.

use serde::{Deserialize, Serialize};

use crate::error::{HistoryError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryIndex {
    #[serde(default)]
    names: Vec<String>,
}

/// Longest name, in bytes, that still fits a hex-encoded file stem on
/// common file systems.
pub const MAX_NAME_BYTES: usize = 120;

pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.len() > MAX_NAME_BYTES {
        return Err(HistoryError::InvalidName);
    }
    Ok(())
}

impl HistoryIndex {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Moves `name` to the front, adding it if absent.
    pub fn touch(&mut self, name: &str) {
        self.names.retain(|n| n != name);
        self.names.insert(0, name.to_string());
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }

    /// Renames the entry called `old` in place. Other entries are left alone.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        validate_name(new)?;
        let position = self
            .names
            .iter()
            .position(|n| n == old)
            .ok_or_else(|| HistoryError::NotFound(old.to_string()))?;
        if old == new {
            return Ok(());
        }
        if self.contains(new) {
            return Err(HistoryError::NameTaken(new.to_string()));
        }
        self.names[position] = new.to_string();
        Ok(())
    }
}
