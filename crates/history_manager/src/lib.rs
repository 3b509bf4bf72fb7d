//! # History Manager
//!
//! Persists named conversations as serialized message trees and keeps them
//! ordered most recent first.

pub mod error;
pub mod index;
pub mod memory;
pub mod storage;

pub use error::{HistoryError, Result};
pub use index::{HistoryIndex, MAX_NAME_BYTES};
pub use memory::MemoryHistoryStore;
pub use storage::{FileHistoryStore, HistoryStore};
