//! Terminal presentation layer for chat conversations.
//!
//! Replays recorded stream events through the session loop, prints the
//! resulting effects and manages saved history.

pub mod history;
pub mod render;
pub mod replay;
pub mod title;
