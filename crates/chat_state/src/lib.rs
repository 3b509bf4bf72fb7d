//! chat_state - Streaming reducer and session loop for chat conversations
//!
//! Stream events from the inference backend are reduced onto a
//! [`chat_tree::MessageTree`] by [`StreamReducer`], which returns the
//! [`Effect`]s a presentation layer applies. [`Session`] owns the active
//! conversation and [`driver::run_session`] runs it on a single tokio task.

pub mod config;
pub mod driver;
pub mod machine;
pub mod reducer;
pub mod session;
pub mod settings;
pub mod timer;

pub use config::{AggregateConfig, ChatConfig, ConfigError, SeedConfig, ThinkingConfig};
pub use driver::{run_session, Inbound};
pub use machine::{StateTransition, StreamEvent, TurnMachine, TurnPhase, TurnTrigger};
pub use reducer::{Effect, StreamReducer, ThinkingCaption, ThinkingId, ThinkingPanel};
pub use session::{Session, SessionError};
pub use settings::{ModelSettings, ThinkingMode};
