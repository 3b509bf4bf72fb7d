//! Turn phases - the lifecycle of one generation turn.

use serde::{Deserialize, Serialize};

/// Phase of the in-flight generation turn.
///
/// Thinking is tracked separately: it can be active while awaiting the first
/// chunk and, once frozen, outlives the turn.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// No turn in flight.
    #[default]
    Idle,

    /// Request sent, nothing of the answer received yet.
    AwaitingFirstChunk,

    /// Answer text is arriving.
    Streaming,

    /// The answer was committed; waiting for the backend to close the turn.
    Finalizing,
}

impl TurnPhase {
    /// Check if a new user message may start a turn.
    pub fn accepts_user_input(&self) -> bool {
        matches!(self, Self::Idle | Self::Finalizing)
    }

    /// Get a human-readable description of the current phase.
    pub fn description(&self) -> &str {
        match self {
            Self::Idle => "Ready for input",
            Self::AwaitingFirstChunk => "Waiting for AI response",
            Self::Streaming => "Receiving AI response",
            Self::Finalizing => "Finishing response",
        }
    }
}
