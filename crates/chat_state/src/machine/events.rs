//! Stream events - the inbound server-sent events and the turn triggers
//! derived from them.

use serde::{Deserialize, Serialize};

/// One server-sent event, tagged on `type`.
///
/// Unrecognised tags deserialise to `Unknown` and are ignored downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A fragment of the assistant's answer.
    Chunk {
        #[serde(default)]
        data: String,
    },

    /// A fragment of the reasoning trace.
    Reasoning {
        #[serde(default)]
        data: String,
    },

    /// A tool result produced by the backend during the turn.
    ToolCall {
        #[serde(default)]
        data: String,
        #[serde(default)]
        tool_call_id: String,
    },

    /// The assistant answer is complete.
    Final,

    /// The turn is over.
    Finish,

    /// The backend aborted the turn.
    Error {
        #[serde(default)]
        data: String,
    },

    #[serde(other)]
    Unknown,
}

impl StreamEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Chunk { .. } => "chunk",
            Self::Reasoning { .. } => "reasoning",
            Self::ToolCall { .. } => "tool_call",
            Self::Final => "final",
            Self::Finish => "finish",
            Self::Error { .. } => "error",
            Self::Unknown => "unknown",
        }
    }

    /// Check if this event ends the turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finish | Self::Error { .. })
    }
}

/// What moved the turn state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnTrigger {
    /// A request was sent for a new assistant answer.
    TurnStarted,
    /// The first answer chunk of the turn arrived.
    FirstChunk,
    /// A tool result arrived.
    ToolCall,
    /// The assistant answer was committed to the tree.
    Final,
    /// The backend closed the turn.
    Finish,
    /// The backend reported an error.
    Error,
    /// The user asked to stop generating.
    Stopped,
    /// The conversation was replaced or cleared.
    Reset,
}
