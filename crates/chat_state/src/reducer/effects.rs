//! Side effects the presentation layer applies after each reduction.

use serde::Serialize;

use chat_tree::WireMessage;

use super::thinking::{ThinkingCaption, ThinkingId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Send the active transcript to the backend for a new answer.
    RequestCompletion { messages: Vec<WireMessage> },

    /// Tell the backend to stop generating. Fire-and-forget.
    StopRequested,

    /// The send control switches between "send" and "stop".
    GenerationChanged { generating: bool },

    TypingIndicator { visible: bool },

    /// Open an empty answer bubble for the in-flight turn.
    AssistantMessageStarted,

    /// Re-render the in-flight answer from its full accumulated content.
    RenderAssistant { content: String },

    ThinkingOpened { id: ThinkingId },

    ThinkingAppended { id: ThinkingId, text: String },

    ThinkingCaption { id: ThinkingId, caption: ThinkingCaption },

    ThinkingSticky { id: ThinkingId },

    /// Remove a thinking panel once `delay_ms` has passed.
    ThinkingRemoved { id: ThinkingId, delay_ms: u64 },

    ToolMessage { index: usize, content: String },

    AssistantCommitted { index: usize },

    ErrorMessage { message: String },

    /// User input that could not be acted on.
    InputRejected { reason: String },

    /// The visible transcript changed wholesale and must be rebuilt from the
    /// tree's active path.
    TranscriptReplaced,

    GenerateTitle { transcript: String },

    PersistHistory { title: String },
}
