use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The message shape sent to the inference backend.
///
/// Field presence is fixed per role: assistant messages always carry
/// `tool_calls` and tool messages always carry `tool_call_id`, serialised as
/// `null` when unset.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum WireMessage {
    System {
        #[serde(default)]
        content: String,
    },
    User {
        #[serde(default)]
        content: String,
    },
    Assistant {
        #[serde(default)]
        content: String,
        /// Requested tool invocations, forwarded verbatim.
        #[serde(default)]
        tool_calls: Option<Vec<Value>>,
    },
    Tool {
        #[serde(default)]
        content: String,
        #[serde(default)]
        tool_call_id: Option<String>,
    },
}

impl WireMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: None,
        }
    }

    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<Value>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Some(tool_calls),
        }
    }

    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self::Tool {
            content: content.into(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Builds a message from loose fields, keeping only the ones the role owns.
    pub fn from_parts(
        role: Role,
        content: String,
        tool_calls: Option<Vec<Value>>,
        tool_call_id: Option<String>,
    ) -> Self {
        match role {
            Role::System => Self::System { content },
            Role::User => Self::User { content },
            Role::Assistant => Self::Assistant {
                content,
                tool_calls,
            },
            Role::Tool => Self::Tool {
                content,
                tool_call_id,
            },
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::System { .. } => Role::System,
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
            Self::Tool { .. } => Role::Tool,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::System { content }
            | Self::User { content }
            | Self::Assistant { content, .. }
            | Self::Tool { content, .. } => content,
        }
    }

    pub fn tool_calls(&self) -> Option<&[Value]> {
        match self {
            Self::Assistant {
                tool_calls: Some(calls),
                ..
            } => Some(calls),
            _ => None,
        }
    }

    pub fn tool_call_id(&self) -> Option<&str> {
        match self {
            Self::Tool {
                tool_call_id: Some(id),
                ..
            } => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn assistant_always_serializes_tool_calls() {
        let value = serde_json::to_value(WireMessage::assistant("hi")).unwrap();
        assert_eq!(
            value,
            json!({"role": "assistant", "content": "hi", "tool_calls": null})
        );
    }

    #[test]
    fn tool_always_serializes_tool_call_id() {
        let value = serde_json::to_value(WireMessage::tool("42", "call_1")).unwrap();
        assert_eq!(
            value,
            json!({"role": "tool", "content": "42", "tool_call_id": "call_1"})
        );
    }

    #[test]
    fn user_and_system_carry_only_content() {
        let user = serde_json::to_value(WireMessage::user("q")).unwrap();
        let system = serde_json::to_value(WireMessage::system("s")).unwrap();
        assert_eq!(user, json!({"role": "user", "content": "q"}));
        assert_eq!(system, json!({"role": "system", "content": "s"}));
    }

    #[test]
    fn from_parts_drops_fields_the_role_does_not_own() {
        let msg = WireMessage::from_parts(
            Role::User,
            "hello".to_string(),
            Some(vec![json!({"id": "x"})]),
            Some("call".to_string()),
        );
        assert_eq!(msg, WireMessage::user("hello"));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let result: Result<WireMessage, _> =
            serde_json::from_value(json!({"role": "narrator", "content": "x"}));
        assert!(result.is_err());
    }
}
