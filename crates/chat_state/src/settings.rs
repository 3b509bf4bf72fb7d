//! Model settings read by the reducer at each event.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThinkingMode {
    #[default]
    Disabled,
    Enabled,
    Auto,
}

impl fmt::Display for ThinkingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ThinkingMode::Disabled => "disabled",
            ThinkingMode::Enabled => "enabled",
            ThinkingMode::Auto => "auto",
        })
    }
}

impl FromStr for ThinkingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" => Ok(ThinkingMode::Disabled),
            "enabled" => Ok(ThinkingMode::Enabled),
            "auto" => Ok(ThinkingMode::Auto),
            other => Err(format!("unknown thinking mode: {other}")),
        }
    }
}

/// The currently selected model as seen by the reducer. Owned by the
/// presentation layer; never mutated by the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// The model advertises an `enabled` or `auto` thinking mode.
    pub thinking_capable: bool,
    /// The model is served from the local machine.
    pub is_local: bool,
    pub thinking_mode: ThinkingMode,
}

impl ModelSettings {
    /// Thinking mode after forcing local non-thinking models to `disabled`.
    pub fn effective_thinking_mode(&self) -> ThinkingMode {
        if self.is_local && !self.thinking_capable {
            ThinkingMode::Disabled
        } else {
            self.thinking_mode
        }
    }

    pub fn accepts_reasoning(&self) -> bool {
        self.effective_thinking_mode() != ThinkingMode::Disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_non_thinking_model_is_forced_off() {
        let settings = ModelSettings {
            thinking_capable: false,
            is_local: true,
            thinking_mode: ThinkingMode::Enabled,
        };
        assert_eq!(settings.effective_thinking_mode(), ThinkingMode::Disabled);
        assert!(!settings.accepts_reasoning());
    }

    #[test]
    fn remote_model_follows_selection() {
        let mut settings = ModelSettings {
            thinking_capable: true,
            is_local: false,
            thinking_mode: ThinkingMode::Auto,
        };
        assert!(settings.accepts_reasoning());
        settings.thinking_mode = ThinkingMode::Disabled;
        assert!(!settings.accepts_reasoning());
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!("AUTO".parse::<ThinkingMode>().unwrap(), ThinkingMode::Auto);
        assert!("sometimes".parse::<ThinkingMode>().is_err());
    }
}
