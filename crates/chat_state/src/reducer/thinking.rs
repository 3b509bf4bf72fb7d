//! The reasoning ("thinking") panel shown above an answer.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

pub type ThinkingId = u64;

/// Status line of a thinking panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinkingCaption {
    Thinking,
    /// Still thinking, with whole seconds elapsed.
    ThinkingFor(u64),
    /// Finished after the given whole seconds.
    ThoughtFor(u64),
    /// The user stopped generation mid-thought.
    Stopped,
}

impl fmt::Display for ThinkingCaption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thinking => write!(f, "Thinking"),
            Self::ThinkingFor(secs) => write!(f, "Thinking {secs}s"),
            Self::ThoughtFor(secs) => write!(f, "Thought for {secs}s"),
            Self::Stopped => write!(f, "Thinking stopped"),
        }
    }
}

fn is_invisible(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{1F}' | '\u{7F}' | '\u{200B}' | '\u{FEFF}')
}

/// True when `text` holds nothing but control characters, zero-width
/// characters and whitespace.
pub fn is_blank_reasoning(text: &str) -> bool {
    text.chars().all(|c| is_invisible(c) || c.is_whitespace())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinkingPanel {
    id: ThinkingId,
    started_at: Instant,
    content: String,
    caption: ThinkingCaption,
    /// Set once thinking has completed; sticky panels are never removed by
    /// timing-based cleanup.
    sticky: bool,
}

impl ThinkingPanel {
    pub fn new(id: ThinkingId, now: Instant) -> Self {
        Self {
            id,
            started_at: now,
            content: String::new(),
            caption: ThinkingCaption::Thinking,
            sticky: false,
        }
    }

    pub fn id(&self) -> ThinkingId {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn caption(&self) -> ThinkingCaption {
        self.caption
    }

    pub fn is_sticky(&self) -> bool {
        self.sticky
    }

    /// Appends verbatim; line breaks are preserved.
    pub fn append(&mut self, text: &str) {
        self.content.push_str(text);
    }

    pub fn elapsed_secs(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.started_at).as_secs()
    }

    pub fn set_caption(&mut self, caption: ThinkingCaption) -> ThinkingCaption {
        self.caption = caption;
        caption
    }

    /// Stamps the final elapsed time without making the panel sticky.
    pub fn stamp(&mut self, now: Instant) -> ThinkingCaption {
        let elapsed = self.elapsed_secs(now);
        self.set_caption(ThinkingCaption::ThoughtFor(elapsed))
    }

    /// Marks thinking as complete and stamps the elapsed time.
    pub fn freeze(&mut self, now: Instant) -> ThinkingCaption {
        self.sticky = true;
        self.stamp(now)
    }

    /// How much longer the panel must stay up before it may be removed.
    pub fn removal_delay(&self, now: Instant, min_visible: Duration) -> Duration {
        min_visible.saturating_sub(now.saturating_duration_since(self.started_at))
    }
}
