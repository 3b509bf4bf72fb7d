//! Terminal rendering of session effects.

use std::io::{self, Write};

use colored::Colorize;

use chat_state::Effect;

/// Prints effects as they arrive, either for a human or as JSON lines.
pub struct Printer<W: Write> {
    out: W,
    json: bool,
    /// Answer text already on screen for the in-flight turn.
    rendered: String,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, json: bool) -> Self {
        Self {
            out,
            json,
            rendered: String::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn print(&mut self, effect: &Effect) -> io::Result<()> {
        if self.json {
            serde_json::to_writer(&mut self.out, effect)?;
            writeln!(self.out)?;
            return self.out.flush();
        }

        match effect {
            Effect::RequestCompletion { messages } => {
                let line = format!("-> request with {} messages", messages.len());
                writeln!(self.out, "{}", line.dimmed())?;
            }
            Effect::AssistantMessageStarted => {
                self.rendered.clear();
                write!(self.out, "{} ", "assistant:".green().bold())?;
            }
            Effect::RenderAssistant { content } => {
                // Renders carry the whole answer; only the new tail is written.
                let tail = content
                    .strip_prefix(self.rendered.as_str())
                    .unwrap_or(content.as_str());
                write!(self.out, "{tail}")?;
                self.rendered = content.clone();
            }
            Effect::AssistantCommitted { .. } => {
                writeln!(self.out)?;
                self.rendered.clear();
            }
            Effect::ThinkingOpened { .. } => writeln!(self.out, "{}", "thinking:".cyan())?,
            Effect::ThinkingAppended { text, .. } => write!(self.out, "{}", text.dimmed())?,
            Effect::ThinkingCaption { caption, .. } => {
                writeln!(self.out, "{}", format!("[{caption}]").cyan())?
            }
            Effect::ToolMessage { content, .. } => {
                writeln!(self.out, "{} {}", "[tool called]".yellow(), content)?
            }
            Effect::ErrorMessage { message } => {
                writeln!(self.out, "{} {}", "error:".red().bold(), message)?
            }
            Effect::InputRejected { reason } => {
                writeln!(self.out, "{} {}", "rejected:".red(), reason)?
            }
            other => tracing::trace!(effect = ?other, "Printer: nothing to show"),
        }
        self.out.flush()
    }
}
