//! StreamReducer - applies stream events to the active tree.
//!
//! The reducer is synchronous and owns no tasks. Every entry point takes the
//! current instant and returns the effects the presentation layer should
//! apply, in order. Deferred work (the aggregation debounce and the thinking
//! ticker) is kept as deadlines that the owner polls through
//! [`StreamReducer::poll_timers`].

pub mod aggregate;
pub mod effects;
pub mod thinking;

use std::time::Duration;

use tokio::time::Instant;

use chat_tree::{MessageTree, WireMessage};

use crate::config::{AggregateConfig, ThinkingConfig};
use crate::machine::{StreamEvent, TurnMachine, TurnPhase, TurnTrigger};
use crate::settings::ModelSettings;
use crate::timer::{earliest, ScheduledTask};

pub use aggregate::Aggregator;
pub use effects::Effect;
pub use thinking::{ThinkingCaption, ThinkingId, ThinkingPanel};

#[derive(Debug, Clone)]
pub struct StreamReducer {
    thinking_config: ThinkingConfig,
    machine: TurnMachine,
    aggregator: Aggregator,
    ticker: ScheduledTask,
    thinking: Option<ThinkingPanel>,
    next_thinking_id: ThinkingId,
    generating: bool,
    has_first_chunk: bool,
    typing: bool,
    /// Answer text of the in-flight turn. Lives here until `final`.
    content: String,
    title_requested: bool,
}

impl StreamReducer {
    pub fn new(aggregate: AggregateConfig, thinking: ThinkingConfig) -> Self {
        Self {
            thinking_config: thinking,
            machine: TurnMachine::new(),
            aggregator: Aggregator::new(aggregate),
            ticker: ScheduledTask::new(),
            thinking: None,
            next_thinking_id: 1,
            generating: false,
            has_first_chunk: false,
            typing: false,
            content: String::new(),
            title_requested: false,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.machine.phase()
    }

    pub fn machine(&self) -> &TurnMachine {
        &self.machine
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn has_first_chunk(&self) -> bool {
        self.has_first_chunk
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn pending_fragment(&self) -> &str {
        self.aggregator.pending()
    }

    pub fn thinking(&self) -> Option<&ThinkingPanel> {
        self.thinking.as_ref()
    }

    pub fn title_requested(&self) -> bool {
        self.title_requested
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_armed()
    }

    /// Earliest armed timer, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        earliest(self.aggregator.deadline(), self.ticker.deadline())
    }

    fn min_visible(&self) -> Duration {
        Duration::from_millis(self.thinking_config.min_visible_ms)
    }

    fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.thinking_config.tick_interval_ms)
    }

    /// Starts a turn after a request has been sent.
    ///
    /// Whatever thinking panel the previous turn left behind is released:
    /// sticky panels stay on screen, unfinished ones are removed.
    pub fn begin_turn(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.release_thinking(now, &mut effects);
        self.ticker.cancel();
        self.aggregator.discard();
        self.content.clear();
        self.has_first_chunk = false;
        self.generating = true;
        self.machine.handle(TurnTrigger::TurnStarted);

        effects.push(Effect::GenerationChanged { generating: true });
        if !self.typing {
            self.typing = true;
            effects.push(Effect::TypingIndicator { visible: true });
        }
        tracing::debug!("StreamReducer: turn started");
        effects
    }

    /// Applies one inbound event.
    pub fn apply(
        &mut self,
        tree: &mut MessageTree,
        event: &StreamEvent,
        settings: &ModelSettings,
        now: Instant,
    ) -> Vec<Effect> {
        tracing::trace!(kind = event.kind(), "StreamReducer: event");
        match event {
            StreamEvent::Chunk { data } => self.on_chunk(data, now),
            StreamEvent::Reasoning { data } => self.on_reasoning(data, settings, now),
            StreamEvent::ToolCall { data, tool_call_id } => {
                self.on_tool_call(tree, data, tool_call_id, now)
            }
            StreamEvent::Final => self.on_final(tree, now),
            StreamEvent::Finish => self.on_finish(tree, now),
            StreamEvent::Error { data } => self.on_error(data, now),
            StreamEvent::Unknown => {
                tracing::debug!("StreamReducer: ignoring unknown event");
                Vec::new()
            }
        }
    }

    /// Fires whichever timers are due at `now`.
    pub fn poll_timers(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();

        if let Some(text) = self.aggregator.poll(now) {
            tracing::trace!(len = text.len(), "StreamReducer: debounced flush");
            self.apply_text(&text, now, &mut effects);
        }

        if self.ticker.fire_if_due(now) {
            if let Some(panel) = self.thinking.as_mut() {
                let elapsed = panel.elapsed_secs(now);
                let caption = panel.set_caption(ThinkingCaption::ThinkingFor(elapsed));
                effects.push(Effect::ThinkingCaption { id: panel.id(), caption });
            }
        }

        effects
    }

    /// User-initiated stop. Takes effect locally without waiting for the
    /// backend to confirm.
    pub fn stop(&mut self) -> Vec<Effect> {
        let mut effects = vec![Effect::StopRequested];
        if self.generating {
            self.generating = false;
            effects.push(Effect::GenerationChanged { generating: false });
        }
        if self.ticker.cancel() {
            tracing::trace!("StreamReducer: ticker cancelled by stop");
        }
        // Sticky panels stay on screen but still show that the turn was stopped.
        if let Some(panel) = self.thinking.as_mut() {
            let caption = panel.set_caption(ThinkingCaption::Stopped);
            effects.push(Effect::ThinkingCaption { id: panel.id(), caption });
        }
        self.machine.handle(TurnTrigger::Stopped);
        tracing::info!(phase = ?self.machine.phase(), "StreamReducer: stop requested");
        effects
    }

    /// Drops all per-turn state. Unfinished thinking panels are torn down
    /// no earlier than their minimum visible time; sticky panels stay.
    pub fn reset(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.aggregator.discard() {
            tracing::debug!("StreamReducer: discarded pending fragment");
        }
        self.ticker.cancel();
        self.release_thinking(now, &mut effects);
        self.content.clear();
        self.has_first_chunk = false;
        if self.typing {
            self.typing = false;
            effects.push(Effect::TypingIndicator { visible: false });
        }
        if self.generating {
            self.generating = false;
            effects.push(Effect::GenerationChanged { generating: false });
        }
        self.machine.handle(TurnTrigger::Reset);
        effects
    }

    /// Resets the turn and forgets that a title was requested. Used when the
    /// conversation itself is replaced.
    pub fn reset_conversation(&mut self, now: Instant) -> Vec<Effect> {
        self.title_requested = false;
        self.reset(now)
    }

    fn release_thinking(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        let Some(panel) = self.thinking.take() else {
            return;
        };
        if panel.is_sticky() {
            tracing::trace!(id = panel.id(), "StreamReducer: releasing sticky thinking panel");
            return;
        }
        let delay = panel.removal_delay(now, self.min_visible());
        effects.push(Effect::ThinkingRemoved {
            id: panel.id(),
            delay_ms: delay.as_millis() as u64,
        });
    }

    fn on_chunk(&mut self, data: &str, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !self.has_first_chunk {
            self.start_answer(now, &mut effects);
        }
        if let Some(text) = self.aggregator.push(data, now) {
            self.apply_text(&text, now, &mut effects);
        }
        effects
    }

    fn start_answer(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        self.has_first_chunk = true;
        self.ticker.cancel();
        if let Some(panel) = self.thinking.as_mut().filter(|panel| !panel.is_sticky()) {
            let caption = panel.freeze(now);
            effects.push(Effect::ThinkingSticky { id: panel.id() });
            effects.push(Effect::ThinkingCaption { id: panel.id(), caption });
        }
        if self.typing {
            self.typing = false;
            effects.push(Effect::TypingIndicator { visible: false });
        }
        effects.push(Effect::AssistantMessageStarted);
        self.machine.handle(TurnTrigger::FirstChunk);
    }

    fn apply_text(&mut self, text: &str, now: Instant, effects: &mut Vec<Effect>) {
        if !self.has_first_chunk {
            self.start_answer(now, effects);
        }
        self.content.push_str(text);
        effects.push(Effect::RenderAssistant {
            content: self.content.clone(),
        });
    }

    fn flush(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        if let Some(text) = self.aggregator.drain() {
            self.apply_text(&text, now, effects);
        }
    }

    fn on_reasoning(&mut self, data: &str, settings: &ModelSettings, now: Instant) -> Vec<Effect> {
        if !settings.accepts_reasoning() {
            tracing::trace!(
                mode = %settings.effective_thinking_mode(),
                "StreamReducer: reasoning ignored"
            );
            return Vec::new();
        }
        if thinking::is_blank_reasoning(data) {
            return Vec::new();
        }

        let mut effects = Vec::new();
        if self.thinking.is_none() {
            let id = self.next_thinking_id;
            self.next_thinking_id += 1;
            self.thinking = Some(ThinkingPanel::new(id, now));
            self.ticker.start_repeating(now, self.tick_interval());
            effects.push(Effect::ThinkingOpened { id });
            effects.push(Effect::ThinkingCaption {
                id,
                caption: ThinkingCaption::Thinking,
            });
            tracing::debug!(id, "StreamReducer: thinking started");
        }

        if let Some(panel) = self.thinking.as_mut() {
            panel.append(data);
            effects.push(Effect::ThinkingAppended {
                id: panel.id(),
                text: data.to_string(),
            });
        }
        effects
    }

    fn on_tool_call(
        &mut self,
        tree: &mut MessageTree,
        data: &str,
        tool_call_id: &str,
        now: Instant,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.flush(now, &mut effects);
        self.ticker.cancel();
        if let Some(panel) = self.thinking.as_mut().filter(|panel| !panel.is_sticky()) {
            let caption = panel.stamp(now);
            effects.push(Effect::ThinkingCaption { id: panel.id(), caption });
        }

        let tool_call_id = (!tool_call_id.is_empty()).then(|| tool_call_id.to_string());
        let index = tree
            .push_back(WireMessage::from_parts(
                chat_tree::Role::Tool,
                data.to_string(),
                None,
                tool_call_id,
            ))
            .index();
        effects.push(Effect::ToolMessage {
            index,
            content: data.to_string(),
        });
        self.machine.handle(TurnTrigger::ToolCall);
        tracing::debug!(index, "StreamReducer: tool result appended");
        effects
    }

    fn settle_thinking(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        self.ticker.cancel();
        if let Some(panel) = self.thinking.as_mut().filter(|panel| !panel.is_sticky()) {
            let caption = panel.freeze(now);
            effects.push(Effect::ThinkingSticky { id: panel.id() });
            effects.push(Effect::ThinkingCaption { id: panel.id(), caption });
        }
    }

    fn on_final(&mut self, tree: &mut MessageTree, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.flush(now, &mut effects);
        self.settle_thinking(now, &mut effects);

        let content = std::mem::take(&mut self.content);
        let index = tree.push_back(WireMessage::assistant(content)).index();
        effects.push(Effect::AssistantCommitted { index });

        self.has_first_chunk = false;
        if self.generating {
            self.generating = false;
            effects.push(Effect::GenerationChanged { generating: false });
        }
        self.machine.handle(TurnTrigger::Final);
        tracing::info!(index, "StreamReducer: assistant answer committed");
        effects
    }

    fn on_finish(&mut self, tree: &MessageTree, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.flush(now, &mut effects);
        self.settle_thinking(now, &mut effects);

        if self.generating {
            self.generating = false;
            effects.push(Effect::GenerationChanged { generating: false });
        }
        if self.typing {
            self.typing = false;
            effects.push(Effect::TypingIndicator { visible: false });
        }
        self.machine.handle(TurnTrigger::Finish);

        match tree.title() {
            Some(title) => effects.push(Effect::PersistHistory {
                title: title.to_string(),
            }),
            None if !self.title_requested => {
                self.title_requested = true;
                tracing::debug!("StreamReducer: requesting title");
                effects.push(Effect::GenerateTitle {
                    transcript: tree.transcript_text(),
                });
            }
            None => tracing::debug!("StreamReducer: title already requested"),
        }
        effects
    }

    fn on_error(&mut self, data: &str, now: Instant) -> Vec<Effect> {
        tracing::warn!(error = %data, "StreamReducer: turn aborted");
        let mut effects = self.reset(now);
        self.machine.handle(TurnTrigger::Error);
        effects.push(Effect::ErrorMessage {
            message: data.to_string(),
        });
        effects
    }
}
