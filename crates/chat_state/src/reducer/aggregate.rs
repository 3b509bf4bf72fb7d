//! Coalescing of short answer fragments.
//!
//! Fragments are buffered and released in larger pieces to cut down on
//! re-renders. A fragment that is long, contains a newline, or ends a
//! sentence releases the buffer at once; otherwise a debounce timer does.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::AggregateConfig;
use crate::timer::ScheduledTask;

const SENTENCE_TERMINALS: [char; 6] = ['.', '!', '?', '。', '！', '？'];

/// Whether `fragment` alone releases the buffer.
pub fn flushes_immediately(fragment: &str, threshold: usize) -> bool {
    fragment.chars().count() >= threshold
        || fragment.contains('\n')
        || fragment
            .trim_end()
            .chars()
            .last()
            .is_some_and(|c| SENTENCE_TERMINALS.contains(&c))
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    config: AggregateConfig,
    buffer: String,
    timer: ScheduledTask,
}

impl Aggregator {
    pub fn new(config: AggregateConfig) -> Self {
        Self {
            config,
            buffer: String::new(),
            timer: ScheduledTask::new(),
        }
    }

    pub fn config(&self) -> &AggregateConfig {
        &self.config
    }

    /// Buffers `fragment`. Returns the text to apply now, if any; otherwise
    /// the debounce timer is (re)armed.
    pub fn push(&mut self, fragment: &str, now: Instant) -> Option<String> {
        if !self.config.enabled {
            return (!fragment.is_empty()).then(|| fragment.to_string());
        }

        let threshold = self.config.threshold();
        let immediate = flushes_immediately(fragment, threshold);
        self.buffer.push_str(fragment);

        if immediate || self.buffer.chars().count() >= threshold {
            return self.drain();
        }

        self.timer
            .schedule_after(now, Duration::from_millis(self.config.timeout_ms));
        tracing::trace!(
            buffered = self.buffer.len(),
            timeout_ms = self.config.timeout_ms,
            "Aggregator: flush deferred"
        );
        None
    }

    /// Takes the buffered text and disarms the timer.
    pub fn drain(&mut self) -> Option<String> {
        self.timer.cancel();
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    /// Drops the buffered text without applying it. Returns whether anything
    /// was dropped.
    pub fn discard(&mut self) -> bool {
        self.timer.cancel();
        let had_text = !self.buffer.is_empty();
        self.buffer.clear();
        had_text
    }

    /// Releases the buffer if the debounce timer has expired.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        if self.timer.fire_if_due(now) {
            self.drain()
        } else {
            None
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn pending(&self) -> &str {
        &self.buffer
    }
}
