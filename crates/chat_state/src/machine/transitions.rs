//! State transitions - turn FSM transition logic
//!
//! Every trigger is accepted in every phase; the machine only records where
//! the turn is, it never rejects input.

use super::events::TurnTrigger;
use super::states::TurnPhase;

/// Represents a state transition result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    /// The phase before the transition.
    pub from: TurnPhase,
    /// The phase after the transition.
    pub to: TurnPhase,
    /// The trigger that caused the transition.
    pub trigger: TurnTrigger,
    /// Whether the phase actually changed.
    pub changed: bool,
}

/// State machine for the generation turn.
#[derive(Debug, Clone)]
pub struct TurnMachine {
    current: TurnPhase,
    /// Transition history (limited).
    history: Vec<StateTransition>,
    max_history: usize,
}

impl Default for TurnMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnMachine {
    pub fn new() -> Self {
        Self {
            current: TurnPhase::Idle,
            history: Vec::new(),
            max_history: 50,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.current
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    /// Handle a trigger and move to the next phase.
    pub fn handle(&mut self, trigger: TurnTrigger) -> StateTransition {
        let from = self.current;
        let to = Self::next_phase(from, trigger);
        self.current = to;

        let transition = StateTransition {
            from,
            to,
            trigger,
            changed: from != to,
        };

        if transition.changed {
            tracing::debug!(from = ?from, to = ?to, trigger = ?trigger, "TurnMachine: transition");
        }

        self.history.push(transition.clone());
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }

        transition
    }

    fn next_phase(phase: TurnPhase, trigger: TurnTrigger) -> TurnPhase {
        use TurnPhase::*;
        use TurnTrigger::*;

        match (phase, trigger) {
            (_, TurnStarted) => AwaitingFirstChunk,

            (Idle | AwaitingFirstChunk | Finalizing, FirstChunk) => Streaming,
            (Streaming, FirstChunk) => Streaming,

            // Tool results interleave with the answer without ending the turn.
            (current, ToolCall) => current,

            (_, Final) => Finalizing,

            (_, Finish | Error | Stopped | Reset) => Idle,
        }
    }
}
