//! State machine module
//!
//! Contains the stream events and the turn FSM.

mod events;
mod states;
mod transitions;

pub use events::{StreamEvent, TurnTrigger};
pub use states::TurnPhase;
pub use transitions::{StateTransition, TurnMachine};
