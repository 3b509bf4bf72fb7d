//! Single-task event loop around a [`Session`].
//!
//! Inbound messages are handled strictly in arrival order. Between messages
//! the loop sleeps until the session's next timer deadline.

use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::machine::StreamEvent;
use crate::reducer::Effect;
use crate::session::{Session, SessionError};
use crate::settings::ModelSettings;

/// Everything the presentation layer and the transport can hand the loop.
#[derive(Debug, Clone)]
pub enum Inbound {
    Event(StreamEvent),
    UserMessage(String),
    Edit { node: usize, text: String },
    Regenerate { node: usize },
    PreviousBranch { node: usize },
    NextBranch { node: usize },
    Stop,
    TitleGenerated(String),
    Clear,
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn rejected(error: SessionError) -> Vec<Effect> {
    tracing::warn!(error = %error, "Driver: input rejected");
    vec![Effect::InputRejected {
        reason: error.to_string(),
    }]
}

fn handle(
    session: &mut Session,
    message: Inbound,
    settings: &watch::Receiver<ModelSettings>,
    now: Instant,
) -> Vec<Effect> {
    match message {
        Inbound::Event(event) => {
            let current = settings.borrow().clone();
            session.apply_event(&event, &current, now)
        }
        Inbound::UserMessage(text) => session
            .send_user_message(&text, now)
            .unwrap_or_else(rejected),
        Inbound::Edit { node, text } => session
            .edit_user_message(node, &text, now)
            .unwrap_or_else(rejected),
        Inbound::Regenerate { node } => session.regenerate(node, now).unwrap_or_else(rejected),
        Inbound::PreviousBranch { node } => session.previous_branch(node).unwrap_or_else(rejected),
        Inbound::NextBranch { node } => session.next_branch(node).unwrap_or_else(rejected),
        Inbound::Stop => session.stop(),
        Inbound::TitleGenerated(title) => session.apply_generated_title(&title),
        Inbound::Clear => session.clear(now),
    }
}

/// Runs until `cancel` fires or every inbound sender is dropped, then hands
/// the session back.
pub async fn run_session(
    mut session: Session,
    mut inbound: mpsc::Receiver<Inbound>,
    settings: watch::Receiver<ModelSettings>,
    effects: mpsc::Sender<Effect>,
    cancel: CancellationToken,
) -> Session {
    tracing::debug!("Driver: started");
    loop {
        let deadline = session.next_deadline();
        let batch = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Driver: cancelled");
                break;
            }
            _ = sleep_until_deadline(deadline) => session.poll_timers(Instant::now()),
            message = inbound.recv() => match message {
                Some(message) => handle(&mut session, message, &settings, Instant::now()),
                None => {
                    tracing::debug!("Driver: inbound channel closed");
                    break;
                }
            },
        };

        for effect in batch {
            if effects.send(effect).await.is_err() {
                tracing::warn!("Driver: effect receiver dropped");
                return session;
            }
        }
    }
    session
}
