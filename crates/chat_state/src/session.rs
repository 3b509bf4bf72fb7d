//! The active conversation: one tree plus the reducer driving its current
//! turn.

use thiserror::Error;
use tokio::time::Instant;

use chat_tree::{MessageTree, Role, TreeError, WireMessage};

use crate::config::ChatConfig;
use crate::machine::StreamEvent;
use crate::reducer::{Effect, StreamReducer};
use crate::settings::ModelSettings;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("A response is still being generated")]
    Busy,

    #[error("Node {0} is not a user message")]
    NotAUserMessage(usize),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone)]
pub struct Session {
    config: ChatConfig,
    tree: MessageTree,
    reducer: StreamReducer,
}

impl Session {
    pub fn new(config: ChatConfig, tree: MessageTree) -> Self {
        let reducer = StreamReducer::new(config.aggregate.clone(), config.thinking.clone());
        Self {
            config,
            tree,
            reducer,
        }
    }

    /// A conversation holding only the configured seed messages.
    pub fn fresh(config: ChatConfig) -> Self {
        let tree = seed_tree(&config);
        Self::new(config, tree)
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn tree(&self) -> &MessageTree {
        &self.tree
    }

    pub fn reducer(&self) -> &StreamReducer {
        &self.reducer
    }

    pub fn title(&self) -> Option<&str> {
        self.tree.title()
    }

    pub fn is_generating(&self) -> bool {
        self.reducer.is_generating()
    }

    /// The transcript to send to the model.
    pub fn messages(&self) -> Vec<WireMessage> {
        self.tree.get_messages()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.reducer.next_deadline()
    }

    pub fn send_user_message(&mut self, text: &str, now: Instant) -> Result<Vec<Effect>> {
        let text = self.accept_input(text)?;
        let index = self.tree.push_back(WireMessage::user(text)).index();
        tracing::info!(index, "Session: user message appended");
        Ok(self.start_turn(false, now))
    }

    /// Replaces a user message with `text` as a new sibling branch and asks
    /// for a fresh answer.
    pub fn edit_user_message(
        &mut self,
        node: usize,
        text: &str,
        now: Instant,
    ) -> Result<Vec<Effect>> {
        let text = self.accept_input(text)?;
        self.branch_from(node, text, now)
    }

    /// Re-asks a user message unchanged on a new branch.
    pub fn regenerate(&mut self, node: usize, now: Instant) -> Result<Vec<Effect>> {
        if self.reducer.is_generating() {
            return Err(SessionError::Busy);
        }
        let text = self.tree.node(node)?.content().to_string();
        self.branch_from(node, text, now)
    }

    fn accept_input(&self, text: &str) -> Result<String> {
        if self.reducer.is_generating() {
            return Err(SessionError::Busy);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        Ok(text.to_string())
    }

    fn branch_from(&mut self, node: usize, text: String, now: Instant) -> Result<Vec<Effect>> {
        if self.tree.node(node)?.role() != Role::User {
            return Err(SessionError::NotAUserMessage(node));
        }
        let index = self.tree.edit_message(node, WireMessage::user(text))?.index();
        tracing::info!(original = node, index, "Session: user message branched");
        Ok(self.start_turn(true, now))
    }

    fn start_turn(&mut self, replaced: bool, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        if replaced {
            effects.push(Effect::TranscriptReplaced);
        }
        effects.extend(self.reducer.begin_turn(now));
        effects.push(Effect::RequestCompletion {
            messages: self.tree.get_messages(),
        });
        effects
    }

    /// Moves the branch selection around `node` one sibling back.
    pub fn previous_branch(&mut self, node: usize) -> Result<Vec<Effect>> {
        self.tree.previous_branch(node)?;
        Ok(vec![Effect::TranscriptReplaced])
    }

    pub fn next_branch(&mut self, node: usize) -> Result<Vec<Effect>> {
        self.tree.next_branch(node)?;
        Ok(vec![Effect::TranscriptReplaced])
    }

    pub fn stop(&mut self) -> Vec<Effect> {
        self.reducer.stop()
    }

    pub fn apply_event(
        &mut self,
        event: &StreamEvent,
        settings: &ModelSettings,
        now: Instant,
    ) -> Vec<Effect> {
        self.reducer.apply(&mut self.tree, event, settings, now)
    }

    pub fn poll_timers(&mut self, now: Instant) -> Vec<Effect> {
        self.reducer.poll_timers(now)
    }

    /// Stores a generated title and asks for the conversation to be saved
    /// under it. Blank titles are ignored.
    pub fn apply_generated_title(&mut self, title: &str) -> Vec<Effect> {
        let title = title.trim();
        if title.is_empty() {
            tracing::warn!("Session: ignoring empty generated title");
            return Vec::new();
        }
        self.tree.set_title(Some(title.to_string()));
        tracing::info!(title, "Session: title set");
        vec![Effect::PersistHistory {
            title: title.to_string(),
        }]
    }

    /// Starts over with a fresh seeded conversation.
    pub fn clear(&mut self, now: Instant) -> Vec<Effect> {
        let tree = seed_tree(&self.config);
        self.replace_tree(tree, now)
    }

    /// Swaps in a conversation loaded from history.
    pub fn load_history(&mut self, name: &str, mut tree: MessageTree, now: Instant) -> Vec<Effect> {
        tree.set_title(Some(name.to_string()));
        self.replace_tree(tree, now)
    }

    /// Reacts to a history entry being deleted elsewhere.
    pub fn history_deleted(&mut self, name: &str, now: Instant) -> Vec<Effect> {
        if self.tree.title() == Some(name) {
            tracing::info!(name, "Session: active conversation deleted");
            self.clear(now)
        } else {
            Vec::new()
        }
    }

    /// Follows a rename of the active conversation's history entry.
    pub fn history_renamed(&mut self, old: &str, new: &str) {
        if self.tree.title() == Some(old) {
            self.tree.set_title(Some(new.to_string()));
        }
    }

    fn replace_tree(&mut self, tree: MessageTree, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.reducer.is_generating() {
            effects.extend(self.reducer.stop());
        }
        effects.extend(self.reducer.reset_conversation(now));
        self.tree = tree;
        effects.push(Effect::TranscriptReplaced);
        tracing::debug!(nodes = self.tree.node_count(), "Session: conversation replaced");
        effects
    }

    pub fn into_tree(self) -> MessageTree {
        self.tree
    }
}

fn seed_tree(config: &ChatConfig) -> MessageTree {
    let mut tree = MessageTree::new(None, WireMessage::system(config.seed.system.clone()));
    tree.push_back(WireMessage::assistant(config.seed.greeting.clone()));
    tree
}
