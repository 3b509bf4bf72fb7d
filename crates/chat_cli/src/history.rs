//! `history`: inspect and manage saved conversations.

use std::io::Write;

use anyhow::Context;
use clap::Subcommand;
use colored::Colorize;

use chat_tree::{MessageTree, Role};
use history_manager::HistoryStore;

#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List saved conversations, most recent first
    List,
    /// Print the active transcript of a conversation
    Show { name: String },
    /// Rename a conversation
    Rename { old: String, new: String },
    /// Delete a conversation
    Delete { name: String },
}

fn write_transcript<W: Write>(tree: &MessageTree, out: &mut W) -> anyhow::Result<()> {
    for index in tree.active_path() {
        let node = tree.node(index)?;
        let label = match node.role() {
            Role::System => "system:".dimmed(),
            Role::User => "user:".blue().bold(),
            Role::Assistant => "assistant:".green().bold(),
            Role::Tool => "tool:".yellow(),
        };
        let branch = tree.branch_info(index)?;
        if branch.total > 1 {
            writeln!(out, "{} [{}/{}] {}", label, branch.position, branch.total, node.content())?;
        } else {
            writeln!(out, "{} {}", label, node.content())?;
        }
    }
    Ok(())
}

pub async fn run_history<S, W>(
    command: &HistoryCommand,
    store: &S,
    out: &mut W,
) -> anyhow::Result<()>
where
    S: HistoryStore,
    W: Write,
{
    match command {
        HistoryCommand::List => {
            let names = store.list().await?;
            if names.is_empty() {
                writeln!(out, "{}", "no saved conversations".dimmed())?;
            }
            for (position, name) in names.iter().enumerate() {
                writeln!(out, "{:>3}  {}", position + 1, name)?;
            }
        }
        HistoryCommand::Show { name } => {
            let tree = store
                .load(name)
                .await?
                .with_context(|| format!("no history entry named {name:?}"))?;
            write_transcript(&tree, out)?;
        }
        HistoryCommand::Rename { old, new } => {
            store.rename(old, new).await?;
            writeln!(out, "renamed {old:?} to {new:?}")?;
        }
        HistoryCommand::Delete { name } => {
            if store.delete(name).await? {
                writeln!(out, "deleted {name:?}")?;
            } else {
                writeln!(out, "{}", format!("no history entry named {name:?}").dimmed())?;
            }
        }
    }
    Ok(())
}
