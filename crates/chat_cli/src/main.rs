use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chat_cli::history::{run_history, HistoryCommand};
use chat_cli::replay::{run_replay, ReplayArgs};
use chat_state::ChatConfig;
use history_manager::FileHistoryStore;

#[derive(Parser)]
#[command(name = "chat-tree")]
#[command(about = "Replay chat streams onto a branching conversation tree")]
#[command(version)]
struct Cli {
    /// Config file (.json or .toml) used instead of the default lookup
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding saved conversations
    #[arg(long, global = true)]
    history_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines event file through a chat session
    Replay(ReplayArgs),
    /// Manage saved conversations
    #[command(subcommand)]
    History(HistoryCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ChatConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ChatConfig::load(),
    };
    if let Some(dir) = cli.history_dir {
        config.history_dir = Some(dir);
    }
    let store = FileHistoryStore::new(config.history_dir());
    tracing::debug!(path = %store.base_path().display(), "Using history directory");

    match cli.command {
        Commands::Replay(args) => {
            let outcome = run_replay(&args, config, &store, io::stdout()).await?;
            match outcome.saved_as {
                Some(name) if !args.no_save => eprintln!("saved as {name:?}"),
                _ => {}
            }
        }
        Commands::History(command) => {
            run_history(&command, &store, &mut io::stdout()).await?;
        }
    }

    Ok(())
}
