//! `replay`: feeds recorded stream events through a live session.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use chat_state::{
    run_session, ChatConfig, Effect, Inbound, ModelSettings, Session, StreamEvent, ThinkingMode,
};
use history_manager::HistoryStore;

use crate::render::Printer;
use crate::title::local_title;

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// JSON-lines file of stream events
    #[arg(long)]
    pub events: PathBuf,

    /// User message that starts the turn
    #[arg(long)]
    pub message: Option<String>,

    /// Continue a saved conversation instead of starting fresh
    #[arg(long)]
    pub history: Option<String>,

    #[arg(long, default_value_t = ThinkingMode::Disabled)]
    pub thinking_mode: ThinkingMode,

    /// The model supports thinking
    #[arg(long)]
    pub thinking_capable: bool,

    /// The model runs locally
    #[arg(long)]
    pub local: bool,

    /// Print effects as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Do not save the conversation afterwards
    #[arg(long)]
    pub no_save: bool,
}

impl ReplayArgs {
    pub fn settings(&self) -> ModelSettings {
        ModelSettings {
            thinking_capable: self.thinking_capable,
            is_local: self.local,
            thinking_mode: self.thinking_mode,
        }
    }
}

/// One line of an events file. `delay_ms` paces the replay.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplayLine {
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(flatten)]
    pub event: StreamEvent,
}

pub fn parse_events(contents: &str) -> anyhow::Result<Vec<ReplayLine>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("line {}: invalid event", number + 1))
        })
        .collect()
}

/// What the effects asked the front end to do once the stream is over.
#[derive(Debug, Default)]
struct Requests {
    title_wanted: bool,
    persist_as: Option<String>,
}

impl Requests {
    fn observe(&mut self, effect: &Effect) {
        match effect {
            Effect::GenerateTitle { .. } => self.title_wanted = true,
            Effect::PersistHistory { title } => self.persist_as = Some(title.clone()),
            _ => {}
        }
    }
}

pub struct ReplayOutcome<W> {
    pub session: Session,
    pub saved_as: Option<String>,
    pub output: W,
}

async fn feed(inbound: &mpsc::Sender<Inbound>, lines: Vec<ReplayLine>) -> anyhow::Result<()> {
    for line in lines {
        if line.delay_ms > 0 {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(line.delay_ms)) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, stopping generation");
                    inbound.send(Inbound::Stop).await?;
                    return Ok(());
                }
            }
        }
        inbound.send(Inbound::Event(line.event)).await?;
    }
    Ok(())
}

pub async fn run_replay<S, W>(
    args: &ReplayArgs,
    config: ChatConfig,
    store: &S,
    out: W,
) -> anyhow::Result<ReplayOutcome<W>>
where
    S: HistoryStore,
    W: Write + Send + 'static,
{
    let contents = tokio::fs::read_to_string(&args.events)
        .await
        .with_context(|| format!("failed to read {}", args.events.display()))?;
    let lines = parse_events(&contents)?;
    tracing::info!(events = lines.len(), "Replay: loaded events");

    let mut session = Session::fresh(config);
    if let Some(name) = &args.history {
        let tree = store
            .load(name)
            .await?
            .with_context(|| format!("no history entry named {name:?}"))?;
        session.load_history(name, tree, Instant::now());
    }

    let (inbound_tx, inbound_rx) = mpsc::channel(64);
    let (effect_tx, mut effect_rx) = mpsc::channel::<Effect>(256);
    let (_settings_tx, settings_rx) = watch::channel(args.settings());
    let cancel = CancellationToken::new();
    let driver = tokio::spawn(run_session(
        session,
        inbound_rx,
        settings_rx,
        effect_tx,
        cancel.clone(),
    ));

    let json = args.json;
    let printer = tokio::spawn(async move {
        let mut printer = Printer::new(out, json);
        let mut requests = Requests::default();
        while let Some(effect) = effect_rx.recv().await {
            requests.observe(&effect);
            if let Err(e) = printer.print(&effect) {
                tracing::warn!(error = %e, "Replay: failed to print effect");
            }
        }
        (printer.into_inner(), requests)
    });

    if let Some(message) = &args.message {
        inbound_tx.send(Inbound::UserMessage(message.clone())).await?;
    }
    if let Err(e) = feed(&inbound_tx, lines).await {
        cancel.cancel();
        return Err(e);
    }
    drop(inbound_tx);

    let mut session = driver.await.context("session task failed")?;
    let (output, requests) = printer.await.context("printer task failed")?;

    let saved_as = if requests.title_wanted && session.title().is_none() {
        let title = local_title(session.tree());
        session.apply_generated_title(&title);
        Some(title)
    } else {
        requests.persist_as
    };

    if let Some(name) = saved_as.as_deref().filter(|_| !args.no_save) {
        store.save(name, session.tree()).await?;
        tracing::info!(name, "Replay: conversation saved");
    }

    Ok(ReplayOutcome {
        session,
        saved_as,
        output,
    })
}
