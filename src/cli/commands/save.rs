//! `cwgh save <snapshot>` – run one capture-and-save for a page snapshot.

use anyhow::{bail, Context, Result};
use cwgh_core::gateway::CurlTransport;
use cwgh_core::orchestrator::{CaptureOrchestrator, OrchestratorOptions, TriggerOutcome};
use cwgh_core::page::Document;
use cwgh_core::readiness::{LifecycleEvent, LifecycleOptions, PageLifecycle};
use cwgh_core::session::TriggerState;
use cwgh_core::settings::TomlSettingsStore;
use cwgh_core::sync::{SyncOutcome, SyncReport};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::cli::snapshot::PageSnapshot;
use crate::cli::terminal::{StdinPrompt, TerminalNotifier};

#[derive(Debug, Clone)]
pub struct SaveArgs {
    pub snapshot: PathBuf,
    pub solution: Option<PathBuf>,
    pub no_prompt: bool,
}

fn describe(report: &SyncReport) -> String {
    let verb = match report.outcome {
        SyncOutcome::Created => "created",
        SyncOutcome::Updated => "updated",
        SyncOutcome::Unchanged => "unchanged",
    };
    match &report.revision_token {
        Some(sha) => format!("{:<9} {} ({})", verb, report.path, sha),
        None => format!("{:<9} {}", verb, report.path),
    }
}

pub async fn run_save(store: TomlSettingsStore, args: SaveArgs) -> Result<()> {
    let cfg = store.config().clone();

    let mut snapshot = PageSnapshot::load(&args.snapshot)?;
    if let Some(path) = &args.solution {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read solution: {}", path.display()))?;
        snapshot.solution = Some(text);
    }
    let snapshot = Arc::new(snapshot);

    let document = Arc::new(Document::new(snapshot.url.clone()));
    let (tx, mut events) = mpsc::channel(4);
    let lifecycle = PageLifecycle::new(
        Arc::clone(&document),
        LifecycleOptions {
            timeout: cfg.timing.readiness_timeout(),
            rearm_delay: cfg.timing.rearm_delay(),
            ..LifecycleOptions::default()
        },
    )
    .spawn(tx);
    snapshot.render(&document);

    match events.recv().await {
        Some(LifecycleEvent::Ready { url, .. }) => println!("Page ready: {}", url),
        Some(LifecycleEvent::TimedOut { url }) => bail!("page {} never became ready", url),
        None => bail!("page lifecycle stopped before the page was ready"),
    }

    let mut orchestrator = CaptureOrchestrator::new(
        document,
        snapshot,
        Box::new(store),
        Arc::new(CurlTransport::new()),
        OrchestratorOptions::from(&cfg),
    )
    .with_notifier(Arc::new(TerminalNotifier));
    if !args.no_prompt {
        orchestrator = orchestrator.with_prompt(Arc::new(StdinPrompt { ask_all: false }));
    }

    let mut states = orchestrator.subscribe_trigger();
    let printer = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            println!("[{}]", state);
            if state != TriggerState::Busy {
                break;
            }
        }
    });

    let outcome = orchestrator.on_user_trigger().await;
    let _ = printer.await;
    lifecycle.abort();

    match outcome {
        TriggerOutcome::Saved(report) => {
            println!("{}", describe(&report.solution));
            println!("{}", describe(&report.description));
            Ok(())
        }
        TriggerOutcome::Failed(e) => Err(e).context("save failed"),
        TriggerOutcome::Rejected => bail!("a save is already in progress"),
    }
}
