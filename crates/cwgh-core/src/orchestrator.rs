//! Capture orchestration: one user trigger, end to end.
//!
//! gather → validate → configure → resolve → sync solution → sync README.
//! Any step failing ends the attempt; nothing is retried and nothing already
//! written is rolled back.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use crate::artifact::CapturedArtifact;
use crate::config::CwghConfig;
use crate::error::SaveError;
use crate::gateway::{GatewayConfig, HttpGateway, Transport};
use crate::page::{Document, PageDataProvider, EDITOR_MARKER};
use crate::path_resolver::{ExtensionTable, PathResolver, ResolvedPaths};
use crate::readiness::await_ready;
use crate::session::{TriggerControl, TriggerState};
use crate::settings::{ConfigurationPrompt, Credentials, Notifier, SettingsStore};
use crate::sync::{FileRole, RemoteFileSynchronizer, SyncReport};

/// Everything the orchestrator takes from configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub api_base: String,
    pub request_timeout: Duration,
    pub repository_root: String,
    pub languages: BTreeMap<String, String>,
    pub editor_wait: Duration,
    pub cooldown: Duration,
}

impl From<&CwghConfig> for OrchestratorOptions {
    fn from(cfg: &CwghConfig) -> Self {
        Self {
            api_base: cfg.api_base.clone(),
            request_timeout: cfg.request_timeout(),
            repository_root: cfg.repository_root.clone(),
            languages: cfg.languages.clone(),
            editor_wait: cfg.timing.editor_wait(),
            cooldown: cfg.timing.cooldown(),
        }
    }
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self::from(&CwghConfig::default())
    }
}

/// Both files of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub paths: ResolvedPaths,
    pub solution: SyncReport,
    pub description: SyncReport,
}

#[derive(Debug)]
pub enum TriggerOutcome {
    /// A save was already in flight or cooling down; nothing happened.
    Rejected,
    Saved(SaveReport),
    Failed(SaveError),
}

/// Prompt used when the host has none: never completes the settings.
struct NoPrompt;

impl ConfigurationPrompt for NoPrompt {
    fn request_configuration(&self, _store: &mut dyn SettingsStore) -> bool {
        false
    }
}

/// Notifier used when the host has none: the message goes to the log.
struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

pub struct CaptureOrchestrator {
    document: Arc<Document>,
    provider: Arc<dyn PageDataProvider>,
    settings: Mutex<Box<dyn SettingsStore>>,
    prompt: Arc<dyn ConfigurationPrompt>,
    notifier: Arc<dyn Notifier>,
    transport: Arc<dyn Transport>,
    control: Arc<TriggerControl>,
    resolver: PathResolver,
    options: OrchestratorOptions,
}

impl CaptureOrchestrator {
    pub fn new(
        document: Arc<Document>,
        provider: Arc<dyn PageDataProvider>,
        settings: Box<dyn SettingsStore>,
        transport: Arc<dyn Transport>,
        options: OrchestratorOptions,
    ) -> Self {
        let resolver = PathResolver::new(
            &options.repository_root,
            ExtensionTable::with_extra(&options.languages),
        );
        Self {
            document,
            provider,
            settings: Mutex::new(settings),
            prompt: Arc::new(NoPrompt),
            notifier: Arc::new(LogNotifier),
            transport,
            control: TriggerControl::new(options.cooldown),
            resolver,
            options,
        }
    }

    pub fn with_prompt(mut self, prompt: Arc<dyn ConfigurationPrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn trigger_state(&self) -> TriggerState {
        self.control.state()
    }

    pub fn subscribe_trigger(&self) -> watch::Receiver<TriggerState> {
        self.control.subscribe()
    }

    /// True while a save runs or its cool-down has not elapsed.
    pub fn is_busy(&self) -> bool {
        self.control.is_busy()
    }

    /// Handle one activation of the save trigger.
    pub async fn on_user_trigger(&self) -> TriggerOutcome {
        let Some(guard) = self.control.try_begin() else {
            tracing::debug!("save already in progress, trigger ignored");
            return TriggerOutcome::Rejected;
        };

        let result = self.save().await;
        if let Err(e) = &result {
            if e.is_validation() {
                tracing::info!("save stopped: {}", e);
            } else {
                tracing::warn!("save failed: {}", e);
            }
            self.notifier.alert(&format!("Save failed: {}", e));
        }
        self.control.settle(guard, result.is_ok());

        match result {
            Ok(report) => TriggerOutcome::Saved(report),
            Err(e) => TriggerOutcome::Failed(e),
        }
    }

    async fn save(&self) -> Result<SaveReport, SaveError> {
        let metadata = self.provider.artifact_metadata();
        let solution = self.read_solution().await;
        let mut artifact = CapturedArtifact::from_parts(metadata, solution);
        if artifact.source_url.trim().is_empty() {
            artifact.source_url = self.document.url();
        }
        if !artifact.has_solution() {
            return Err(SaveError::EmptySolution);
        }

        let credentials = self.ensure_configured()?;
        let paths = self.resolver.resolve(&artifact)?;
        tracing::debug!(directory = %paths.directory, language = %artifact.language_id, "resolved paths");

        let gateway = HttpGateway::new(
            Arc::clone(&self.transport),
            GatewayConfig {
                api_base: self.options.api_base.clone(),
                token: credentials.token,
                timeout: self.options.request_timeout,
            },
        );
        let sync = RemoteFileSynchronizer::new(gateway, credentials.target);

        let solution = sync
            .sync_file(
                &paths.solution_path,
                &artifact.solution_text,
                FileRole::Solution,
                &artifact.title,
            )
            .await?;
        let description = sync
            .sync_file(
                &paths.description_path,
                &artifact.render_readme(),
                FileRole::Description,
                &artifact.title,
            )
            .await
            .map_err(|e| {
                tracing::warn!(path = %paths.solution_path, "solution was written but README was not");
                e
            })?;

        tracing::info!(directory = %paths.directory, "saved {}", artifact.title);
        Ok(SaveReport {
            paths,
            solution,
            description,
        })
    }

    /// Editor contents after a bounded wait for the editor. Empty on timeout.
    async fn read_solution(&self) -> String {
        let doc = &self.document;
        match await_ready(
            doc.mutations(),
            || doc.contains(EDITOR_MARKER),
            self.options.editor_wait,
        )
        .await
        {
            Ok(()) => self.provider.editor_contents(),
            Err(e) => {
                tracing::warn!("editor not available: {}", e);
                String::new()
            }
        }
    }

    fn ensure_configured(&self) -> Result<Credentials, SaveError> {
        let mut store = self
            .settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !store.is_fully_configured() {
            tracing::info!("repository settings incomplete, asking for them");
            if !self.prompt.request_configuration(&mut **store) {
                return Err(SaveError::ConfigurationCancelled);
            }
        }
        Credentials::from_store(&**store).ok_or(SaveError::ConfigurationCancelled)
    }
}
