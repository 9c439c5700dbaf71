//! `cwgh probe <path>` – existence check for one repository path.

use anyhow::{anyhow, Result};
use cwgh_core::gateway::{CurlTransport, GatewayConfig, HttpGateway};
use cwgh_core::settings::{Credentials, TomlSettingsStore};
use cwgh_core::sync::{RemoteFileState, RemoteFileSynchronizer};
use std::sync::Arc;

pub async fn run_probe(store: &TomlSettingsStore, path: &str) -> Result<()> {
    let credentials = Credentials::from_store(store)
        .ok_or_else(|| anyhow!("not configured; run `cwgh configure` first"))?;
    let cfg = store.config();
    let gateway = HttpGateway::new(
        Arc::new(CurlTransport::new()),
        GatewayConfig {
            api_base: cfg.api_base.clone(),
            token: credentials.token,
            timeout: cfg.request_timeout(),
        },
    );
    let target = credentials.target;
    let repo = format!("{}/{}@{}", target.owner, target.repo, target.branch);
    let sync = RemoteFileSynchronizer::new(gateway, target);

    match sync.probe(path).await? {
        RemoteFileState::Absent => println!("{} is absent from {}", path, repo),
        RemoteFileState::Present { revision_token, .. } => {
            println!("{} exists in {} at {}", path, repo, revision_token)
        }
    }
    Ok(())
}
