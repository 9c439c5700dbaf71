//! `cwgh configure` – set repository credentials.

use anyhow::{bail, Result};
use cwgh_core::settings::{
    ConfigurationPrompt, SettingsStore, TomlSettingsStore, BRANCH, OWNER, REPO, TOKEN,
};

use crate::cli::terminal::StdinPrompt;

pub fn run_configure(
    mut store: TomlSettingsStore,
    token: Option<String>,
    owner: Option<String>,
    repo: Option<String>,
    branch: Option<String>,
) -> Result<()> {
    let given: Vec<(&str, String)> = [
        (TOKEN, token),
        (OWNER, owner),
        (REPO, repo),
        (BRANCH, branch),
    ]
    .into_iter()
    .filter_map(|(name, value)| value.map(|v| (name, v)))
    .collect();

    if given.is_empty() {
        let prompt = StdinPrompt { ask_all: true };
        if !prompt.request_configuration(&mut store) {
            bail!("settings incomplete: token, owner and repo are required");
        }
    } else {
        for (name, value) in &given {
            store.set_credential(name, value)?;
        }
    }

    println!("Settings saved to {}", store.path().display());
    if !store.is_fully_configured() {
        println!("Still missing: token, owner and repo must all be set before saving.");
    }
    Ok(())
}
