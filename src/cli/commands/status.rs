//! `cwgh status` – show the current configuration.

use anyhow::Result;
use cwgh_core::settings::{SettingsStore, TomlSettingsStore, BRANCH, OWNER, REPO, TOKEN};

use crate::cli::terminal::mask_token;

pub fn run_status(store: &TomlSettingsStore) -> Result<()> {
    let cfg = store.config();
    let show = |name: &str| store.get_credential(name).unwrap_or_else(|| "-".to_string());

    println!("{:<12} {}", "CONFIG", store.path().display());
    println!(
        "{:<12} {}",
        "TOKEN",
        store
            .get_credential(TOKEN)
            .map(|t| mask_token(&t))
            .unwrap_or_else(|| "-".to_string())
    );
    println!("{:<12} {}", "OWNER", show(OWNER));
    println!("{:<12} {}", "REPO", show(REPO));
    println!("{:<12} {}", "BRANCH", show(BRANCH));
    println!("{:<12} {}", "API", cfg.api_base);
    println!("{:<12} {}", "ROOT", cfg.repository_root);
    if !cfg.languages.is_empty() {
        let extra: Vec<String> = cfg
            .languages
            .iter()
            .map(|(id, ext)| format!("{}={}", id, ext))
            .collect();
        println!("{:<12} {}", "LANGUAGES", extra.join(", "));
    }
    println!(
        "{:<12} {}",
        "CONFIGURED",
        if store.is_fully_configured() { "yes" } else { "no" }
    );
    Ok(())
}
