//! Terminal implementations of the host hooks.

use cwgh_core::settings::{
    ConfigurationPrompt, Notifier, SettingsStore, BRANCH, OWNER, REPO, TOKEN,
};
use std::io::{self, BufRead, Write};

/// Asks on stderr, reads answers from stdin.
pub struct StdinPrompt {
    /// Ask for every setting, not only the missing ones.
    pub ask_all: bool,
}

fn ask(question: &str, current: Option<&str>) -> io::Result<String> {
    let mut err = io::stderr().lock();
    match current {
        Some(c) => write!(err, "{} [{}]: ", question, c)?,
        None => write!(err, "{}: ", question)?,
    }
    err.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

impl ConfigurationPrompt for StdinPrompt {
    fn request_configuration(&self, store: &mut dyn SettingsStore) -> bool {
        let questions = [
            (TOKEN, "GitHub personal access token", true),
            (OWNER, "Repository owner", false),
            (REPO, "Repository name", false),
            (BRANCH, "Branch", false),
        ];
        for (name, question, secret) in questions {
            let current = store.get_credential(name);
            if current.is_some() && !self.ask_all {
                continue;
            }
            let shown = current.as_deref().map(|c| if secret { "set" } else { c });
            let answer = match ask(question, shown) {
                Ok(a) => a,
                Err(e) => {
                    tracing::warn!("reading {} failed: {}", name, e);
                    return false;
                }
            };
            if answer.is_empty() {
                continue;
            }
            if let Err(e) = store.set_credential(name, &answer) {
                eprintln!("could not store {}: {:#}", name, e);
                return false;
            }
        }
        store.is_fully_configured()
    }
}

/// Prints alerts to stderr.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn alert(&self, message: &str) {
        eprintln!("{}", message);
    }
}

/// `ghp_abcdef123456` -> `ghp_********3456`.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}
