//! Remote path derivation.
//!
//! Maps an artifact to the directory and the two file paths it is stored
//! under. Pure: the same `(difficulty_tier, title)` always yields the same
//! directory, which is what makes repeated saves land on the same files.

mod language;
mod sanitize;

pub use language::ExtensionTable;
pub use sanitize::{sanitize_tier, sanitize_title, TIER_UNIT};

use crate::artifact::{CapturedArtifact, DEFAULT_TIER, DEFAULT_TITLE};
use crate::error::SaveError;

/// Name of the companion description file.
pub const DESCRIPTION_FILE: &str = "README.md";

/// Where the two files of one artifact live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Shared prefix, with a trailing `/`.
    pub directory: String,
    pub solution_path: String,
    pub description_path: String,
}

/// Resolves artifacts under a fixed repository root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: String,
    extensions: ExtensionTable,
}

impl PathResolver {
    pub fn new(root: &str, extensions: ExtensionTable) -> Self {
        Self {
            root: root.trim_matches('/').to_string(),
            extensions,
        }
    }

    /// Directory for a `(tier, title)` pair: `<root>/<tier> kyu/<title>/`.
    pub fn directory(&self, difficulty_tier: &str, title: &str) -> String {
        let tier = Some(sanitize_tier(difficulty_tier))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TIER.to_string());
        let title = Some(sanitize_title(title))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        if self.root.is_empty() {
            format!("{} {}/{}/", tier, TIER_UNIT, title)
        } else {
            format!("{}/{} {}/{}/", self.root, tier, TIER_UNIT, title)
        }
    }

    /// Both paths for `artifact`. Fails when the language has no known extension.
    pub fn resolve(&self, artifact: &CapturedArtifact) -> Result<ResolvedPaths, SaveError> {
        let ext = self
            .extensions
            .extension(&artifact.language_id)
            .ok_or_else(|| SaveError::UnmappedLanguage(artifact.language_id.clone()))?;
        let directory = self.directory(&artifact.difficulty_tier, &artifact.title);
        Ok(ResolvedPaths {
            solution_path: format!("{}solution.{}", directory, ext),
            description_path: format!("{}{}", directory, DESCRIPTION_FILE),
            directory,
        })
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_REPOSITORY_ROOT, ExtensionTable::new())
    }
}
