//! Page snapshots: the CLI's stand-in for a live kata page.
//!
//! A snapshot is a JSON object with the page URL, the metadata fields a page
//! reader would extract and, optionally, the editor contents:
//!
//! ```json
//! {
//!   "url": "https://www.codewars.com/kata/5277c8a221e209d3f6000b56/train/python",
//!   "title": "Valid Braces",
//!   "difficulty_tier": "6 kyu",
//!   "description_html": "<p>Write a function...</p>",
//!   "tags": ["Algorithms"],
//!   "language_id": "python",
//!   "solution": "def valid_braces(s): ..."
//! }
//! ```

use anyhow::{Context, Result};
use cwgh_core::artifact::ArtifactMetadata;
use cwgh_core::page::{Document, PageDataProvider, EDITOR_MARKER};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const STATEMENT_MARKER: &str = ".problem-statement";

#[derive(Debug, Clone, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    #[serde(flatten)]
    pub metadata: ArtifactMetadata,
    #[serde(default)]
    pub solution: Option<String>,
}

impl PageSnapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("read snapshot: {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("parse snapshot: {}", path.display()))
    }

    /// Markers the page would show once rendered. No editor without a solution.
    pub fn rendered_markers(&self) -> Vec<&'static str> {
        let mut markers = vec![STATEMENT_MARKER];
        if self.solution.is_some() {
            markers.push(EDITOR_MARKER);
        }
        markers
    }

    /// Render the snapshot into `document`.
    pub fn render(&self, document: &Document) {
        document.insert_markers(self.rendered_markers());
    }
}

impl PageDataProvider for PageSnapshot {
    fn artifact_metadata(&self) -> ArtifactMetadata {
        let mut metadata = self.metadata.clone();
        if metadata.source_url.trim().is_empty() {
            metadata.source_url = self.url.clone();
        }
        metadata
    }

    fn editor_contents(&self) -> String {
        self.solution.clone().unwrap_or_default()
    }
}
