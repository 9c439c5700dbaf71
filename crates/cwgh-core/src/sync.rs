//! Remote file synchronization: probe, then conditional write.
//!
//! The store only overwrites a file when the write carries the file's current
//! revision token (`sha`). Each sync therefore probes the path first and
//! attaches the token if and only if the probe found the file. A 404 on the
//! probe is the create branch, not an error; anything else fails the sync.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

use crate::error::SaveError;
use crate::gateway::{GatewayError, HttpGateway, Method};

/// Repository and branch every write goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoTarget {
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

/// Result of probing a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteFileState {
    Absent,
    Present {
        revision_token: String,
        /// Stored bytes, when the store inlined them in the probe answer.
        content: Option<Vec<u8>>,
    },
}

impl RemoteFileState {
    pub fn exists(&self) -> bool {
        matches!(self, RemoteFileState::Present { .. })
    }

    pub fn revision_token(&self) -> Option<&str> {
        match self {
            RemoteFileState::Present { revision_token, .. } => Some(revision_token),
            RemoteFileState::Absent => None,
        }
    }

    /// True when the stored file is known to hold exactly `bytes`.
    pub fn holds(&self, bytes: &[u8]) -> bool {
        matches!(self, RemoteFileState::Present { content: Some(c), .. } if c.as_slice() == bytes)
    }
}

/// Which of the artifact's two files a sync touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Solution,
    Description,
}

impl FileRole {
    pub fn label(self) -> &'static str {
        match self {
            FileRole::Solution => "solution",
            FileRole::Description => "README",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
    /// The stored content already matched; nothing was written.
    Unchanged,
}

/// What one `sync_file` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub path: String,
    pub role: FileRole,
    pub outcome: SyncOutcome,
    /// Token of the current revision: the new one after a write, the existing
    /// one when unchanged.
    pub revision_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    sha: String,
    /// Base64, wrapped with newlines by the contents API.
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WrittenEntry {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    #[serde(default)]
    content: Option<WrittenEntry>,
}

/// Standard base64 of the UTF-8 bytes of `text`.
pub fn encode_content(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

fn decode_content(encoded: &str) -> Option<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact).ok()
}

/// Change annotation recorded in the remote history.
pub fn change_message(state: &RemoteFileState, role: FileRole, title: &str) -> String {
    let verb = if state.exists() { "Update" } else { "Add" };
    format!("{} {} for {}", verb, role.label(), title)
}

/// Creates or updates single files in one repository branch.
#[derive(Debug, Clone)]
pub struct RemoteFileSynchronizer {
    gateway: HttpGateway,
    target: RepoTarget,
}

impl RemoteFileSynchronizer {
    pub fn new(gateway: HttpGateway, target: RepoTarget) -> Self {
        Self { gateway, target }
    }

    fn contents_url(&self, path: &str, with_ref: bool) -> Result<String, GatewayError> {
        let segments = [
            "repos",
            self.target.owner.as_str(),
            self.target.repo.as_str(),
            "contents",
            path,
        ];
        if with_ref {
            self.gateway
                .url(&segments, &[("ref", self.target.branch.as_str())])
        } else {
            self.gateway.url(&segments, &[])
        }
    }

    /// Existence check for `path` on the target branch.
    pub async fn probe(&self, path: &str) -> Result<RemoteFileState, SaveError> {
        let url = self.contents_url(path, true)?;
        match self.gateway.request(Method::Get, &url, None).await {
            Ok(payload) => {
                let entry: ContentsEntry = serde_json::from_value(payload).map_err(|e| {
                    GatewayError::Decode(format!("{} is not a file entry: {}", path, e))
                })?;
                Ok(RemoteFileState::Present {
                    revision_token: entry.sha,
                    content: entry.content.as_deref().and_then(decode_content),
                })
            }
            Err(e) if e.is_absent() => Ok(RemoteFileState::Absent),
            Err(e) => Err(e.into()),
        }
    }

    /// Create or update `path` with `content`.
    pub async fn sync_file(
        &self,
        path: &str,
        content: &str,
        role: FileRole,
        title: &str,
    ) -> Result<SyncReport, SaveError> {
        let state = self.probe(path).await?;
        tracing::debug!(path, exists = state.exists(), "probed remote file");

        if state.holds(content.as_bytes()) {
            tracing::info!(path, "{} unchanged, not written", role.label());
            return Ok(SyncReport {
                path: path.to_string(),
                role,
                outcome: SyncOutcome::Unchanged,
                revision_token: state.revision_token().map(str::to_string),
            });
        }

        let mut body = serde_json::json!({
            "message": change_message(&state, role, title),
            "content": encode_content(content),
            "branch": self.target.branch,
        });
        if let Some(token) = state.revision_token() {
            body["sha"] = serde_json::Value::String(token.to_string());
        }

        let url = self.contents_url(path, false)?;
        let payload = self.gateway.request(Method::Put, &url, Some(&body)).await?;
        let revision_token = serde_json::from_value::<WriteResponse>(payload)
            .ok()
            .and_then(|r| r.content)
            .map(|c| c.sha);

        let outcome = if state.exists() {
            SyncOutcome::Updated
        } else {
            SyncOutcome::Created
        };
        tracing::info!(path, ?outcome, "synchronized {}", role.label());
        Ok(SyncReport {
            path: path.to_string(),
            role,
            outcome,
            revision_token,
        })
    }
}
