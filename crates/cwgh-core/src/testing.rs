//! In-memory transports for protocol tests.

use crate::gateway::{HttpRequest, HttpResponse, Method, Transport, TransportError, TransportKind};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Replays queued outcomes in order and records every request it sees.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_response(&self, status: u32, body: &str) {
        self.script.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub(crate) fn push_failure(&self, kind: TransportKind, detail: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(TransportError::new(kind, detail)));
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new(TransportKind::Other, "script exhausted")))
    }
}

/// A stored file: current sha and base64 content as sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredFile {
    pub(crate) sha: String,
    pub(crate) content: String,
}

/// Behaves like the contents API for GET/PUT on `.../contents/<encoded path>`,
/// including the sha check on overwrite.
#[derive(Default)]
pub(crate) struct MemoryContents {
    files: Mutex<HashMap<String, StoredFile>>,
    seen: Mutex<Vec<HttpRequest>>,
    next_sha: Mutex<u64>,
    /// Encoded path fragment -> status forced on PUT.
    fail_put: Mutex<Vec<(String, u32)>>,
}

impl MemoryContents {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Seed an existing file under its plain repository path.
    pub(crate) fn seed(&self, path: &str, sha: &str, content: &str) {
        self.files.lock().unwrap().insert(
            encode(path),
            StoredFile {
                sha: sha.to_string(),
                content: content.to_string(),
            },
        );
    }

    pub(crate) fn file(&self, path: &str) -> Option<StoredFile> {
        self.files.lock().unwrap().get(&encode(path)).cloned()
    }

    pub(crate) fn fail_put_on(&self, path: &str, status: u32) {
        self.fail_put.lock().unwrap().push((encode(path), status));
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn puts(&self) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == Method::Put)
            .collect()
    }

    fn key_of(url: &str) -> Option<String> {
        let without_query = url.split('?').next()?;
        let (_, key) = without_query.split_once("/contents/")?;
        Some(key.to_string())
    }

    fn respond(status: u32, body: serde_json::Value) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status,
            body: body.to_string(),
        })
    }
}

/// Percent-encode a repository path the way the gateway does (one segment).
pub(crate) fn encode(path: &str) -> String {
    let mut url = url::Url::parse("http://store.invalid/").unwrap();
    url.path_segments_mut().unwrap().pop_if_empty().push(path);
    url.path().trim_start_matches('/').to_string()
}

impl Transport for MemoryContents {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        let Some(key) = Self::key_of(&request.url) else {
            return Self::respond(404, serde_json::json!({"message": "Not Found"}));
        };

        match request.method {
            Method::Get => match self.files.lock().unwrap().get(&key) {
                Some(f) => {
                    Self::respond(200, serde_json::json!({"sha": f.sha, "content": f.content}))
                }
                None => Self::respond(404, serde_json::json!({"message": "Not Found"})),
            },
            Method::Put => {
                if let Some((_, status)) = self
                    .fail_put
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|(k, _)| *k == key)
                {
                    return Self::respond(*status, serde_json::json!({"message": "forced failure"}));
                }
                let body: serde_json::Value =
                    serde_json::from_str(request.body.as_deref().unwrap_or("null")).unwrap();
                let sent_sha = body.get("sha").and_then(|v| v.as_str());
                let mut files = self.files.lock().unwrap();
                match (files.get(&key), sent_sha) {
                    (Some(_), None) => {
                        return Self::respond(
                            409,
                            serde_json::json!({"message": "\"sha\" wasn't supplied."}),
                        )
                    }
                    (Some(f), Some(s)) if f.sha != s => {
                        let message = format!("is at {} but expected {}", f.sha, s);
                        return Self::respond(409, serde_json::json!({ "message": message }));
                    }
                    (None, Some(_)) => {
                        let body = serde_json::json!({"message": "sha for missing file"});
                        return Self::respond(422, body);
                    }
                    _ => {}
                }
                let created = !files.contains_key(&key);
                let mut next = self.next_sha.lock().unwrap();
                *next += 1;
                let sha = format!("sha-{}", *next);
                files.insert(
                    key,
                    StoredFile {
                        sha: sha.clone(),
                        content: body["content"].as_str().unwrap_or("").to_string(),
                    },
                );
                Self::respond(
                    if created { 201 } else { 200 },
                    serde_json::json!({"content": {"sha": sha}}),
                )
            }
        }
    }
}
