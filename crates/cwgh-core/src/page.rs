//! Host page model.
//!
//! A [`Document`] stands in for the live page: the set of structural markers
//! currently rendered (selectors such as `.CodeMirror`), the current URL, a
//! feed of mutation batches and a feed of in-place navigations. Hosts drive it
//! from whatever page they embed; the engine only observes it.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;

use crate::artifact::ArtifactMetadata;

/// Any of these means the kata view has rendered enough to capture.
pub const READY_MARKERS: &[&str] = &[".inner-small-hex", ".problem-statement", ".CodeMirror"];

/// The embedded code editor widget.
pub const EDITOR_MARKER: &str = ".CodeMirror";

/// Identity marker of the save trigger control.
pub const AFFORDANCE_MARKER: &str = "#github-save-btn";

const FEED_CAPACITY: usize = 64;

/// One batch of structural changes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MutationBatch {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl MutationBatch {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// How the URL changed without a document reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    /// `history.pushState`
    Push,
    /// `history.replaceState`
    Replace,
    /// back/forward
    Pop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub url: String,
    pub kind: NavigationKind,
}

/// Subscription point for mutation batches. Dropping a receiver unsubscribes.
#[derive(Debug)]
pub struct MutationFeed {
    tx: broadcast::Sender<MutationBatch>,
}

impl MutationFeed {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MutationBatch> {
        self.tx.subscribe()
    }

    /// Number of live subscriptions.
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn publish(&self, batch: MutationBatch) {
        if batch.is_empty() {
            return;
        }
        // No observers is fine.
        let _ = self.tx.send(batch);
    }
}

#[derive(Debug)]
struct DocumentState {
    url: String,
    markers: BTreeSet<String>,
}

/// In-memory view of the host page.
#[derive(Debug)]
pub struct Document {
    state: Mutex<DocumentState>,
    mutations: MutationFeed,
    navigations: broadcast::Sender<Navigation>,
}

impl Document {
    pub fn new(url: impl Into<String>) -> Self {
        let (navigations, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            state: Mutex::new(DocumentState {
                url: url.into(),
                markers: BTreeSet::new(),
            }),
            mutations: MutationFeed::new(),
            navigations,
        }
    }

    fn lock(&self) -> MutexGuard<'_, DocumentState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn url(&self) -> String {
        self.lock().url.clone()
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.lock().markers.contains(marker)
    }

    pub fn contains_any(&self, markers: &[&str]) -> bool {
        let state = self.lock();
        markers.iter().any(|m| state.markers.contains(*m))
    }

    pub fn mutations(&self) -> &MutationFeed {
        &self.mutations
    }

    pub fn subscribe_navigation(&self) -> broadcast::Receiver<Navigation> {
        self.navigations.subscribe()
    }

    /// Render markers. Emits one batch with those that were not present yet.
    pub fn insert_markers<I, S>(&self, markers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.lock();
        let mut batch = MutationBatch::default();
        for m in markers {
            let m = m.into();
            if state.markers.insert(m.clone()) {
                batch.added.push(m);
            }
        }
        self.mutations.publish(batch);
    }

    /// Insert the trigger affordance unless one with this identity is already
    /// present. Returns whether it was inserted.
    pub fn insert_affordance(&self, marker: &str) -> bool {
        let mut state = self.lock();
        if !state.markers.insert(marker.to_string()) {
            return false;
        }
        self.mutations.publish(MutationBatch {
            added: vec![marker.to_string()],
            removed: Vec::new(),
        });
        true
    }

    /// In-place URL change: the old view is torn down (all markers removed) and
    /// observers of navigation are notified. The new view renders afterwards.
    pub fn navigate(&self, url: impl Into<String>, kind: NavigationKind) {
        let url = url.into();
        let mut state = self.lock();
        if state.url == url {
            return;
        }
        state.url = url.clone();
        let removed: Vec<String> = std::mem::take(&mut state.markers).into_iter().collect();
        self.mutations.publish(MutationBatch {
            added: Vec::new(),
            removed,
        });
        let _ = self.navigations.send(Navigation { url, kind });
    }
}

/// Reads problem data out of the page. Implemented by the host.
pub trait PageDataProvider: Send + Sync {
    /// Best-effort metadata; any field may be missing.
    fn artifact_metadata(&self) -> ArtifactMetadata;

    /// Current editor contents. Empty when the editor has nothing to offer.
    fn editor_contents(&self) -> String;
}
