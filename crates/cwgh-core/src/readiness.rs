//! Readiness detection.
//!
//! [`await_ready`] is the one wait primitive: check a predicate, and if it is
//! not yet true, re-check on every mutation batch until it is or the timeout
//! fires. [`PageLifecycle`] runs that wait once at start and again after every
//! in-place navigation, since the host page is a single-page app that never
//! reloads.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::page::{Document, MutationFeed, AFFORDANCE_MARKER, READY_MARKERS};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadinessError {
    #[error("readiness signal not seen within {0:?}")]
    TimedOut(Duration),
    #[error("document went away while waiting")]
    Detached,
}

/// Resolve once `predicate` is true, or fail after `timeout`.
///
/// The predicate is evaluated immediately; when already true this returns
/// without subscribing. Otherwise it is re-evaluated after every mutation
/// batch. The subscription is released on every exit path.
pub async fn await_ready<P>(
    feed: &MutationFeed,
    mut predicate: P,
    timeout: Duration,
) -> Result<(), ReadinessError>
where
    P: FnMut() -> bool,
{
    if predicate() {
        return Ok(());
    }

    let mut rx = feed.subscribe();
    // A batch may have landed between the first check and the subscription.
    if predicate() {
        return Ok(());
    }

    let wait = async {
        loop {
            match rx.recv().await {
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    if predicate() {
                        return Ok(());
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return Err(ReadinessError::Detached),
            }
        }
    };

    match tokio::time::timeout(timeout, wait).await {
        Ok(result) => result,
        Err(_) => Err(ReadinessError::TimedOut(timeout)),
    }
}

/// What a readiness cycle concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The view is capturable; `inserted` is false when the affordance was already there.
    Ready { url: String, inserted: bool },
    TimedOut { url: String },
}

/// Settings for [`PageLifecycle`].
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    pub signal: Vec<String>,
    pub affordance: String,
    pub timeout: Duration,
    pub rearm_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            signal: READY_MARKERS.iter().map(|m| m.to_string()).collect(),
            affordance: AFFORDANCE_MARKER.to_string(),
            timeout: Duration::from_secs(10),
            rearm_delay: Duration::from_millis(500),
        }
    }
}

/// Runs readiness cycles for one document: at start, then after each navigation.
pub struct PageLifecycle {
    document: Arc<Document>,
    options: LifecycleOptions,
}

impl PageLifecycle {
    pub fn new(document: Arc<Document>, options: LifecycleOptions) -> Self {
        Self { document, options }
    }

    /// Start the lifecycle in the background. It stops when `events` is closed
    /// on the receiving side.
    pub fn spawn(self, events: mpsc::Sender<LifecycleEvent>) -> JoinHandle<()> {
        tokio::spawn(self.run(events))
    }

    async fn run(self, events: mpsc::Sender<LifecycleEvent>) {
        let mut navigations = self.document.subscribe_navigation();
        let mut cycle = Some(self.start_cycle(events.clone()));

        loop {
            tokio::select! {
                _ = events.closed() => break,
                nav = navigations.recv() => match nav {
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        // At most one live cycle: the previous view is gone.
                        if let Some(previous) = cycle.take() {
                            previous.abort();
                        }
                        tokio::time::sleep(self.options.rearm_delay).await;
                        tracing::debug!(url = %self.document.url(), "re-arming readiness after navigation");
                        cycle = Some(self.start_cycle(events.clone()));
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        if let Some(c) = cycle {
            c.abort();
        }
    }

    fn start_cycle(&self, events: mpsc::Sender<LifecycleEvent>) -> JoinHandle<()> {
        let document = Arc::clone(&self.document);
        let options = self.options.clone();
        tokio::spawn(async move {
            let url = document.url();
            let signal: Vec<&str> = options.signal.iter().map(String::as_str).collect();
            let outcome = await_ready(
                document.mutations(),
                || document.contains_any(&signal),
                options.timeout,
            )
            .await;
            let event = match outcome {
                Ok(()) => {
                    let inserted = document.insert_affordance(&options.affordance);
                    tracing::debug!(%url, inserted, "page ready");
                    LifecycleEvent::Ready { url, inserted }
                }
                Err(e) => {
                    tracing::warn!(%url, "readiness cycle ended: {}", e);
                    LifecycleEvent::TimedOut { url }
                }
            };
            let _ = events.send(event).await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{NavigationKind, EDITOR_MARKER};

    #[tokio::test]
    async fn already_true_resolves_without_subscribing() {
        let doc = Document::new("u");
        doc.insert_markers([EDITOR_MARKER]);
        await_ready(doc.mutations(), || doc.contains(EDITOR_MARKER), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(doc.mutations().observer_count(), 0);
    }

    #[tokio::test]
    async fn resolves_on_later_mutation_and_unsubscribes() {
        let doc = Arc::new(Document::new("u"));
        let renderer = Arc::clone(&doc);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            renderer.insert_markers([".unrelated"]);
            tokio::time::sleep(Duration::from_millis(20)).await;
            renderer.insert_markers([".problem-statement"]);
        });

        await_ready(
            doc.mutations(),
            || doc.contains_any(READY_MARKERS),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert!(doc.contains(".problem-statement"));
        assert_eq!(doc.mutations().observer_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_bound_and_no_subscription_left() {
        let doc = Document::new("u");
        let started = tokio::time::Instant::now();
        let err = await_ready(doc.mutations(), || false, Duration::from_millis(10_000))
            .await
            .unwrap_err();
        assert_eq!(err, ReadinessError::TimedOut(Duration::from_millis(10_000)));
        assert!(started.elapsed() <= Duration::from_millis(10_001));
        assert!(started.elapsed() >= Duration::from_millis(10_000));
        assert_eq!(doc.mutations().observer_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn mutations_that_do_not_satisfy_keep_waiting() {
        let doc = Arc::new(Document::new("u"));
        let renderer = Arc::clone(&doc);
        tokio::spawn(async move {
            for i in 0..5 {
                tokio::time::sleep(Duration::from_millis(100)).await;
                renderer.insert_markers([format!(".noise-{}", i)]);
            }
        });
        let err = await_ready(
            doc.mutations(),
            || doc.contains(EDITOR_MARKER),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ReadinessError::TimedOut(_)));
        assert_eq!(doc.mutations().observer_count(), 0);
    }

    fn options() -> LifecycleOptions {
        LifecycleOptions {
            timeout: Duration::from_secs(2),
            rearm_delay: Duration::from_millis(50),
            ..LifecycleOptions::default()
        }
    }

    #[tokio::test]
    async fn lifecycle_inserts_affordance_once_ready() {
        let doc = Arc::new(Document::new("https://www.codewars.com/kata/1"));
        let (tx, mut rx) = mpsc::channel(8);
        let handle = PageLifecycle::new(Arc::clone(&doc), options()).spawn(tx);

        tokio::time::sleep(Duration::from_millis(20)).await;
        doc.insert_markers([".inner-small-hex"]);

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            LifecycleEvent::Ready {
                url: "https://www.codewars.com/kata/1".to_string(),
                inserted: true
            }
        );
        assert!(doc.contains(AFFORDANCE_MARKER));

        drop(rx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn lifecycle_rearms_after_navigation() {
        let doc = Arc::new(Document::new("https://www.codewars.com/kata/1"));
        doc.insert_markers([".CodeMirror"]);
        let (tx, mut rx) = mpsc::channel(8);
        let handle = PageLifecycle::new(Arc::clone(&doc), options()).spawn(tx);

        assert!(matches!(rx.recv().await.unwrap(), LifecycleEvent::Ready { inserted: true, .. }));

        doc.navigate("https://www.codewars.com/kata/2", NavigationKind::Pop);
        assert!(!doc.contains(AFFORDANCE_MARKER));
        tokio::time::sleep(Duration::from_millis(100)).await;
        doc.insert_markers([".CodeMirror"]);

        match rx.recv().await.unwrap() {
            LifecycleEvent::Ready { url, inserted } => {
                assert_eq!(url, "https://www.codewars.com/kata/2");
                assert!(inserted);
            }
            other => panic!("expected Ready, got {:?}", other),
        }
        assert!(doc.contains(AFFORDANCE_MARKER));

        drop(rx);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn lifecycle_reports_timeout() {
        let doc = Arc::new(Document::new("https://www.codewars.com/kata/3"));
        let (tx, mut rx) = mpsc::channel(8);
        let _handle = PageLifecycle::new(Arc::clone(&doc), options()).spawn(tx);

        assert_eq!(
            rx.recv().await.unwrap(),
            LifecycleEvent::TimedOut {
                url: "https://www.codewars.com/kata/3".to_string()
            }
        );
        assert!(!doc.contains(AFFORDANCE_MARKER));
        // Give the cycle task a turn to finish dropping its receiver.
        tokio::task::yield_now().await;
        assert_eq!(doc.mutations().observer_count(), 0);
    }

    #[tokio::test]
    async fn repeated_cycles_never_duplicate_affordance() {
        let doc = Arc::new(Document::new("u"));
        doc.insert_markers([".CodeMirror"]);
        let (tx, mut rx) = mpsc::channel(8);
        let lifecycle = PageLifecycle::new(Arc::clone(&doc), options());
        let first = lifecycle.start_cycle(tx.clone());
        let second = lifecycle.start_cycle(tx);
        first.await.unwrap();
        second.await.unwrap();

        let a = rx.recv().await.unwrap();
        let b = rx.recv().await.unwrap();
        let inserted: Vec<bool> = [a, b]
            .into_iter()
            .map(|e| match e {
                LifecycleEvent::Ready { inserted, .. } => inserted,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(inserted.iter().filter(|i| **i).count(), 1);
    }
}
