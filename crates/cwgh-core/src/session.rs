//! Save session: the process-wide busy flag and the trigger state machine.
//!
//! The trigger has four states. `Idle` is the only enabled one. A save moves
//! it to `Busy`, settling moves it to `Success` or `Failure`, and after the
//! cool-down it falls back to `Idle` and the busy flag is released. The busy
//! flag is held by a [`BusyGuard`], so it is cleared even if the save future
//! is dropped half-way.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Visible state of the save trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Idle,
    Busy,
    Success,
    Failure,
}

impl TriggerState {
    pub fn label(self) -> &'static str {
        match self {
            TriggerState::Idle => "Save to GitHub",
            TriggerState::Busy => "Saving...",
            TriggerState::Success => "Saved!",
            TriggerState::Failure => "Error!",
        }
    }

    /// Whether the control accepts a click in this state.
    pub fn is_enabled(self) -> bool {
        self == TriggerState::Idle
    }
}

impl fmt::Display for TriggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Owns the busy flag and publishes trigger state changes.
#[derive(Debug)]
pub struct TriggerControl {
    busy: AtomicBool,
    state: watch::Sender<TriggerState>,
    cooldown: Duration,
}

/// Proof of holding the busy flag. Dropping it releases the flag and resets the
/// trigger to `Idle`.
#[derive(Debug)]
pub struct BusyGuard {
    control: Arc<TriggerControl>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.control.state.send_replace(TriggerState::Idle);
        self.control.busy.store(false, Ordering::Release);
    }
}

impl TriggerControl {
    pub fn new(cooldown: Duration) -> Arc<Self> {
        let (state, _) = watch::channel(TriggerState::Idle);
        Arc::new(Self {
            busy: AtomicBool::new(false),
            state,
            cooldown,
        })
    }

    pub fn state(&self) -> TriggerState {
        *self.state.borrow()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn subscribe(&self) -> watch::Receiver<TriggerState> {
        self.state.subscribe()
    }

    /// Take the busy flag. `None` when a save is already in flight or cooling down.
    pub fn try_begin(self: &Arc<Self>) -> Option<BusyGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.state.send_replace(TriggerState::Busy);
        Some(BusyGuard {
            control: Arc::clone(self),
        })
    }

    /// Show the outcome, then release the flag once the cool-down has elapsed.
    /// The release runs in the background; the returned handle completes with it.
    pub fn settle(&self, guard: BusyGuard, success: bool) -> tokio::task::JoinHandle<()> {
        let shown = if success {
            TriggerState::Success
        } else {
            TriggerState::Failure
        };
        self.state.send_replace(shown);
        let cooldown = self.cooldown;
        tokio::spawn(async move {
            tokio::time::sleep(cooldown).await;
            drop(guard);
        })
    }
}
