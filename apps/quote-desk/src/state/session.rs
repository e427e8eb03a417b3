//! # Session State
//!
//! The staff/owner gate shared between the desk and the idle watcher.
//!
//! ## Thread Safety
//! The gate is wrapped in `Arc<Mutex<T>>` because two parties touch it:
//! 1. The desk (elevate, logout, touch on every command)
//! 2. The idle watcher task (demote after inactivity)
//!
//! ## Idle Watcher
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  IdleWatcher::spawn(session, poll) ──► IdleWatcherHandle               │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  loop {                                                                 │
//! │    select! {                                                            │
//! │      tick (every poll)  ──► session.demote_if_idle(now)                │
//! │      shutdown_rx        ──► break                                      │
//! │    }                                                                    │
//! │  }                                                                      │
//! │                                                                         │
//! │  handle.shutdown().await  stops the task and waits for it              │
//! │  drop(handle)             aborts the task                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use quote_core::session::PinOutcome;
use quote_core::{AuthError, Capability, CoreError, Role, SessionGate};

/// Shared session gate.
#[derive(Debug, Clone)]
pub struct SessionState {
    gate: Arc<Mutex<SessionGate>>,
}

impl SessionState {
    /// A staff session with the given idle limit.
    pub fn new(idle_limit: chrono::Duration) -> Self {
        SessionState {
            gate: Arc::new(Mutex::new(SessionGate::with_idle_limit(Utc::now(), idle_limit))),
        }
    }

    /// A poisoned lock still holds a valid gate; keep using it.
    fn lock(&self) -> MutexGuard<'_, SessionGate> {
        self.gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn role(&self) -> Role {
        self.lock().role()
    }

    pub fn is_elevated(&self) -> bool {
        self.lock().is_elevated()
    }

    /// Fails with `PermissionDenied` unless the role has the capability.
    pub fn require(&self, capability: Capability) -> Result<(), CoreError> {
        if self.role().can(capability) {
            Ok(())
        } else {
            Err(CoreError::PermissionDenied(capability))
        }
    }

    /// Records operator activity.
    pub fn touch(&self) {
        self.lock().touch(Utc::now());
    }

    pub fn elevate(&self, pin: &str, stored_hash: Option<&str>) -> Result<PinOutcome, AuthError> {
        let outcome = self.lock().elevate(pin, stored_hash, Utc::now())?;
        info!("Owner session started");
        Ok(outcome)
    }

    pub fn logout(&self) {
        self.lock().logout();
        info!("Back to staff session");
    }

    /// Demotes an idle owner. Returns `true` if the role changed.
    pub fn demote_if_idle(&self) -> bool {
        self.lock().demote_if_idle(Utc::now())
    }
}

// =============================================================================
// Idle Watcher
// =============================================================================

/// Background task that demotes idle owner sessions.
pub struct IdleWatcher;

impl IdleWatcher {
    /// Starts polling `session` every `poll`.
    pub fn spawn(session: SessionState, poll: Duration) -> IdleWatcherHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(Self::run(session, poll, shutdown_rx));
        IdleWatcherHandle {
            shutdown_tx,
            task: Some(task),
        }
    }

    async fn run(session: SessionState, poll: Duration, mut shutdown_rx: mpsc::Receiver<()>) {
        debug!(poll_ms = poll.as_millis() as u64, "Idle watcher started");

        let mut ticker = interval(poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if session.demote_if_idle() {
                        info!("Owner session idle, switched back to staff");
                    }
                }
                _ = shutdown_rx.recv() => {
                    debug!("Idle watcher shutting down");
                    break;
                }
            }
        }
    }
}

/// Handle to a running idle watcher.
pub struct IdleWatcherHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: Option<JoinHandle<()>>,
}

impl IdleWatcherHandle {
    /// Stops the watcher and waits for the task to end.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for IdleWatcherHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_follows_role() {
        let session = SessionState::new(chrono::Duration::minutes(10));
        assert!(matches!(
            session.require(Capability::EditCost),
            Err(CoreError::PermissionDenied(Capability::EditCost))
        ));

        session.elevate("1234", None).unwrap();
        assert!(session.require(Capability::EditCost).is_ok());

        session.logout();
        assert_eq!(session.role(), Role::Staff);
    }

    #[tokio::test]
    async fn test_watcher_demotes_idle_owner() {
        let session = SessionState::new(chrono::Duration::milliseconds(50));
        session.elevate("1234", None).unwrap();

        let handle = IdleWatcher::spawn(session.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(session.role(), Role::Staff);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_activity_keeps_owner() {
        let session = SessionState::new(chrono::Duration::milliseconds(400));
        session.elevate("1234", None).unwrap();
        let handle = IdleWatcher::spawn(session.clone(), Duration::from_millis(10));

        for _ in 0..6 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            session.touch();
        }
        assert!(session.is_elevated());
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_polling() {
        let session = SessionState::new(chrono::Duration::milliseconds(20));
        let handle = IdleWatcher::spawn(session.clone(), Duration::from_millis(5));
        assert!(handle.is_running());
        handle.shutdown().await;

        session.elevate("1234", None).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(session.is_elevated());
    }

    #[tokio::test]
    async fn test_drop_stops_polling() {
        let session = SessionState::new(chrono::Duration::milliseconds(20));
        let handle = IdleWatcher::spawn(session.clone(), Duration::from_millis(5));
        drop(handle);
        tokio::task::yield_now().await;

        session.elevate("1234", None).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(session.is_elevated());
    }
}
