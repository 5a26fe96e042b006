//! Sequential lock handle implementation.

use std::sync::Arc;
use std::time::Duration;

use coordination_lock_core::error::{LockError, LockResult};
use coordination_lock_core::traits::LockHandle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, instrument, warn};

use crate::client::CoordinationClient;
use crate::name::LockKind;

/// Handle for a held sequential-node lock.
///
/// The handle owns the request node at [`path`](Self::path). Dropping it
/// inside a tokio runtime removes the node in the background; call
/// [`release`](LockHandle::release) to observe the outcome, or
/// [`into_path`](Self::into_path) to keep the node and manage it by path.
pub struct SequentialLockHandle<C: CoordinationClient + 'static> {
    client: Arc<C>,
    path: String,
    kind: LockKind,
    /// Cleared once the node has been released or handed out by path.
    armed: bool,
    lost_receiver: watch::Receiver<bool>,
    /// Kept alive when there is no monitor, so the token simply never changes.
    _lost_sender: Option<watch::Sender<bool>>,
    monitor_task: Option<JoinHandle<()>>,
}

impl<C: CoordinationClient + 'static> SequentialLockHandle<C> {
    pub(crate) fn new(
        client: Arc<C>,
        path: String,
        kind: LockKind,
        keepalive_cadence: Option<Duration>,
    ) -> Self {
        let (lost_sender, lost_receiver) = watch::channel(false);

        let (lost_sender, monitor_task) = match keepalive_cadence {
            Some(cadence) => {
                let task = spawn_monitor(client.clone(), path.clone(), cadence, lost_sender);
                (None, Some(task))
            }
            None => (Some(lost_sender), None),
        };

        Self {
            client,
            path,
            kind,
            armed: true,
            lost_receiver,
            _lost_sender: lost_sender,
            monitor_task,
        }
    }

    /// Full path of the request node, the token needed to unlock it.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> LockKind {
        self.kind
    }

    /// Detaches the handle and returns the request node path.
    ///
    /// The node stays in place until it is unlocked by path or the session
    /// that created it ends.
    pub fn into_path(mut self) -> String {
        self.armed = false;
        std::mem::take(&mut self.path)
    }

    fn stop_monitor(&mut self) {
        if let Some(task) = self.monitor_task.take() {
            task.abort();
        }
    }
}

/// Watches the request node and flags the lock as lost once it disappears.
fn spawn_monitor<C: CoordinationClient + 'static>(
    client: Arc<C>,
    path: String,
    cadence: Duration,
    lost_sender: watch::Sender<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cadence);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;

            if lost_sender.is_closed() {
                break;
            }

            match client.exists(&path).await {
                Ok(true) => continue,
                Ok(false) => {
                    warn!(lock.path = %path, "request node disappeared, lock lost");
                    let _ = lost_sender.send(true);
                    break;
                }
                Err(e) => {
                    warn!(lock.path = %path, error = %e, "keepalive check failed, lock lost");
                    let _ = lost_sender.send(true);
                    break;
                }
            }
        }
    })
}

impl<C: CoordinationClient + 'static> LockHandle for SequentialLockHandle<C> {
    fn lost_token(&self) -> &watch::Receiver<bool> {
        &self.lost_receiver
    }

    #[instrument(skip(self), fields(lock.path = %self.path, lock.kind = %self.kind, backend = "sequential"))]
    async fn release(mut self) -> LockResult<()> {
        self.stop_monitor();
        self.armed = false;

        match self.client.remove(&self.path).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(LockError::LockLost(format!(
                "request node '{}' no longer exists",
                self.path
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

impl<C: CoordinationClient + 'static> Drop for SequentialLockHandle<C> {
    fn drop(&mut self) {
        self.stop_monitor();

        if !self.armed {
            return;
        }

        // Without a runtime the node lingers until the session ends.
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(lock.path = %self.path, "no runtime to release dropped handle");
            return;
        };

        let client = self.client.clone();
        let path = std::mem::take(&mut self.path);
        runtime.spawn(async move {
            if let Err(e) = client.remove(&path).await {
                warn!(lock.path = %path, error = %e, "failed to release dropped handle");
            }
        });
    }
}
