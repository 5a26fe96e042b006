//! Coordination client that injects failures for testing error paths.

use coordination_lock::{ClientError, ClientResult, CoordinationClient, CreateFlags, InMemoryClient};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Switchable failure modes.
#[derive(Default)]
pub struct Faults {
    /// `ensure_path` reports that the path could not be created.
    pub refuse_paths: AtomicBool,
    /// Every operation fails with a transport error.
    pub disconnected: AtomicBool,
    /// `remove` fails with a transport error.
    pub failing_removes: AtomicBool,
}

/// Wraps an in-memory client and fails on demand.
#[derive(Clone)]
pub struct FaultyClient {
    inner: InMemoryClient,
    faults: Arc<Faults>,
}

impl FaultyClient {
    pub fn new(inner: InMemoryClient) -> Self {
        Self {
            inner,
            faults: Arc::new(Faults::default()),
        }
    }

    pub fn faults(&self) -> Arc<Faults> {
        self.faults.clone()
    }

    pub fn inner(&self) -> &InMemoryClient {
        &self.inner
    }

    fn check_connected(&self) -> ClientResult<()> {
        if self.faults.disconnected.load(Ordering::SeqCst) {
            Err(ClientError::Transport("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

impl CoordinationClient for FaultyClient {
    async fn ensure_path(&self, path: &str) -> ClientResult<bool> {
        self.check_connected()?;
        if self.faults.refuse_paths.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.ensure_path(path).await
    }

    async fn create(&self, path: &str, data: &[u8], flags: CreateFlags) -> ClientResult<String> {
        self.check_connected()?;
        self.inner.create(path, data, flags).await
    }

    async fn exists(&self, path: &str) -> ClientResult<bool> {
        self.check_connected()?;
        self.inner.exists(path).await
    }

    async fn get_children(&self, path: &str) -> ClientResult<Vec<String>> {
        self.check_connected()?;
        self.inner.get_children(path).await
    }

    async fn remove(&self, path: &str) -> ClientResult<bool> {
        self.check_connected()?;
        if self.faults.failing_removes.load(Ordering::SeqCst) {
            return Err(ClientError::Transport("remove timed out".to_string()));
        }
        self.inner.remove(path).await
    }

    fn watch_children(&self, path: &str) -> Option<watch::Receiver<u64>> {
        self.inner.watch_children(path)
    }
}
