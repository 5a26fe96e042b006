//! Sequential lock provider and the path-based lock facade.

use std::sync::Arc;
use std::time::Duration;

use coordination_lock_core::error::{LockError, LockResult};
use coordination_lock_core::traits::{LockProvider, ReaderWriterLockProvider};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::acquire::SequentialAcquirer;
use crate::client::CoordinationClient;
use crate::contention::is_blocked;
use crate::handle::SequentialLockHandle;
use crate::lock::SequentialDistributedLock;
use crate::name::{LockKind, build_prefix, resource_path_of, validate_key};
use crate::options::SequentialLockOptions;
use crate::rw_lock::SequentialReaderWriterLock;

/// Builder for sequential lock provider configuration.
pub struct SequentialLockProviderBuilder<C> {
    client: Option<Arc<C>>,
    options: SequentialLockOptions,
    request_data: Option<Vec<u8>>,
}

impl<C: CoordinationClient + 'static> SequentialLockProviderBuilder<C> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            client: None,
            options: SequentialLockOptions::default(),
            request_data: None,
        }
    }

    /// Sets the connected coordination client.
    pub fn client(mut self, client: C) -> Self {
        self.client = Some(Arc::new(client));
        self
    }

    /// Uses a client shared with the rest of the application.
    pub fn shared_client(mut self, client: Arc<C>) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the pause between contention checks (default 100 ms).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.options.poll_interval = interval;
        self
    }

    /// Wakes blocked waiters on child changes when the client supports it.
    pub fn use_change_notifications(mut self, enabled: bool) -> Self {
        self.options.use_change_notifications = enabled;
        self
    }

    /// Makes held handles check their request node at this cadence and
    /// signal loss through their lost token.
    pub fn keepalive_cadence(mut self, cadence: Duration) -> Self {
        self.options.keepalive_cadence = Some(cadence);
        self
    }

    /// Sets the payload written into request nodes.
    ///
    /// Defaults to a random owner token identifying this provider.
    pub fn request_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.request_data = Some(data.into());
        self
    }

    /// Builds the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if no client was specified, or if the poll interval or
    /// the keepalive cadence is zero.
    pub fn build(self) -> LockResult<SequentialLockProvider<C>> {
        let client = self.client.ok_or_else(|| {
            LockError::InvalidName("coordination client not specified".to_string())
        })?;

        if self.options.poll_interval.is_zero() {
            return Err(LockError::InvalidName(
                "poll interval must be greater than zero".to_string(),
            ));
        }

        if self.options.keepalive_cadence.is_some_and(|cadence| cadence.is_zero()) {
            return Err(LockError::InvalidName(
                "keepalive cadence must be greater than zero".to_string(),
            ));
        }

        let owner_token = Uuid::new_v4();
        let mut options = self.options;
        options.request_data = self
            .request_data
            .unwrap_or_else(|| owner_token.to_string().into_bytes());

        Ok(SequentialLockProvider {
            acquirer: SequentialAcquirer::new(client, Arc::new(options)),
            owner_token,
        })
    }
}

impl<C: CoordinationClient + 'static> Default for SequentialLockProviderBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Provider for sequential-node locks over a coordination service.
///
/// Besides the [`LockProvider`] and [`ReaderWriterLockProvider`] factories,
/// the provider exposes a path-based facade: [`lock`](Self::lock),
/// [`write_lock`](Self::write_lock) and [`read_lock`](Self::read_lock)
/// return the request node path on success and `None` on any failure;
/// [`unlock`](Self::unlock) takes that path back. The `try_*` variants return
/// the same outcome with the failure reason attached.
pub struct SequentialLockProvider<C: CoordinationClient + 'static> {
    acquirer: SequentialAcquirer<C>,
    owner_token: Uuid,
}

impl<C: CoordinationClient + 'static> SequentialLockProvider<C> {
    /// Returns a new builder for configuring the provider.
    pub fn builder() -> SequentialLockProviderBuilder<C> {
        SequentialLockProviderBuilder::new()
    }

    /// Creates a provider with default settings.
    pub fn new(client: C) -> LockResult<Self> {
        Self::builder().client(client).build()
    }

    /// Random token identifying this provider, stored in request nodes by default.
    pub fn owner_token(&self) -> Uuid {
        self.owner_token
    }

    pub fn client(&self) -> &C {
        self.acquirer.client()
    }

    /// Acquires a lock of `kind` on `key`, returning a typed handle.
    pub async fn acquire(
        &self,
        key: &str,
        kind: LockKind,
        timeout: Option<Duration>,
    ) -> LockResult<SequentialLockHandle<C>> {
        self.acquirer.acquire(key, kind, timeout).await
    }

    /// Exclusive lock; returns the lock handle path or `None`.
    pub async fn lock(&self, key: &str, timeout: Duration) -> Option<String> {
        self.try_lock(key, timeout).await.ok()
    }

    /// Write lock; returns the lock handle path or `None`.
    pub async fn write_lock(&self, key: &str, timeout: Duration) -> Option<String> {
        self.try_write_lock(key, timeout).await.ok()
    }

    /// Read lock; returns the lock handle path or `None`.
    pub async fn read_lock(&self, key: &str, timeout: Duration) -> Option<String> {
        self.try_read_lock(key, timeout).await.ok()
    }

    pub async fn try_lock(&self, key: &str, timeout: Duration) -> LockResult<String> {
        self.acquire_path(key, LockKind::Exclusive, timeout).await
    }

    pub async fn try_write_lock(&self, key: &str, timeout: Duration) -> LockResult<String> {
        self.acquire_path(key, LockKind::Write, timeout).await
    }

    pub async fn try_read_lock(&self, key: &str, timeout: Duration) -> LockResult<String> {
        self.acquire_path(key, LockKind::Read, timeout).await
    }

    async fn acquire_path(&self, key: &str, kind: LockKind, timeout: Duration) -> LockResult<String> {
        self.acquirer
            .acquire(key, kind, Some(timeout))
            .await
            .map(SequentialLockHandle::into_path)
            .inspect_err(|e| debug!(lock.name = %key, lock.kind = %kind, error = %e, "lock not acquired"))
    }

    /// Removes the request node at `handle`.
    ///
    /// Returns `false` if the node was already gone or the removal failed.
    #[instrument(skip(self), fields(backend = "sequential"))]
    pub async fn unlock(&self, handle: &str) -> bool {
        match self.client().remove(handle).await {
            Ok(removed) => removed,
            Err(e) => {
                debug!(error = %e, "unlock failed");
                false
            }
        }
    }

    /// Whether a new request of `mode` on `key` would currently block.
    ///
    /// A single contention check without creating a node. Errors count as
    /// "not locked".
    pub async fn is_locked(&self, key: &str, mode: LockKind) -> bool {
        self.try_is_locked(key, mode).await.unwrap_or(false)
    }

    pub async fn try_is_locked(&self, key: &str, mode: LockKind) -> LockResult<bool> {
        validate_key(key)?;
        let prefix = build_prefix(key, mode);
        is_blocked(self.client(), resource_path_of(&prefix), None, mode).await
    }
}

impl<C: CoordinationClient + 'static> LockProvider for SequentialLockProvider<C> {
    type Lock = SequentialDistributedLock<C>;

    fn create_lock(&self, name: &str) -> Self::Lock {
        SequentialDistributedLock::new(name, self.acquirer.clone())
    }
}

impl<C: CoordinationClient + 'static> ReaderWriterLockProvider for SequentialLockProvider<C> {
    type Lock = SequentialReaderWriterLock<C>;

    fn create_reader_writer_lock(&self, name: &str) -> Self::Lock {
        SequentialReaderWriterLock::new(name, self.acquirer.clone())
    }
}
