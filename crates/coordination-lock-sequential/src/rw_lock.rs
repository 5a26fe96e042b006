//! Sequential-node reader-writer lock implementation.
//!
//! Writers queue among themselves by sequence number. Readers wait while any
//! writer request exists under the resource and never wait for each other.
//! Writers do not wait for readers that already hold the lock.

use std::time::Duration;

use coordination_lock_core::error::LockResult;
use coordination_lock_core::traits::DistributedReaderWriterLock;
use tracing::instrument;

use crate::acquire::SequentialAcquirer;
use crate::client::CoordinationClient;
use crate::handle::SequentialLockHandle;
use crate::name::LockKind;

/// A reader-writer lock on one resource path.
pub struct SequentialReaderWriterLock<C: CoordinationClient + 'static> {
    name: String,
    acquirer: SequentialAcquirer<C>,
}

impl<C: CoordinationClient + 'static> SequentialReaderWriterLock<C> {
    pub(crate) fn new(name: &str, acquirer: SequentialAcquirer<C>) -> Self {
        Self {
            name: name.to_string(),
            acquirer,
        }
    }
}

impl<C: CoordinationClient + 'static> DistributedReaderWriterLock for SequentialReaderWriterLock<C> {
    type ReadHandle = SequentialLockHandle<C>;
    type WriteHandle = SequentialLockHandle<C>;

    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(lock.name = %self.name, timeout = ?timeout, backend = "sequential"))]
    async fn acquire_read(&self, timeout: Option<Duration>) -> LockResult<Self::ReadHandle> {
        self.acquirer.acquire(&self.name, LockKind::Read, timeout).await
    }

    async fn try_acquire_read(&self) -> LockResult<Option<Self::ReadHandle>> {
        self.acquirer.try_acquire(&self.name, LockKind::Read).await
    }

    #[instrument(skip(self), fields(lock.name = %self.name, timeout = ?timeout, backend = "sequential"))]
    async fn acquire_write(&self, timeout: Option<Duration>) -> LockResult<Self::WriteHandle> {
        self.acquirer.acquire(&self.name, LockKind::Write, timeout).await
    }

    async fn try_acquire_write(&self) -> LockResult<Option<Self::WriteHandle>> {
        self.acquirer.try_acquire(&self.name, LockKind::Write).await
    }
}
