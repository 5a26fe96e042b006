//! Exclusive sequential-node lock implementation.

use std::time::Duration;

use coordination_lock_core::error::LockResult;
use coordination_lock_core::traits::DistributedLock;
use tracing::{Span, field, instrument};

use crate::acquire::SequentialAcquirer;
use crate::client::CoordinationClient;
use crate::handle::SequentialLockHandle;
use crate::name::LockKind;

/// An exclusive lock on one resource path.
///
/// Requests queue in sequence-number order: the holder of the smallest
/// `lock-` request under the resource owns the lock.
pub struct SequentialDistributedLock<C: CoordinationClient + 'static> {
    /// Resource path; also the lock name.
    name: String,
    acquirer: SequentialAcquirer<C>,
}

impl<C: CoordinationClient + 'static> SequentialDistributedLock<C> {
    pub(crate) fn new(name: &str, acquirer: SequentialAcquirer<C>) -> Self {
        Self {
            name: name.to_string(),
            acquirer,
        }
    }
}

impl<C: CoordinationClient + 'static> DistributedLock for SequentialDistributedLock<C> {
    type Handle = SequentialLockHandle<C>;

    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(lock.name = %self.name, timeout = ?timeout, backend = "sequential", error = field::Empty))]
    async fn acquire(&self, timeout: Option<Duration>) -> LockResult<Self::Handle> {
        let result = self
            .acquirer
            .acquire(&self.name, LockKind::Exclusive, timeout)
            .await;
        if let Err(e) = &result {
            Span::current().record("error", e.to_string());
        }
        result
    }

    #[instrument(skip(self), fields(lock.name = %self.name, backend = "sequential"))]
    async fn try_acquire(&self) -> LockResult<Option<Self::Handle>> {
        self.acquirer.try_acquire(&self.name, LockKind::Exclusive).await
    }
}
