//! The coordination service capability the lock recipe is built on.

use std::future::Future;
use std::ops::BitOr;

use coordination_lock_core::error::LockError;
use thiserror::Error;
use tokio::sync::watch;

/// Errors surfaced by a coordination service client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The node (or the parent of a node being created) does not exist.
    #[error("node does not exist: {0}")]
    NoNode(String),

    /// A node already exists at this path.
    #[error("node already exists: {0}")]
    NodeExists(String),

    /// Ephemeral nodes cannot have children.
    #[error("ephemeral node cannot have children: {0}")]
    NoChildrenForEphemerals(String),

    /// The node still has children and cannot be removed.
    #[error("node has children: {0}")]
    NotEmpty(String),

    /// The client's session has ended; its ephemeral nodes are gone.
    #[error("session expired")]
    SessionExpired,

    /// Connection loss or any other transport failure.
    #[error("transport error: {0}")]
    Transport(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl From<ClientError> for LockError {
    fn from(err: ClientError) -> Self {
        LockError::Coordination(Box::new(err))
    }
}

/// Node creation flags.
///
/// An ephemeral node is removed when the creating session ends. A sequential
/// node gets a unique, monotonically increasing suffix appended by the
/// service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CreateFlags(u8);

impl CreateFlags {
    pub const PERSISTENT: Self = Self(0);
    pub const EPHEMERAL: Self = Self(0b01);
    pub const SEQUENTIAL: Self = Self(0b10);
    pub const EPHEMERAL_SEQUENTIAL: Self = Self(0b11);

    pub const fn is_ephemeral(self) -> bool {
        self.0 & Self::EPHEMERAL.0 != 0
    }

    pub const fn is_sequential(self) -> bool {
        self.0 & Self::SEQUENTIAL.0 != 0
    }
}

impl BitOr for CreateFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A connected client of a hierarchical coordination service.
///
/// One client corresponds to one session: every ephemeral node it creates
/// disappears when that session ends. The lock recipe only ever talks to the
/// service through these operations, so any service offering atomic
/// sequential ephemeral nodes can back it.
pub trait CoordinationClient: Send + Sync {
    /// Creates `path` and any missing ancestors as persistent nodes.
    ///
    /// Idempotent. Returns whether the path exists afterwards.
    fn ensure_path(&self, path: &str) -> impl Future<Output = ClientResult<bool>> + Send;

    /// Creates a node and returns its full path.
    ///
    /// With [`CreateFlags::SEQUENTIAL`] the returned path is `path` followed
    /// by the service-assigned sequence number.
    fn create(
        &self,
        path: &str,
        data: &[u8],
        flags: CreateFlags,
    ) -> impl Future<Output = ClientResult<String>> + Send;

    fn exists(&self, path: &str) -> impl Future<Output = ClientResult<bool>> + Send;

    /// Lists the names (not full paths) of the children of `path`.
    ///
    /// The order is unspecified. Fails with [`ClientError::NoNode`] if `path`
    /// does not exist.
    fn get_children(&self, path: &str) -> impl Future<Output = ClientResult<Vec<String>>> + Send;

    /// Removes the node at `path`. Returns `false` if there was nothing to remove.
    fn remove(&self, path: &str) -> impl Future<Output = ClientResult<bool>> + Send;

    /// Subscribes to changes of the children of `path`.
    ///
    /// The receiver is marked changed whenever a child is added or removed.
    /// Clients without push notifications return `None` and waiters fall
    /// back to polling.
    fn watch_children(&self, _path: &str) -> Option<watch::Receiver<u64>> {
        None
    }
}
