//! Sequential ephemeral node backend for distributed locks.
//!
//! Each lock request is an ephemeral, sequentially numbered child of the
//! resource path (`<key>/lock-NNNNNNNNNN` for exclusive and write requests,
//! `<key>/read-NNNNNNNNNN` for read requests). Writers are served in
//! sequence order; readers wait while any writer request exists. Waiting is
//! poll based, optionally sped up by child-change notifications.
//!
//! The coordination service is reached through the [`CoordinationClient`]
//! trait. [`InMemoryCoordinationService`] implements it for a single process;
//! the `zookeeper` feature adds [`ZooKeeperClient`].

pub mod acquire;
pub mod client;
pub mod contention;
pub mod handle;
pub mod lock;
pub mod memory;
pub mod name;
pub mod options;
pub mod provider;
pub mod request;
pub mod rw_lock;
#[cfg(feature = "zookeeper")]
pub mod zk;

pub use acquire::await_turn;
pub use client::{ClientError, ClientResult, CoordinationClient, CreateFlags};
pub use contention::{Contenders, is_blocked};
pub use handle::SequentialLockHandle;
pub use lock::SequentialDistributedLock;
pub use memory::{InMemoryClient, InMemoryCoordinationService};
pub use name::{LockKind, build_prefix, parse_index};
pub use options::SequentialLockOptions;
pub use provider::{SequentialLockProvider, SequentialLockProviderBuilder};
pub use request::create_request;
pub use rw_lock::SequentialReaderWriterLock;
#[cfg(feature = "zookeeper")]
pub use zk::ZooKeeperClient;
