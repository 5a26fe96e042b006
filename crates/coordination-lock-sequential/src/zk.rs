//! ZooKeeper adapter for the coordination client capability.
//!
//! The `zookeeper` crate is blocking, so every call runs on tokio's blocking
//! pool. Resource keys must be absolute ZooKeeper paths (`/locks/orders`).
//!
//! The adapter does not offer child-change subscriptions, so waits on
//! ZooKeeper are poll-only even with change notifications enabled.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use zookeeper::{Acl, CreateMode, WatchedEvent, ZkError, ZkResult, ZooKeeper, ZooKeeperExt};

use crate::client::{ClientError, ClientResult, CoordinationClient, CreateFlags};

/// A coordination client backed by a ZooKeeper session.
#[derive(Clone)]
pub struct ZooKeeperClient {
    zk: Arc<ZooKeeper>,
}

impl ZooKeeperClient {
    /// Wraps an already connected session.
    pub fn new(zk: Arc<ZooKeeper>) -> Self {
        Self { zk }
    }

    /// Connects to `connect_string` (`host:port[,host:port...]`).
    pub fn connect(connect_string: &str, session_timeout: Duration) -> ClientResult<Self> {
        let zk = ZooKeeper::connect(connect_string, session_timeout, |event: WatchedEvent| {
            debug!(?event, "zookeeper session event");
        })
        .map_err(map_zk_error)?;
        Ok(Self::new(Arc::new(zk)))
    }

    async fn run<T, F>(&self, op: F) -> ClientResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&ZooKeeper) -> ZkResult<T> + Send + 'static,
    {
        let zk = self.zk.clone();
        tokio::task::spawn_blocking(move || op(&zk))
            .await
            .map_err(|e| ClientError::Transport(format!("zookeeper call panicked: {e}")))?
            .map_err(map_zk_error)
    }
}

fn create_mode(flags: CreateFlags) -> CreateMode {
    match (flags.is_ephemeral(), flags.is_sequential()) {
        (true, true) => CreateMode::EphemeralSequential,
        (true, false) => CreateMode::Ephemeral,
        (false, true) => CreateMode::PersistentSequential,
        (false, false) => CreateMode::Persistent,
    }
}

fn map_zk_error(err: ZkError) -> ClientError {
    match err {
        ZkError::NoNode => ClientError::NoNode(String::new()),
        ZkError::NodeExists => ClientError::NodeExists(String::new()),
        ZkError::NoChildrenForEphemerals => ClientError::NoChildrenForEphemerals(String::new()),
        ZkError::NotEmpty => ClientError::NotEmpty(String::new()),
        ZkError::SessionExpired => ClientError::SessionExpired,
        other => ClientError::Transport(format!("{other:?}")),
    }
}

/// Attaches the path to errors that name a node.
fn with_path(err: ClientError, path: &str) -> ClientError {
    match err {
        ClientError::NoNode(_) => ClientError::NoNode(path.to_string()),
        ClientError::NodeExists(_) => ClientError::NodeExists(path.to_string()),
        ClientError::NoChildrenForEphemerals(_) => {
            ClientError::NoChildrenForEphemerals(path.to_string())
        }
        ClientError::NotEmpty(_) => ClientError::NotEmpty(path.to_string()),
        other => other,
    }
}

impl CoordinationClient for ZooKeeperClient {
    async fn ensure_path(&self, path: &str) -> ClientResult<bool> {
        let target = path.to_string();
        match self.run(move |zk| zk.ensure_path(&target)).await {
            Ok(()) => Ok(true),
            Err(ClientError::NoChildrenForEphemerals(_)) => Ok(false),
            Err(e) => Err(with_path(e, path)),
        }
    }

    async fn create(&self, path: &str, data: &[u8], flags: CreateFlags) -> ClientResult<String> {
        let target = path.to_string();
        let data = data.to_vec();
        let mode = create_mode(flags);
        self.run(move |zk| zk.create(&target, data, Acl::open_unsafe().clone(), mode))
            .await
            .map_err(|e| with_path(e, path))
    }

    async fn exists(&self, path: &str) -> ClientResult<bool> {
        let target = path.to_string();
        self.run(move |zk| zk.exists(&target, false))
            .await
            .map(|stat| stat.is_some())
    }

    async fn get_children(&self, path: &str) -> ClientResult<Vec<String>> {
        let target = path.to_string();
        self.run(move |zk| zk.get_children(&target, false))
            .await
            .map_err(|e| with_path(e, path))
    }

    async fn remove(&self, path: &str) -> ClientResult<bool> {
        let target = path.to_string();
        match self.run(move |zk| zk.delete(&target, None)).await {
            Ok(()) => Ok(true),
            Err(ClientError::NoNode(_)) => Ok(false),
            Err(e) => Err(with_path(e, path)),
        }
    }
}
