//! In-process coordination service.
//!
//! Provides the same guarantees the lock recipe relies on from a real
//! service (atomic per-parent sequence numbers, session-bound ephemeral
//! nodes, consistent child listings) for a single process. Useful for tests
//! and for coordinating tasks inside one application.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use crate::client::{ClientError, ClientResult, CoordinationClient, CreateFlags};
use crate::name::{node_name, resource_path_of};

/// Width of the zero-padded sequence suffix.
const SEQUENCE_WIDTH: usize = 10;

struct Node {
    data: Vec<u8>,
    ephemeral_owner: Option<Uuid>,
}

#[derive(Default)]
struct Tree {
    /// Every node except the implicit root, keyed by full path.
    nodes: BTreeMap<String, Node>,
    /// Next sequence number per parent path, shared by all child kinds.
    sequences: HashMap<String, u64>,
    live_sessions: HashSet<Uuid>,
    child_watchers: HashMap<String, watch::Sender<u64>>,
}

/// Parent path of `path`, with `""` standing for the root.
fn parent_of(path: &str) -> &str {
    match resource_path_of(path) {
        "/" => "",
        parent => parent,
    }
}

fn is_root(path: &str) -> bool {
    path.is_empty() || path == "/"
}

impl Tree {
    fn check_session(&self, session: Uuid) -> ClientResult<()> {
        if self.live_sessions.contains(&session) {
            Ok(())
        } else {
            Err(ClientError::SessionExpired)
        }
    }

    fn contains(&self, path: &str) -> bool {
        is_root(path) || self.nodes.contains_key(path)
    }

    fn children(&self, path: &str) -> Vec<String> {
        let parent = if is_root(path) { "" } else { path };
        self.nodes
            .keys()
            .filter(|candidate| parent_of(candidate) == parent)
            .map(|candidate| node_name(candidate).to_string())
            .collect()
    }

    fn notify_children_changed(&self, parent: &str) {
        if let Some(sender) = self.child_watchers.get(parent) {
            sender.send_modify(|version| *version += 1);
        }
    }

    /// Drops subscriptions nobody listens to anymore.
    fn prune_watchers(&mut self) {
        self.child_watchers
            .retain(|_, sender| sender.receiver_count() > 0);
    }

    fn insert(&mut self, path: String, data: Vec<u8>, owner: Option<Uuid>) {
        let parent = parent_of(&path).to_string();
        self.nodes.insert(
            path,
            Node {
                data,
                ephemeral_owner: owner,
            },
        );
        self.notify_children_changed(&parent);
    }

    fn delete(&mut self, path: &str) -> bool {
        if self.nodes.remove(path).is_none() {
            return false;
        }
        self.notify_children_changed(parent_of(path));
        if self
            .child_watchers
            .get(path)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            self.child_watchers.remove(path);
        }
        true
    }

    fn end_session(&mut self, session: Uuid) -> usize {
        if !self.live_sessions.remove(&session) {
            return 0;
        }
        let owned: Vec<String> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.ephemeral_owner == Some(session))
            .map(|(path, _)| path.clone())
            .collect();
        for path in &owned {
            self.delete(path);
        }
        owned.len()
    }
}

/// A single-process hierarchical namespace shared by any number of sessions.
#[derive(Clone, Default)]
pub struct InMemoryCoordinationService {
    tree: Arc<Mutex<Tree>>,
}

impl InMemoryCoordinationService {
    pub fn new() -> Self {
        Self::default()
    }

    fn tree(&self) -> MutexGuard<'_, Tree> {
        lock_tree(&self.tree)
    }

    /// Opens a new session and returns a client bound to it.
    pub fn connect(&self) -> InMemoryClient {
        let session = Uuid::new_v4();
        self.tree().live_sessions.insert(session);
        debug!(session = %session, "opened in-memory session");
        InMemoryClient {
            tree: self.tree.clone(),
            session,
        }
    }

    /// Ends a session as if its holder crashed, removing its ephemeral nodes.
    pub fn expire_session(&self, session: Uuid) {
        let removed = self.tree().end_session(session);
        debug!(session = %session, removed, "expired in-memory session");
    }

    /// Sorted child names of `path`; empty if it does not exist.
    pub fn children_of(&self, path: &str) -> Vec<String> {
        let mut children = self.tree().children(path);
        children.sort();
        children
    }

    /// Data stored at `path`, if the node exists.
    pub fn data_of(&self, path: &str) -> Option<Vec<u8>> {
        self.tree().nodes.get(path).map(|node| node.data.clone())
    }
}

fn lock_tree(tree: &Mutex<Tree>) -> MutexGuard<'_, Tree> {
    tree.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A client bound to one session of an [`InMemoryCoordinationService`].
#[derive(Clone)]
pub struct InMemoryClient {
    tree: Arc<Mutex<Tree>>,
    session: Uuid,
}

impl InMemoryClient {
    pub fn session_id(&self) -> Uuid {
        self.session
    }

    /// Ends this client's session and removes its ephemeral nodes.
    pub fn close(&self) {
        let removed = lock_tree(&self.tree).end_session(self.session);
        debug!(session = %self.session, removed, "closed in-memory session");
    }

    fn live_tree(&self) -> ClientResult<MutexGuard<'_, Tree>> {
        let tree = lock_tree(&self.tree);
        tree.check_session(self.session)?;
        Ok(tree)
    }
}

impl CoordinationClient for InMemoryClient {
    async fn ensure_path(&self, path: &str) -> ClientResult<bool> {
        let mut tree = self.live_tree()?;
        if is_root(path) {
            return Ok(true);
        }

        let ancestors = path
            .match_indices('/')
            .map(|(index, _)| &path[..index])
            .filter(|ancestor| !is_root(ancestor))
            .chain(std::iter::once(path));

        for ancestor in ancestors {
            if let Some(node) = tree.nodes.get(ancestor) {
                if node.ephemeral_owner.is_some() && ancestor != path {
                    return Ok(false);
                }
                continue;
            }
            if tree
                .nodes
                .get(parent_of(ancestor))
                .is_some_and(|parent| parent.ephemeral_owner.is_some())
            {
                return Ok(false);
            }
            tree.insert(ancestor.to_string(), Vec::new(), None);
        }
        Ok(true)
    }

    async fn create(&self, path: &str, data: &[u8], flags: CreateFlags) -> ClientResult<String> {
        let mut tree = self.live_tree()?;

        let parent = parent_of(path).to_string();
        match tree.nodes.get(&parent) {
            Some(node) if node.ephemeral_owner.is_some() => {
                return Err(ClientError::NoChildrenForEphemerals(parent));
            }
            None if !is_root(&parent) => return Err(ClientError::NoNode(parent)),
            _ => {}
        }

        let full_path = if flags.is_sequential() {
            let counter = tree.sequences.entry(parent).or_insert(0);
            let sequence = *counter;
            *counter += 1;
            format!("{path}{sequence:0width$}", width = SEQUENCE_WIDTH)
        } else {
            path.to_string()
        };

        if tree.nodes.contains_key(&full_path) {
            return Err(ClientError::NodeExists(full_path));
        }

        let owner = flags.is_ephemeral().then_some(self.session);
        tree.insert(full_path.clone(), data.to_vec(), owner);
        Ok(full_path)
    }

    async fn exists(&self, path: &str) -> ClientResult<bool> {
        Ok(self.live_tree()?.contains(path))
    }

    async fn get_children(&self, path: &str) -> ClientResult<Vec<String>> {
        let tree = self.live_tree()?;
        if !tree.contains(path) {
            return Err(ClientError::NoNode(path.to_string()));
        }
        Ok(tree.children(path))
    }

    async fn remove(&self, path: &str) -> ClientResult<bool> {
        let mut tree = self.live_tree()?;
        if !tree.nodes.contains_key(path) {
            return Ok(false);
        }
        if !tree.children(path).is_empty() {
            return Err(ClientError::NotEmpty(path.to_string()));
        }
        Ok(tree.delete(path))
    }

    fn watch_children(&self, path: &str) -> Option<watch::Receiver<u64>> {
        let mut tree = lock_tree(&self.tree);
        tree.prune_watchers();
        let key = if is_root(path) { "" } else { path };
        let receiver = tree
            .child_watchers
            .entry(key.to_string())
            .or_insert_with(|| watch::channel(0).0)
            .subscribe();
        Some(receiver)
    }
}
