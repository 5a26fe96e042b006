//! Decides whether a request is currently blocked by its siblings.
//!
//! Exclusive and write requests queue behind every writer request with a
//! smaller sequence index. Read requests wait while any writer request
//! exists, whatever its index, and never wait for other readers. Writers do
//! not look at read requests at all.

use coordination_lock_core::error::LockResult;

use crate::client::{ClientError, CoordinationClient};
use crate::name::{LockKind, WRITE_NODE_PREFIX, parse_index};

/// The writer requests under a resource, parsed once per poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contenders {
    /// Number of children carrying the writer prefix, sequence node or not.
    writer_nodes: usize,
    /// Sequence indices of the writer children that have one.
    writer_indices: Vec<u64>,
}

impl Contenders {
    /// Builds the snapshot from a child listing, in any order.
    pub fn from_children<S: AsRef<str>>(children: &[S]) -> Self {
        let mut contenders = Self::default();
        for child in children {
            let child = child.as_ref();
            if !child.starts_with(WRITE_NODE_PREFIX) {
                continue;
            }
            contenders.writer_nodes += 1;
            if let Some(index) = parse_index(child) {
                contenders.writer_indices.push(index);
            }
        }
        contenders
    }

    /// Whether a request with `own_index` in `mode` has to keep waiting.
    ///
    /// `own_index = None` asks whether a brand-new request would block.
    pub fn blocks(&self, own_index: Option<u64>, mode: LockKind) -> bool {
        match mode {
            LockKind::Read => self.writer_nodes > 0,
            LockKind::Exclusive | LockKind::Write => match own_index {
                Some(own) => self.writer_indices.iter().any(|&index| index < own),
                None => !self.writer_indices.is_empty(),
            },
        }
    }
}

/// Lists the children of `resource_path` and evaluates contention for one request.
///
/// A resource path that does not exist blocks nobody.
pub async fn is_blocked<C>(
    client: &C,
    resource_path: &str,
    own_index: Option<u64>,
    mode: LockKind,
) -> LockResult<bool>
where
    C: CoordinationClient + ?Sized,
{
    let children = match client.get_children(resource_path).await {
        Ok(children) => children,
        Err(ClientError::NoNode(_)) => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    Ok(Contenders::from_children(&children).blocks(own_index, mode))
}
