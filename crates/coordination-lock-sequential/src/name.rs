//! Request node naming: lock kinds, path prefixes and sequence suffixes.
//!
//! A request for resource `res` is created as `res/lock-` (exclusive and
//! write) or `res/read-` (read); the coordination service appends a
//! zero-padded sequence number, e.g. `res/lock-0000000003`.

use std::fmt;
use std::str::FromStr;

use coordination_lock_core::error::{LockError, LockResult};

/// Node name prefix shared by exclusive and write requests.
pub const WRITE_NODE_PREFIX: &str = "lock-";

/// Node name prefix of read requests.
pub const READ_NODE_PREFIX: &str = "read-";

/// The kind of lock a request asks for.
///
/// Also used as the contention mode when evaluating whether a request is
/// blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LockKind {
    #[default]
    Exclusive,
    Write,
    Read,
}

impl LockKind {
    /// Node name prefix used for requests of this kind.
    pub fn node_prefix(self) -> &'static str {
        match self {
            LockKind::Exclusive | LockKind::Write => WRITE_NODE_PREFIX,
            LockKind::Read => READ_NODE_PREFIX,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LockKind::Exclusive => "exclusive",
            LockKind::Write => "write",
            LockKind::Read => "read",
        }
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockKind {
    type Err = LockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exclusive" => Ok(LockKind::Exclusive),
            "write" => Ok(LockKind::Write),
            "read" => Ok(LockKind::Read),
            other => Err(LockError::InvalidName(format!("unknown lock mode '{other}'"))),
        }
    }
}

/// Builds the path prefix under which a request of `kind` is created.
pub fn build_prefix(resource_key: &str, kind: LockKind) -> String {
    format!("{resource_key}/{}", kind.node_prefix())
}

/// Returns the resource path a prefix or request node lives under.
pub fn resource_path_of(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

/// Returns the last path segment.
pub fn node_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// Parses the sequence index from the trailing digits of a node name.
///
/// Returns `None` if the name has no trailing digits (it is not a sequence
/// node) or the digits do not fit a `u64`.
pub fn parse_index(node_name: &str) -> Option<u64> {
    let digit_count = node_name
        .bytes()
        .rev()
        .take_while(u8::is_ascii_digit)
        .count();
    if digit_count == 0 {
        return None;
    }

    let digits = &node_name[node_name.len() - digit_count..];
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Some(0);
    }
    significant.parse().ok()
}

/// Rejects keys that cannot name a resource path.
pub fn validate_key(resource_key: &str) -> LockResult<()> {
    if resource_key.is_empty() {
        return Err(LockError::InvalidName(
            "lock name cannot be empty".to_string(),
        ));
    }
    if resource_key.ends_with('/') {
        return Err(LockError::InvalidName(format!(
            "lock name '{resource_key}' must not end with '/'"
        )));
    }
    Ok(())
}
