//! Convenience prelude for distributed lock types.

pub use crate::error::{LockError, LockResult};
pub use crate::timeout::{Deadline, Timeout};
pub use crate::traits::{
    DistributedLock, DistributedReaderWriterLock, LockHandle, LockProvider, LockProviderExt,
    ReaderWriterLockProvider,
};
