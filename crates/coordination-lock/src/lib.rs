//! Distributed locks for Rust over a hierarchical coordination service.
//!
//! Exclusive, write and read locks on named resources, built on the
//! classic sequential ephemeral node recipe: every request is an ephemeral,
//! sequentially numbered child of the resource path, so a crashed holder's
//! request disappears together with its session.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use coordination_lock::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Any CoordinationClient works; the in-memory service needs no server.
//!     let service = InMemoryCoordinationService::new();
//!     let provider = SequentialLockProvider::builder()
//!         .client(service.connect())
//!         .build()?;
//!
//!     let lock = provider.create_lock("orders/42");
//!     let handle = lock.acquire(Some(Duration::from_secs(5))).await?;
//!
//!     println!("holding {}", handle.path());
//!
//!     handle.release().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Path-based facade
//!
//! For call sites that only need "got it / didn't get it", the provider
//! hands out the request node path:
//!
//! ```rust,no_run
//! # use coordination_lock::*;
//! # use std::time::Duration;
//! # async fn demo(provider: SequentialLockProvider<InMemoryClient>) {
//! if let Some(handle) = provider.write_lock("res", Duration::from_secs(1)).await {
//!     // ...
//!     provider.unlock(&handle).await;
//! }
//! # }
//! ```
//!
//! # Contention rules
//!
//! - Exclusive and write requests are served in sequence order among
//!   themselves.
//! - Read requests wait while any write request exists and never wait for
//!   each other.
//! - Write requests do not wait for read locks that are already held.
//!
//! # Backends
//!
//! - [`InMemoryCoordinationService`]: single-process namespace with sessions.
//! - `ZooKeeperClient` (feature `zookeeper`): a ZooKeeper ensemble.
//!
//! # Crate Organization
//!
//! This is a meta-crate that re-exports types from:
//! - `coordination-lock-core`: Core traits and types
//! - `coordination-lock-sequential`: Sequential ephemeral node backend

// Re-export core types and traits
pub use coordination_lock_core::*;

// Re-export sequential backend
#[allow(ambiguous_glob_reexports)]
pub use coordination_lock_sequential::*;
