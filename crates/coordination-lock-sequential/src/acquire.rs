//! The polling wait loop and the full acquire sequence built on it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use coordination_lock_core::error::{LockError, LockResult};
use coordination_lock_core::timeout::Deadline;
use tracing::{Span, field, instrument};

use crate::client::{ClientError, CoordinationClient};
use crate::contention::is_blocked;
use crate::handle::SequentialLockHandle;
use crate::name::{LockKind, build_prefix, node_name, parse_index, resource_path_of, validate_key};
use crate::options::SequentialLockOptions;
use crate::request::{abandon_request, create_request};

/// Waits until the request with `own_index` is no longer blocked.
///
/// Checks contention, then sleeps `poll_interval` (never past the deadline)
/// and checks again. A zero timeout performs exactly one check; `None` waits
/// indefinitely. With change notifications enabled and supported by the
/// client, a change to the resource's children cuts the sleep short.
#[instrument(
    skip(client, options),
    fields(backend = "sequential", acquired = field::Empty, elapsed_ms = field::Empty)
)]
pub async fn await_turn<C>(
    client: &C,
    resource_path: &str,
    own_index: Option<u64>,
    mode: LockKind,
    timeout: Option<Duration>,
    options: &SequentialLockOptions,
) -> LockResult<()>
where
    C: CoordinationClient + ?Sized,
{
    let start = Instant::now();
    let deadline = Deadline::after(timeout);
    let mut changes = if options.use_change_notifications {
        client.watch_children(resource_path)
    } else {
        None
    };

    loop {
        if !is_blocked(client, resource_path, own_index, mode).await? {
            Span::current().record("acquired", true);
            Span::current().record("elapsed_ms", start.elapsed().as_millis() as u64);
            return Ok(());
        }

        if deadline.has_passed() {
            Span::current().record("acquired", false);
            return Err(LockError::Timeout(deadline.timeout().unwrap_or_default()));
        }

        let pause = deadline.clamp(options.poll_interval);
        let mut subscription_closed = false;
        match changes.as_mut() {
            Some(receiver) => {
                tokio::select! {
                    _ = tokio::time::sleep(pause) => {}
                    changed = receiver.changed() => subscription_closed = changed.is_err(),
                }
            }
            None => tokio::time::sleep(pause).await,
        }
        if subscription_closed {
            changes = None;
        }
    }
}

/// Runs the whole acquire sequence for one request.
///
/// Shared by every lock type and by the provider facade.
pub(crate) struct SequentialAcquirer<C> {
    client: Arc<C>,
    options: Arc<SequentialLockOptions>,
}

impl<C> Clone for SequentialAcquirer<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            options: self.options.clone(),
        }
    }
}

impl<C: CoordinationClient + 'static> SequentialAcquirer<C> {
    pub(crate) fn new(client: Arc<C>, options: Arc<SequentialLockOptions>) -> Self {
        Self { client, options }
    }

    pub(crate) fn client(&self) -> &C {
        &self.client
    }

    /// Creates a request node for `kind` under `key` and waits for its turn.
    ///
    /// On any failure after the node was created, the node is removed before
    /// the error is returned.
    pub(crate) async fn acquire(
        &self,
        key: &str,
        kind: LockKind,
        timeout: Option<Duration>,
    ) -> LockResult<SequentialLockHandle<C>> {
        validate_key(key)?;

        let prefix = build_prefix(key, kind);
        let path = create_request(&*self.client, &prefix, &self.options.request_data).await?;

        let Some(own_index) = parse_index(node_name(&path)) else {
            abandon_request(&*self.client, &path).await;
            return Err(ClientError::Transport(format!(
                "created node '{path}' carries no sequence suffix"
            ))
            .into());
        };

        let waited = await_turn(
            &*self.client,
            resource_path_of(&path),
            Some(own_index),
            kind,
            timeout,
            &self.options,
        )
        .await;

        match waited {
            Ok(()) => Ok(SequentialLockHandle::new(
                self.client.clone(),
                path,
                kind,
                self.options.keepalive_cadence,
            )),
            Err(e) => {
                abandon_request(&*self.client, &path).await;
                Err(e)
            }
        }
    }

    /// Like [`acquire`](Self::acquire) with a zero timeout, reporting
    /// contention as `Ok(None)`.
    pub(crate) async fn try_acquire(
        &self,
        key: &str,
        kind: LockKind,
    ) -> LockResult<Option<SequentialLockHandle<C>>> {
        match self.acquire(key, kind, Some(Duration::ZERO)).await {
            Ok(handle) => Ok(Some(handle)),
            Err(e) if e.is_timeout() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
