//! Creation and cleanup of request nodes.

use coordination_lock_core::error::{LockError, LockResult};
use tracing::{debug, warn};

use crate::client::{ClientError, CoordinationClient, CreateFlags};
use crate::name::resource_path_of;

/// Creates an ephemeral sequential request node under `prefix`.
///
/// The resource path (everything before the last `/` of `prefix`) is created
/// first if it does not exist. Returns the full path assigned by the service.
pub async fn create_request<C>(client: &C, prefix: &str, data: &[u8]) -> LockResult<String>
where
    C: CoordinationClient + ?Sized,
{
    let resource_path = resource_path_of(prefix);

    match client.ensure_path(resource_path).await {
        Ok(true) => {}
        Ok(false) => {
            return Err(LockError::PathCreation(format!(
                "resource path '{resource_path}' could not be created"
            )));
        }
        Err(e @ (ClientError::SessionExpired | ClientError::Transport(_))) => {
            return Err(e.into());
        }
        Err(e) => {
            return Err(LockError::PathCreation(format!(
                "resource path '{resource_path}' could not be created: {e}"
            )));
        }
    }

    let path = client
        .create(prefix, data, CreateFlags::EPHEMERAL_SEQUENTIAL)
        .await?;
    debug!(request.path = %path, "created request node");
    Ok(path)
}

/// Removes a request node that failed to acquire. Failures are only logged.
pub(crate) async fn abandon_request<C>(client: &C, path: &str)
where
    C: CoordinationClient + ?Sized,
{
    match client.remove(path).await {
        Ok(true) => debug!(request.path = %path, "removed abandoned request node"),
        Ok(false) => debug!(request.path = %path, "abandoned request node was already gone"),
        Err(e) => warn!(request.path = %path, error = %e, "failed to remove abandoned request node"),
    }
}
