#![allow(dead_code)]

pub mod faulty_client;

use coordination_lock::{InMemoryClient, SequentialLockProvider};
use std::time::Duration;

/// Poll interval used by tests so waits stay short.
pub const TEST_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A provider on its own session of `service` with a short poll interval.
pub fn provider_for(
    service: &coordination_lock::InMemoryCoordinationService,
) -> SequentialLockProvider<InMemoryClient> {
    SequentialLockProvider::builder()
        .client(service.connect())
        .poll_interval(TEST_POLL_INTERVAL)
        .build()
        .unwrap()
}

/// Waits until `path` has exactly `count` children.
pub async fn wait_for_children(
    service: &coordination_lock::InMemoryCoordinationService,
    path: &str,
    count: usize,
) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while service.children_of(path).len() != count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("children count never reached");
}
