//! Integration tests for sequential-node locks on the in-memory service.

use coordination_lock::*;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tokio::time::timeout;

mod common;
use common::faulty_client::FaultyClient;
use common::{TEST_POLL_INTERVAL, provider_for, wait_for_children};

#[tokio::test]
async fn test_acquire_release_scenario() {
    let service = InMemoryCoordinationService::new();
    let a = provider_for(&service);
    let b = provider_for(&service);

    let a_handle = a.write_lock("res", Duration::ZERO).await;
    assert_eq!(a_handle.as_deref(), Some("res/lock-0000000000"));

    // B sees A's smaller request, gives up and removes its own request.
    assert!(b.write_lock("res", Duration::ZERO).await.is_none());
    assert_eq!(service.children_of("res"), vec!["lock-0000000000"]);

    assert!(a.unlock("res/lock-0000000000").await);

    let b_handle = b.write_lock("res", Duration::ZERO).await;
    assert_eq!(b_handle.as_deref(), Some("res/lock-0000000002"));
}

#[tokio::test]
async fn test_round_trip_then_other_caller() {
    let service = InMemoryCoordinationService::new();
    let first = provider_for(&service);
    let second = provider_for(&service);

    let handle = first.write_lock("R", Duration::ZERO).await.unwrap();
    assert!(first.unlock(&handle).await);
    assert!(second.write_lock("R", Duration::ZERO).await.is_some());
}

#[tokio::test]
async fn test_double_unlock_is_idempotent() {
    let service = InMemoryCoordinationService::new();
    let provider = provider_for(&service);

    let handle = provider.lock("res", Duration::ZERO).await.unwrap();
    assert!(provider.unlock(&handle).await);
    assert!(!provider.unlock(&handle).await);
}

#[tokio::test]
async fn test_writers_are_served_in_sequence_order() {
    let service = InMemoryCoordinationService::new();
    let a = provider_for(&service);
    let b = Arc::new(provider_for(&service));
    let c = Arc::new(provider_for(&service));

    let a_handle = a
        .acquire("res", LockKind::Write, Some(Duration::ZERO))
        .await
        .unwrap();

    let b_task = {
        let b = b.clone();
        tokio::spawn(async move {
            b.acquire("res", LockKind::Write, Some(Duration::from_secs(5)))
                .await
        })
    };
    wait_for_children(&service, "res", 2).await;

    let c_task = {
        let c = c.clone();
        tokio::spawn(async move {
            c.acquire("res", LockKind::Write, Some(Duration::from_secs(5)))
                .await
        })
    };
    wait_for_children(&service, "res", 3).await;

    a_handle.release().await.unwrap();

    let b_handle = timeout(Duration::from_secs(2), b_task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(b_handle.path(), "res/lock-0000000001");

    // C is still queued behind B.
    tokio::time::sleep(TEST_POLL_INTERVAL * 5).await;
    assert!(!c_task.is_finished());

    b_handle.release().await.unwrap();

    let c_handle = timeout(Duration::from_secs(2), c_task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(c_handle.path(), "res/lock-0000000002");
}

#[tokio::test]
async fn test_readers_do_not_block_each_other() {
    let service = InMemoryCoordinationService::new();
    let providers: Vec<_> = (0..5).map(|_| provider_for(&service)).collect();

    for provider in &providers {
        assert!(provider.read_lock("res", Duration::ZERO).await.is_some());
    }
    assert_eq!(service.children_of("res").len(), 5);
}

#[tokio::test]
async fn test_reader_blocked_by_writer_leaves_no_orphan() {
    let service = InMemoryCoordinationService::new();
    let writer = provider_for(&service);
    let reader = provider_for(&service);

    let handle = writer.write_lock("res", Duration::ZERO).await.unwrap();

    assert!(reader.read_lock("res", Duration::ZERO).await.is_none());
    assert_eq!(service.children_of("res"), vec!["lock-0000000000"]);

    assert!(writer.unlock(&handle).await);
    assert!(reader.read_lock("res", Duration::ZERO).await.is_some());
}

#[tokio::test]
async fn test_writer_does_not_wait_for_readers() {
    let service = InMemoryCoordinationService::new();
    let reader = provider_for(&service);
    let writer = provider_for(&service);

    assert!(reader.read_lock("res", Duration::ZERO).await.is_some());
    assert!(writer.write_lock("res", Duration::ZERO).await.is_some());
}

#[tokio::test]
async fn test_reader_acquires_after_writer_releases() {
    let service = InMemoryCoordinationService::new();
    let writer = provider_for(&service);
    let reader = Arc::new(provider_for(&service));

    let handle = writer.write_lock("res", Duration::ZERO).await.unwrap();

    let read_task = {
        let reader = reader.clone();
        tokio::spawn(async move { reader.read_lock("res", Duration::from_secs(5)).await })
    };
    wait_for_children(&service, "res", 2).await;

    assert!(writer.unlock(&handle).await);

    let read_handle = timeout(Duration::from_secs(2), read_task)
        .await
        .unwrap()
        .unwrap();
    assert!(read_handle.is_some());
}

#[tokio::test]
async fn test_timeout_is_reported() {
    let service = InMemoryCoordinationService::new();
    let holder = provider_for(&service);
    let waiter = provider_for(&service);

    let _held = holder.lock("res", Duration::ZERO).await.unwrap();

    let start = Instant::now();
    let result = waiter.try_lock("res", Duration::from_millis(150)).await;
    assert!(matches!(result, Err(LockError::Timeout(_))));
    assert!(start.elapsed() >= Duration::from_millis(150));
    assert_eq!(service.children_of("res").len(), 1);
}

#[tokio::test]
async fn test_change_notification_wakes_waiter() {
    let service = InMemoryCoordinationService::new();
    let holder = provider_for(&service);
    // Polling alone would not notice the release within the test timeout.
    let waiter = Arc::new(
        SequentialLockProvider::builder()
            .client(service.connect())
            .poll_interval(Duration::from_secs(30))
            .use_change_notifications(true)
            .build()
            .unwrap(),
    );

    let handle = holder.write_lock("res", Duration::ZERO).await.unwrap();

    let wait_task = {
        let waiter = waiter.clone();
        tokio::spawn(async move { waiter.write_lock("res", Duration::from_secs(60)).await })
    };
    wait_for_children(&service, "res", 2).await;
    // Let the waiter finish its first check and start sleeping.
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(holder.unlock(&handle).await);

    let acquired = timeout(Duration::from_secs(2), wait_task)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(acquired.as_deref(), Some("res/lock-0000000001"));
}

#[tokio::test]
async fn test_session_expiry_releases_lock_and_signals_loss() {
    let service = InMemoryCoordinationService::new();
    let holder = SequentialLockProvider::builder()
        .client(service.connect())
        .poll_interval(TEST_POLL_INTERVAL)
        .keepalive_cadence(Duration::from_millis(20))
        .build()
        .unwrap();
    let other = provider_for(&service);

    let handle = holder
        .acquire("res", LockKind::Exclusive, Some(Duration::ZERO))
        .await
        .unwrap();
    let mut lost = handle.lost_token().clone();
    assert!(!*lost.borrow());

    service.expire_session(holder.client().session_id());

    timeout(Duration::from_secs(2), lost.changed())
        .await
        .unwrap()
        .unwrap();
    assert!(*lost.borrow());

    assert!(other.lock("res", Duration::ZERO).await.is_some());
}

#[tokio::test]
async fn test_release_of_removed_node_reports_lock_lost() {
    let service = InMemoryCoordinationService::new();
    let holder = provider_for(&service);
    let other = provider_for(&service);

    let handle = holder
        .acquire("res", LockKind::Write, Some(Duration::ZERO))
        .await
        .unwrap();
    assert!(other.unlock(handle.path()).await);

    assert!(matches!(handle.release().await, Err(LockError::LockLost(_))));
}

#[tokio::test]
async fn test_dropped_handle_removes_its_node() {
    let service = InMemoryCoordinationService::new();
    let provider = provider_for(&service);

    {
        let _handle = provider
            .acquire("res", LockKind::Read, Some(Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(service.children_of("res").len(), 1);
    }

    wait_for_children(&service, "res", 0).await;
}

#[tokio::test]
async fn test_detached_handle_keeps_its_node() {
    let service = InMemoryCoordinationService::new();
    let provider = provider_for(&service);

    let handle = provider
        .acquire("res", LockKind::Write, Some(Duration::ZERO))
        .await
        .unwrap();
    let path = handle.into_path();

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(service.children_of("res"), vec!["lock-0000000000"]);
    assert!(provider.unlock(&path).await);
}

#[tokio::test]
async fn test_is_locked() {
    let service = InMemoryCoordinationService::new();
    let provider = provider_for(&service);

    assert!(!provider.is_locked("res", LockKind::Exclusive).await);
    assert!(!provider.is_locked("res", LockKind::Read).await);

    let read = provider.read_lock("res", Duration::ZERO).await.unwrap();
    assert!(!provider.is_locked("res", LockKind::Exclusive).await);
    assert!(!provider.is_locked("res", LockKind::Read).await);

    let write = provider.write_lock("res", Duration::ZERO).await.unwrap();
    assert!(provider.is_locked("res", LockKind::Exclusive).await);
    assert!(provider.is_locked("res", "read".parse().unwrap()).await);

    // The query itself never creates nodes.
    assert_eq!(service.children_of("res").len(), 2);

    assert!(provider.unlock(&write).await);
    assert!(provider.unlock(&read).await);
    assert!(!provider.is_locked("res", LockKind::Write).await);
}

#[tokio::test]
async fn test_coordination_failure_collapses_to_none() {
    let service = InMemoryCoordinationService::new();
    let client = FaultyClient::new(service.connect());
    let faults = client.faults();
    let provider = SequentialLockProvider::builder()
        .client(client)
        .poll_interval(TEST_POLL_INTERVAL)
        .build()
        .unwrap();

    faults.disconnected.store(true, Ordering::SeqCst);

    assert!(provider.lock("res", Duration::ZERO).await.is_none());
    assert!(matches!(
        provider.try_read_lock("res", Duration::ZERO).await,
        Err(LockError::Coordination(_))
    ));
    assert!(!provider.unlock("res/lock-0000000000").await);
    assert!(!provider.is_locked("res", LockKind::Exclusive).await);
}

#[tokio::test]
async fn test_path_creation_failure() {
    let service = InMemoryCoordinationService::new();
    let client = FaultyClient::new(service.connect());
    let faults = client.faults();
    let provider = SequentialLockProvider::new(client).unwrap();

    faults.refuse_paths.store(true, Ordering::SeqCst);

    assert!(provider.write_lock("res", Duration::ZERO).await.is_none());
    assert!(matches!(
        provider.try_write_lock("res", Duration::ZERO).await,
        Err(LockError::PathCreation(_))
    ));
    assert!(service.children_of("res").is_empty());
}

#[tokio::test]
async fn test_failed_cleanup_is_ignored() {
    let service = InMemoryCoordinationService::new();
    let holder = provider_for(&service);
    let client = FaultyClient::new(service.connect());
    let faults = client.faults();
    let session = client.inner().session_id();
    let waiter = SequentialLockProvider::new(client).unwrap();

    let _held = holder.write_lock("res", Duration::ZERO).await.unwrap();

    faults.failing_removes.store(true, Ordering::SeqCst);
    assert!(waiter.write_lock("res", Duration::ZERO).await.is_none());

    // The orphaned request only disappears with its session.
    assert_eq!(service.children_of("res").len(), 2);
    service.expire_session(session);
    assert_eq!(service.children_of("res").len(), 1);
}

#[tokio::test]
async fn test_locks_on_different_resources_are_independent() {
    let service = InMemoryCoordinationService::new();
    let a = provider_for(&service);
    let b = provider_for(&service);

    assert!(a.lock("/locks/orders", Duration::ZERO).await.is_some());
    assert!(b.lock("/locks/payments", Duration::ZERO).await.is_some());
    assert_eq!(service.children_of("/locks"), vec!["orders", "payments"]);
}
