//! Example: Using sequential-node distributed locks
//!
//! Run with: `cargo run --example sequential_lock`

use coordination_lock::*;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Two clients on one in-memory coordination service, each with its own session
    let service = InMemoryCoordinationService::new();
    let alice = SequentialLockProvider::builder()
        .client(service.connect())
        .use_change_notifications(true)
        .build()?;
    let bob = SequentialLockProvider::new(service.connect())?;

    println!("Created two lock providers");

    // Create a lock by name
    let lock = alice.create_lock("example-resource");
    println!("Created lock: {}", lock.name());

    match lock.try_acquire().await? {
        Some(handle) => {
            println!("Lock acquired at {}", handle.path());

            // The other client cannot get it right now
            let contender = bob.lock("example-resource", Duration::from_millis(200)).await;
            println!("Second client got the lock: {}", contender.is_some());

            handle.release().await?;
            println!("Lock released");
        }
        None => {
            println!("Lock is currently held by another client");
        }
    }

    // Readers share the resource until a writer shows up
    let r1 = alice.read_lock("report", Duration::from_secs(1)).await;
    let r2 = bob.read_lock("report", Duration::from_secs(1)).await;
    println!("Readers: {r1:?}, {r2:?}");
    println!(
        "Readers blocked: {}",
        alice.is_locked("report", LockKind::Read).await
    );

    for path in [r1, r2].into_iter().flatten() {
        alice.unlock(&path).await;
    }

    // Acquire with timeout
    println!("\nAcquiring write lock with 5 second timeout...");
    let rw = bob.create_reader_writer_lock("report");
    let handle = rw.acquire_write(Some(Duration::from_secs(5))).await?;
    println!("Write lock acquired!");

    // Lock is released in the background when the handle is dropped
    drop(handle);
    println!("Lock released (via drop)");

    Ok(())
}
