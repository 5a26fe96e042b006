use std::time::Duration;

/// Tuning for sequential-node locks.
#[derive(Debug, Clone)]
pub struct SequentialLockOptions {
    /// Pause between contention checks while blocked.
    pub poll_interval: Duration,
    /// Wake a blocked waiter as soon as the resource's children change, when
    /// the client supports subscriptions. Polling still bounds the wait.
    pub use_change_notifications: bool,
    /// How often a held handle checks that its request node still exists.
    /// `None` disables loss detection.
    pub keepalive_cadence: Option<Duration>,
    /// Payload stored in every request node.
    pub request_data: Vec<u8>,
}

impl Default for SequentialLockOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            use_change_notifications: false,
            keepalive_cadence: None,
            request_data: Vec::new(),
        }
    }
}
