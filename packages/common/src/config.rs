use serde::Deserialize;

/// Notification dispatcher configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    /// Maximum number of queued notifications. Events published while the
    /// queue is full are dropped. Default: 256.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Number of worker tasks draining the queue. Default: 2.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_queue_capacity() -> usize {
    256
}
fn default_workers() -> usize {
    2
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            workers: default_workers(),
        }
    }
}
