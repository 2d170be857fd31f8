//! Configuration for the sync engine and the HTTP remote.

use std::time::Duration;

/// Default delay between two delta polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration for engine operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Delay before every delta poll.
    pub poll_interval: Duration,
    /// Capacity of the channels behind the read projection and poll streams.
    pub projection_buffer: usize,
    /// Whether a full refresh drops visible records the server no longer
    /// returns.
    pub prune_on_refresh: bool,
}

impl SyncConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            projection_buffer: 16,
            prune_on_refresh: true,
        }
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the stream channel capacity. Values below 1 are raised to 1.
    pub fn with_projection_buffer(mut self, capacity: usize) -> Self {
        self.projection_buffer = capacity.max(1);
        self
    }

    /// Sets whether a full refresh prunes records missing from the response.
    pub fn with_prune_on_refresh(mut self, prune: bool) -> Self {
        self.prune_on_refresh = prune;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for [`crate::HttpRemote`].
#[derive(Debug, Clone)]
pub struct HttpRemoteConfig {
    /// Base URL of the feed service (e.g., "https://feed.example.com/api").
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl HttpRemoteConfig {
    /// Creates a configuration for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
