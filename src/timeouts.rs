//! Timeout configuration for the HTTP transport.

use std::time::Duration;

/// Timeout configuration for ClickHouse requests.
///
/// # Examples
///
/// ```rust
/// use clickhouse_link::ClickHouseLinkTimeouts;
/// use std::time::Duration;
///
/// // Defaults: bounded connect, unbounded streaming reads
/// let timeouts = ClickHouseLinkTimeouts::default();
///
/// let timeouts = ClickHouseLinkTimeouts::builder()
///     .connection_timeout(Duration::from_secs(60))
///     .receive_timeout(Duration::from_secs(300))
///     .build();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickHouseLinkTimeouts {
    /// Timeout for establishing connections (TCP + TLS handshake).
    /// Default: 10 seconds
    pub connection_timeout: Duration,

    /// Total time allowed for a request, including reading the whole body.
    /// Zero disables it, which suits long-lived streaming reads.
    /// Default: 0 (disabled)
    pub receive_timeout: Duration,

    /// How long idle pooled connections are kept.
    /// Default: 90 seconds
    pub pool_idle_timeout: Duration,
}

impl Default for ClickHouseLinkTimeouts {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(10),
            receive_timeout: Duration::ZERO,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

impl ClickHouseLinkTimeouts {
    pub fn builder() -> ClickHouseLinkTimeoutsBuilder {
        ClickHouseLinkTimeoutsBuilder::new()
    }

    /// Short timeouts for a server on localhost
    pub fn fast() -> Self {
        Self {
            connection_timeout: Duration::from_secs(2),
            receive_timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(30),
        }
    }

    /// Long timeouts for remote or slow servers
    pub fn relaxed() -> Self {
        Self {
            connection_timeout: Duration::from_secs(30),
            receive_timeout: Duration::ZERO,
            pool_idle_timeout: Duration::from_secs(300),
        }
    }

    /// Check if a duration represents "no timeout" (zero or very large).
    pub fn is_no_timeout(duration: Duration) -> bool {
        duration.is_zero() || duration > Duration::from_secs(86400 * 365)
    }

    /// `receive_timeout` as reqwest expects it
    pub(crate) fn total_timeout(&self) -> Option<Duration> {
        if Self::is_no_timeout(self.receive_timeout) {
            None
        } else {
            Some(self.receive_timeout)
        }
    }
}

/// Builder for [`ClickHouseLinkTimeouts`]
#[derive(Debug, Clone)]
pub struct ClickHouseLinkTimeoutsBuilder {
    timeouts: ClickHouseLinkTimeouts,
}

impl ClickHouseLinkTimeoutsBuilder {
    fn new() -> Self {
        Self {
            timeouts: ClickHouseLinkTimeouts::default(),
        }
    }

    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connection_timeout = timeout;
        self
    }

    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.receive_timeout = timeout;
        self
    }

    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.pool_idle_timeout = timeout;
        self
    }

    pub fn build(self) -> ClickHouseLinkTimeouts {
        self.timeouts
    }
}
