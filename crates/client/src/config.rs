use std::time::Duration;

use url::Url;

/// Delay between a connection closing and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// Configuration for an [`RpcClient`](crate::RpcClient).
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Address of the server endpoint.
    pub url: Url,
    /// Fixed delay before reconnecting after a close.
    pub reconnect_delay: Duration,
    /// Log connection lifecycle and traffic at `info` level.
    pub verbose: bool,
}

impl ClientConfig {
    /// Configuration for `url` with default settings.
    #[must_use]
    pub const fn new(url: Url) -> Self {
        Self {
            url,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            verbose: false,
        }
    }

    /// Sets the reconnect delay.
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Enables or disables verbose logging.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
