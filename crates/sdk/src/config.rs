use keyhub_client::ClientConfig;
use url::Url;

use crate::Error;

/// Host used when none is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// Port the hub listens on by default.
pub const DEFAULT_PORT: u16 = 8372;

/// Where the hub runs and how chatty the clients are.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Domain name or IP address of the hub.
    pub host: String,
    /// Hub port. Instances share it and differ by path suffix.
    pub port: u16,
    /// Log connection lifecycle and traffic at `info` level.
    pub verbose: bool,
}

impl Config {
    /// Configuration for the hub at `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            verbose: false,
        }
    }

    /// Enables or disables verbose logging.
    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Address of the hub control channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if host and port do not form a URL.
    pub fn hub_url(&self) -> Result<Url, Error> {
        self.url("/ctl")
    }

    /// Address of the instance with the given suffix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the resulting URL is malformed.
    pub fn instance_url(&self, suffix: &str) -> Result<Url, Error> {
        self.url(&format!("/ws{suffix}"))
    }

    pub(crate) fn client_config(&self, url: Url) -> ClientConfig {
        ClientConfig::new(url).verbose(self.verbose)
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        let raw = format!("ws://{}:{}{path}", self.host, self.port);
        Url::parse(&raw).map_err(|e| Error::InvalidAddress(format!("{raw}: {e}")))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}
