use std::sync::Arc;

use keyhub_client::RpcClient;
use keyhub_transport::Transport;
use keyhub_transport_ws::WebSocketTransport;
use keyhub_wire::Action;
use tracing::debug;
use url::Url;

use crate::{Config, InstanceClient, Result, result};

/// Client for the hub control channel.
///
/// The hub starts and stops key-value instances. Starting one hands back an
/// [`InstanceClient`] connected over the same transport.
#[derive(Clone, Debug)]
pub struct HubClient {
    config: Config,
    transport: Arc<dyn Transport>,
    rpc: RpcClient,
}

impl HubClient {
    /// Connects to the hub over WebSocket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`](crate::Error::InvalidAddress) if the
    /// configured host and port do not form a URL.
    pub fn connect(config: Config) -> Result<Self> {
        Self::with_transport(config, Arc::new(WebSocketTransport::new()))
    }

    /// Connects to the hub over `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`](crate::Error::InvalidAddress) if the
    /// configured host and port do not form a URL.
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        let url = config.hub_url()?;
        let rpc = RpcClient::with_transport(config.client_config(url), Arc::clone(&transport));

        Ok(Self {
            config,
            transport,
            rpc,
        })
    }

    /// Underlying request client.
    #[must_use]
    pub const fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// Addresses of all running instances.
    ///
    /// # Errors
    ///
    /// Fails if the request fails or the result is not a list of strings.
    pub async fn list(&self) -> Result<Vec<String>> {
        let value = self.rpc.send_request(Action::List, "", "").await?;
        result::structured(Action::List, value)
    }

    /// Starts an instance on the given suffix and connects to it.
    ///
    /// # Errors
    ///
    /// Fails if the address is invalid or the hub rejects the request.
    pub async fn run(&self, suffix: &str) -> Result<InstanceClient> {
        let url = self.start(suffix).await?;

        Ok(InstanceClient::at_url(
            &self.config,
            url,
            Arc::clone(&self.transport),
        ))
    }

    /// Starts an instance on the given suffix without connecting to it.
    ///
    /// Returns the instance address.
    ///
    /// # Errors
    ///
    /// Fails if the address is invalid or the hub rejects the request.
    pub async fn start(&self, suffix: &str) -> Result<Url> {
        let url = self.config.instance_url(suffix)?;
        self.rpc.send_request(Action::Set, url.as_str(), "").await?;
        debug!("instance {} started", url);
        Ok(url)
    }

    /// Stops the instance on the given suffix.
    ///
    /// # Errors
    ///
    /// Fails if the address is invalid or the hub rejects the request.
    pub async fn stop(&self, suffix: &str) -> Result<()> {
        let url = self.config.instance_url(suffix)?;
        self.rpc.send_request(Action::Remove, url.as_str(), "").await?;
        debug!("instance {} stopped", url);
        Ok(())
    }

    /// Checks that the hub answers.
    ///
    /// # Errors
    ///
    /// Fails if the request fails.
    pub async fn ping(&self) -> Result<()> {
        self.rpc.send_request(Action::Ping, "", "").await?;
        Ok(())
    }
}
