use std::collections::BTreeMap;
use std::sync::Arc;

use keyhub_client::RpcClient;
use keyhub_transport::Transport;
use keyhub_transport_ws::WebSocketTransport;
use keyhub_wire::Action;
use url::Url;

use crate::{Config, Result, result};

/// Client for one key-value instance.
#[derive(Clone, Debug)]
pub struct InstanceClient {
    rpc: RpcClient,
}

impl InstanceClient {
    /// Connects to the instance with the given suffix over WebSocket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`](crate::Error::InvalidAddress) if the
    /// instance address is malformed.
    pub fn connect(config: &Config, suffix: &str) -> Result<Self> {
        Self::with_transport(config, suffix, Arc::new(WebSocketTransport::new()))
    }

    /// Connects to the instance with the given suffix over `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`](crate::Error::InvalidAddress) if the
    /// instance address is malformed.
    pub fn with_transport(
        config: &Config,
        suffix: &str,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let url = config.instance_url(suffix)?;
        Ok(Self::at_url(config, url, transport))
    }

    pub(crate) fn at_url(config: &Config, url: Url, transport: Arc<dyn Transport>) -> Self {
        Self {
            rpc: RpcClient::with_transport(config.client_config(url), transport),
        }
    }

    /// Underlying request client.
    #[must_use]
    pub const fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// All stored entries.
    ///
    /// # Errors
    ///
    /// Fails if the request fails or the result is not a string map.
    pub async fn list(&self) -> Result<BTreeMap<String, String>> {
        let value = self.rpc.send_request(Action::List, "", "").await?;
        result::structured(Action::List, value)
    }

    /// Value stored under `key`.
    ///
    /// # Errors
    ///
    /// Fails if the key does not exist or the request fails.
    pub async fn get(&self, key: &str) -> Result<String> {
        let value = self.rpc.send_request(Action::Get, key, "").await?;
        result::text(Action::Get, value)
    }

    /// Stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Fails if the request fails.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.rpc.send_request(Action::Set, key, value).await?;
        Ok(())
    }

    /// Deletes `key`.
    ///
    /// # Errors
    ///
    /// Fails if the key does not exist or the request fails.
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.rpc.send_request(Action::Remove, key, "").await?;
        Ok(())
    }

    /// Checks that the instance answers.
    ///
    /// # Errors
    ///
    /// Fails if the request fails.
    pub async fn ping(&self) -> Result<()> {
        self.rpc.send_request(Action::Ping, "", "").await?;
        Ok(())
    }
}
