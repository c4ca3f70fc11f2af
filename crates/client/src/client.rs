use std::future::Future;
use std::sync::Arc;

use keyhub_transport::Transport;
use keyhub_wire::{Request, Value};
use tokio::sync::{mpsc, oneshot, watch};
use url::Url;

use crate::manager::{ConnectionManager, ConnectionStatus, Epoch, Input};
use crate::{ClientConfig, Error, Result};

/// Handle for sending requests over a managed connection.
///
/// Cloning is cheap; all clones share one connection. The connection manager
/// stops when the last clone is dropped.
#[derive(Clone, Debug)]
pub struct RpcClient {
    url: Url,
    inputs: mpsc::UnboundedSender<Input>,
    status: watch::Receiver<ConnectionStatus>,
}

impl RpcClient {
    /// Starts connecting to `config.url` over `transport`.
    ///
    /// Returns immediately; requests made before the connection opens are
    /// queued.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn connect(config: ClientConfig, transport: impl Transport) -> Self {
        Self::with_transport(config, Arc::new(transport))
    }

    /// Like [`connect`](Self::connect) for a shared transport.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let url = config.url.clone();
        let (inputs, status) = ConnectionManager::spawn(config, transport);

        Self {
            url,
            inputs,
            status,
        }
    }

    /// Address this client connects to.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Sends `action` with two options.
    ///
    /// Options travel as strings; pass `""` for an unused option. The request
    /// is submitted when this method is called, not when the returned future
    /// is first polled, so requests keep the order of the calls.
    pub fn send_request(
        &self,
        action: impl ToString,
        option_1: impl ToString,
        option_2: impl ToString,
    ) -> impl Future<Output = Result<Value>> + Send + 'static {
        self.send(
            Request::new(action)
                .with_option_1(option_1)
                .with_option_2(option_2),
        )
    }

    /// Sends a prepared request.
    ///
    /// The future resolves with the server's `result` and fails with
    /// [`Error::Application`] when the server reports an error,
    /// [`Error::ConnectionLost`] when the connection ends first, or
    /// [`Error::Protocol`] when the reply cannot be decoded.
    pub fn send(&self, request: Request) -> impl Future<Output = Result<Value>> + Send + 'static {
        let (responder, settled) = oneshot::channel();
        let submitted = self
            .inputs
            .send(Input::Request { request, responder })
            .is_ok();

        async move {
            if !submitted {
                return Err(Error::Stopped);
            }

            settled.await.unwrap_or(Err(Error::Stopped))
        }
    }

    /// Current connection status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Watches connection status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Registers `callback` to run each time a new connection replaces a
    /// closed one. It receives the new epoch.
    pub fn on_connection_updated(&self, callback: impl Fn(Epoch) + Send + Sync + 'static) {
        let _ = self.inputs.send(Input::Subscribe(Box::new(callback)));
    }
}
