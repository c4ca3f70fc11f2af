//! Connection lifecycle and request correlation.
//!
//! The manager is a single task. Client commands and transport callbacks are
//! funnelled into one channel, so every piece of state below is touched by
//! exactly one logical thread and events are handled in arrival order.

use std::fmt;
use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;

use keyhub_transport::{CloseEvent, Connection, Transport, TransportError, TransportHandler};
use keyhub_wire::Request;
use tokio::sync::{mpsc, watch};
use tokio::time::{Sleep, sleep};
use tracing::{debug, info, trace, warn};

use crate::correlator::{RequestCorrelator, Responder};
use crate::queue::{PendingQueue, QueuedSend};
use crate::{ClientConfig, Error};

macro_rules! verbose {
    ($manager:expr, $($arg:tt)+) => {
        if $manager.config.verbose {
            info!($($arg)+);
        }
    };
}

/// One lifetime of one transport connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(u64);

impl Epoch {
    /// Epoch of the first connection.
    pub const FIRST: Self = Self(1);

    /// Raw epoch number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of the current connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// Waiting for the transport to open. Requests are queued.
    Connecting,
    /// Requests are written immediately.
    Open,
    /// The connection ended; a reconnect is scheduled.
    Closed,
}

/// Snapshot published whenever the state or epoch changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// Current epoch.
    pub epoch: Epoch,
    /// State within that epoch.
    pub state: ConnectionState,
}

/// Called with the new epoch after each reconnect.
pub(crate) type ConnectionUpdatedCallback = Box<dyn Fn(Epoch) + Send + Sync + 'static>;

/// Everything the manager task reacts to, in arrival order.
pub(crate) enum Input {
    Request {
        request: Request,
        responder: Responder,
    },
    Subscribe(ConnectionUpdatedCallback),
    Transport {
        epoch: Epoch,
        event: TransportEvent,
    },
}

/// Transport callback, as forwarded by [`EpochHandler`].
#[derive(Debug)]
pub(crate) enum TransportEvent {
    Open,
    Close(CloseEvent),
    Message(String),
    Error(TransportError),
}

/// Handler bound to one connection. Every event is tagged with the epoch the
/// connection belongs to.
struct EpochHandler {
    epoch: Epoch,
    inputs: mpsc::WeakUnboundedSender<Input>,
}

impl EpochHandler {
    fn forward(&self, event: TransportEvent) {
        if let Some(inputs) = self.inputs.upgrade() {
            let _ = inputs.send(Input::Transport {
                epoch: self.epoch,
                event,
            });
        }
    }
}

impl TransportHandler for EpochHandler {
    fn on_open(&self) {
        self.forward(TransportEvent::Open);
    }

    fn on_close(&self, event: CloseEvent) {
        self.forward(TransportEvent::Close(event));
    }

    fn on_message(&self, text: String) {
        self.forward(TransportEvent::Message(text));
    }

    fn on_error(&self, error: TransportError) {
        self.forward(TransportEvent::Error(error));
    }
}

/// State owned by the manager task.
pub(crate) struct ConnectionManager {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    inputs: mpsc::WeakUnboundedSender<Input>,
    epoch: Epoch,
    state: ConnectionState,
    connection: Option<Box<dyn Connection>>,
    correlator: RequestCorrelator,
    queue: PendingQueue,
    // Error that ended the current epoch; requests made before the reconnect
    // are rejected with it.
    closed_with: Option<Error>,
    reconnect: Option<Pin<Box<Sleep>>>,
    callbacks: Vec<ConnectionUpdatedCallback>,
    status: watch::Sender<ConnectionStatus>,
}

impl ConnectionManager {
    /// Opens the first connection and spawns the manager task.
    ///
    /// The manager stops once every sender clone has been dropped.
    pub(crate) fn spawn(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> (
        mpsc::UnboundedSender<Input>,
        watch::Receiver<ConnectionStatus>,
    ) {
        let (inputs_tx, inputs_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus {
            epoch: Epoch::FIRST,
            state: ConnectionState::Connecting,
        });

        let mut manager = Self {
            config,
            transport,
            inputs: inputs_tx.downgrade(),
            epoch: Epoch::FIRST,
            state: ConnectionState::Connecting,
            connection: None,
            correlator: RequestCorrelator::new(),
            queue: PendingQueue::new(),
            closed_with: None,
            reconnect: None,
            callbacks: Vec::new(),
            status: status_tx,
        };
        manager.connect();

        tokio::spawn(manager.run(inputs_rx));

        (inputs_tx, status_rx)
    }

    async fn run(mut self, mut inputs: mpsc::UnboundedReceiver<Input>) {
        loop {
            tokio::select! {
                input = inputs.recv() => match input {
                    Some(input) => self.handle(input),
                    None => break,
                },
                () = reconnect_elapsed(&mut self.reconnect) => {
                    self.reconnect = None;
                    self.start_epoch();
                }
            }
        }

        debug!(url = %self.config.url, "all client handles dropped, stopping");
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
        self.correlator.reject_all(&Error::Stopped);
    }

    fn handle(&mut self, input: Input) {
        match input {
            Input::Request { request, responder } => self.submit(request, responder),
            Input::Subscribe(callback) => self.callbacks.push(callback),
            Input::Transport { epoch, event } if epoch == self.epoch => {
                self.on_transport_event(event);
            }
            Input::Transport { epoch, event } => {
                trace!(%epoch, current = %self.epoch, ?event, "ignoring event from stale connection");
            }
        }
    }

    fn submit(&mut self, request: Request, responder: Responder) {
        if let Some(error) = &self.closed_with {
            debug!(action = %request.action, "rejecting request made while disconnected");
            let _ = responder.send(Err(error.clone()));
            return;
        }

        let id = self.correlator.register(responder);
        let send = QueuedSend { id, request };

        if self.state == ConnectionState::Open {
            self.transmit(send);
        } else {
            debug!(request_id = %id, "connection not open, queueing request");
            self.queue.enqueue(send);
        }
    }

    fn transmit(&mut self, send: QueuedSend) {
        let text = match keyhub_wire::encode(&send.request, send.id) {
            Ok(text) => text,
            Err(e) => {
                self.correlator.reject(send.id, Error::Codec(e.to_string()));
                return;
            }
        };

        verbose!(self, request_id = %send.id, "sending: {}", text);

        let Some(connection) = &self.connection else {
            return;
        };

        // A failed write means the connection is going away; its close event
        // rejects the request.
        if let Err(e) = connection.send(text) {
            warn!(request_id = %send.id, "failed to send request: {}", e);
        }
    }

    fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Open => self.on_open(),
            TransportEvent::Close(close) => self.on_close(close),
            TransportEvent::Message(text) => self.on_message(&text),
            TransportEvent::Error(error) => {
                verbose!(self, epoch = %self.epoch, "got error: {}", error);
            }
        }
    }

    fn on_open(&mut self) {
        if self.state != ConnectionState::Connecting {
            return;
        }

        self.state = ConnectionState::Open;
        self.publish();
        verbose!(self, url = %self.config.url, epoch = %self.epoch, "connection established");

        let mut queued = std::mem::take(&mut self.queue);
        debug!(count = queued.len(), "flushing queued requests");
        queued.flush(|send| self.transmit(send));
    }

    fn on_message(&mut self, text: &str) {
        verbose!(self, "got data: {}", text);

        for decoded in keyhub_wire::decode_frame(text) {
            match decoded {
                Ok(response) => {
                    let id = response.request_id;
                    let matched = match response.into_result() {
                        Ok(result) => self.correlator.resolve(id, result),
                        Err(error) => self.correlator.reject(id, Error::Application(error)),
                    };

                    if !matched {
                        trace!(request_id = %id, "dropping reply for unknown request");
                    }
                }
                Err(e) => {
                    warn!("failed to decode reply: {}", e);

                    if let Some(id) = e.request_id() {
                        self.correlator.reject(id, Error::Protocol(e.to_string()));
                    }
                }
            }
        }
    }

    fn on_close(&mut self, close: CloseEvent) {
        if self.state == ConnectionState::Closed {
            return;
        }

        verbose!(
            self,
            epoch = %self.epoch,
            "connection {} code: {}, reason: {}",
            if close.was_clean { "closed" } else { "aborted" },
            close.code,
            close.reason
        );

        self.state = ConnectionState::Closed;
        if let Some(connection) = self.connection.take() {
            connection.close();
        }

        let error = Error::ConnectionLost {
            code: close.code,
            reason: close.reason,
            was_clean: close.was_clean,
        };
        let rejected = self.correlator.reject_all(&error);
        debug!(rejected, "rejected pending requests");

        self.queue.clear();
        self.closed_with = Some(error);
        self.publish();

        if self.reconnect.is_none() {
            self.reconnect = Some(Box::pin(sleep(self.config.reconnect_delay)));
        }
    }

    fn start_epoch(&mut self) {
        self.epoch = self.epoch.next();
        self.correlator.reset();
        self.queue.clear();
        self.closed_with = None;
        self.state = ConnectionState::Connecting;

        verbose!(self, url = %self.config.url, epoch = %self.epoch, "reconnecting");
        self.connect();
        self.publish();

        for callback in &self.callbacks {
            callback(self.epoch);
        }
    }

    fn connect(&mut self) {
        let handler = Arc::new(EpochHandler {
            epoch: self.epoch,
            inputs: self.inputs.clone(),
        });

        self.connection = Some(self.transport.connect(&self.config.url, handler));
    }

    fn publish(&self) {
        self.status.send_replace(ConnectionStatus {
            epoch: self.epoch,
            state: self.state,
        });
    }
}

async fn reconnect_elapsed(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(timer) => timer.as_mut().await,
        None => pending().await,
    }
}
