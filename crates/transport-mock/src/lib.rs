//! Scripted in-memory transport for tests.
//!
//! Every call to [`Transport::connect`] produces a [`MockSocket`] the test
//! drives by hand: it fires the handler callbacks (`open`, `reply`, `close`,
//! ...) and observes every frame the client sent.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use keyhub_transport::{CloseEvent, Connection, Transport, TransportError, TransportHandler};
use keyhub_wire::{CodecError, Request, RequestId, Response};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;
use url::Url;

/// Transport whose connections are driven by the test.
#[derive(Clone, Debug)]
pub struct MockTransport {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    sockets_tx: mpsc::UnboundedSender<MockSocket>,
    sockets_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<MockSocket>>,
    connects: Mutex<Vec<Url>>,
}

impl MockTransport {
    /// Creates a transport with no connections yet.
    #[must_use]
    pub fn new() -> Self {
        let (sockets_tx, sockets_rx) = mpsc::unbounded_channel();

        Self {
            inner: Arc::new(Inner {
                sockets_tx,
                sockets_rx: tokio::sync::Mutex::new(sockets_rx),
                connects: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Waits for the next connection a client opens.
    ///
    /// # Panics
    ///
    /// Panics if the transport has been dropped, which cannot happen while
    /// `self` is alive.
    pub async fn next_socket(&self) -> MockSocket {
        self.inner
            .sockets_rx
            .lock()
            .await
            .recv()
            .await
            .expect("transport holds the sender")
    }

    /// URLs of every connection made so far, oldest first.
    #[must_use]
    pub fn connects(&self) -> Vec<Url> {
        self.inner.connects.lock().clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn connect(&self, url: &Url, handler: Arc<dyn TransportHandler>) -> Box<dyn Connection> {
        debug!("mock connect to {}", url);

        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));

        self.inner.connects.lock().push(url.clone());

        let socket = MockSocket {
            url: url.clone(),
            handler,
            sent_rx,
            closed: Arc::clone(&closed),
        };
        // The receiving half lives in `self`, so this only fails during drop.
        let _ = self.inner.sockets_tx.send(socket);

        Box::new(MockConnection { sent_tx, closed })
    }
}

/// Client-side half handed to the code under test.
#[derive(Debug)]
struct MockConnection {
    sent_tx: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

impl Connection for MockConnection {
    fn send(&self, text: String) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed);
        }

        self.sent_tx
            .send(text)
            .map_err(|_| TransportError::ConnectionClosed)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Test-side half of one mock connection.
pub struct MockSocket {
    url: Url,
    handler: Arc<dyn TransportHandler>,
    sent_rx: mpsc::UnboundedReceiver<String>,
    closed: Arc<AtomicBool>,
}

impl fmt::Debug for MockSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSocket")
            .field("url", &self.url)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl MockSocket {
    /// URL the client connected to.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Whether the client closed this connection.
    #[must_use]
    pub fn is_closed_by_client(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Signals that the connection is open.
    pub fn open(&self) {
        self.handler.on_open();
    }

    /// Delivers a raw text frame.
    pub fn message(&self, text: impl Into<String>) {
        self.handler.on_message(text.into());
    }

    /// Delivers an encoded reply.
    ///
    /// # Panics
    ///
    /// Panics if the reply cannot be encoded.
    pub fn reply(&self, response: &Response) {
        let text = keyhub_wire::encode_response(response).expect("reply encodes");
        self.message(text);
    }

    /// Signals a transport error.
    pub fn error(&self, error: TransportError) {
        self.handler.on_error(error);
    }

    /// Signals that the connection ended.
    pub fn close(&self, event: CloseEvent) {
        self.handler.on_close(event);
    }

    /// Waits for the next frame the client sends.
    ///
    /// Returns `None` once the client side has been dropped.
    pub async fn next_sent(&mut self) -> Option<String> {
        self.sent_rx.recv().await
    }

    /// Returns the next frame if one is already waiting.
    pub fn try_next_sent(&mut self) -> Option<String> {
        self.sent_rx.try_recv().ok()
    }

    /// Waits for the next frame and decodes it as a request.
    ///
    /// # Errors
    ///
    /// Returns the codec error if the frame is not a valid request.
    ///
    /// # Panics
    ///
    /// Panics if the client side is gone.
    pub async fn next_request(&mut self) -> Result<(RequestId, Request), CodecError> {
        let text = self.next_sent().await.expect("client connection alive");
        keyhub_wire::decode_request(&text)
    }
}
